use std::sync::Arc;

use crate::error::{Result, SynthError};
use crate::generator::{GeneratorConfig, GeneratorStatistics, TickGenerator};
use crate::model::tick::{DataSource, TickData};
use crate::pattern_catalog::PatternCatalog;
use crate::scenario_catalog::ScenarioCatalog;
use crate::universe::SymbolUniverse;

/// Anything that can hand out the next tick for a ticker.
pub trait MarketDataProvider: Send {
    fn name(&self) -> &str;
    fn source(&self) -> DataSource;
    fn next_tick(&mut self, ticker: &str) -> Result<TickData>;

    fn statistics(&self) -> Option<GeneratorStatistics> {
        None
    }
}

impl MarketDataProvider for TickGenerator {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn source(&self) -> DataSource {
        DataSource::Simulated
    }

    fn next_tick(&mut self, ticker: &str) -> Result<TickData> {
        self.generate_tick(ticker)
    }

    fn statistics(&self) -> Option<GeneratorStatistics> {
        Some(self.get_statistics())
    }
}

pub type VendorConstructor = Arc<dyn Fn() -> Result<Box<dyn MarketDataProvider>> + Send + Sync>;

/// Selects the synthetic engine or a host-supplied vendor adapter on a
/// single flag.
#[derive(Clone)]
pub struct ProviderFactory {
    universe: Arc<SymbolUniverse>,
    patterns: Arc<PatternCatalog>,
    scenarios: Arc<ScenarioCatalog>,
    vendor: Option<VendorConstructor>,
}

impl ProviderFactory {
    pub fn new(
        universe: Arc<SymbolUniverse>,
        patterns: Arc<PatternCatalog>,
        scenarios: Arc<ScenarioCatalog>,
    ) -> Self {
        Self {
            universe,
            patterns,
            scenarios,
            vendor: None,
        }
    }

    pub fn with_vendor(mut self, vendor: VendorConstructor) -> Self {
        self.vendor = Some(vendor);
        self
    }

    pub fn get_provider(
        &self,
        synthetic_enabled: bool,
        config: &GeneratorConfig,
    ) -> Result<Box<dyn MarketDataProvider>> {
        if synthetic_enabled {
            let generator = TickGenerator::new(
                Arc::clone(&self.universe),
                Arc::clone(&self.patterns),
                &self.scenarios,
                config.clone(),
            )?;
            return Ok(Box::new(generator));
        }
        match &self.vendor {
            Some(build) => build(),
            None => Err(SynthError::config(
                "synthetic data is disabled and no vendor provider is registered",
            )),
        }
    }
}
