use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::embedded::embedded_universe;
use super::{
    normalize_ticker, stable_hash, unit_interval, Sector, SectorWeights, StoredSymbol,
    SymbolInfo, SymbolUniverse, UniverseOrigin, UniverseStore,
};

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Builds a [`SymbolUniverse`] from an external store, degrading to the
/// embedded universe whenever the store cannot deliver.
#[derive(Clone)]
pub struct UniverseLoader {
    store: Option<Arc<dyn UniverseStore>>,
    weights: SectorWeights,
    timeout: Duration,
}

impl std::fmt::Debug for UniverseLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UniverseLoader")
            .field("has_store", &self.store.is_some())
            .field("weights", &self.weights)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl UniverseLoader {
    pub fn new(
        store: Option<Arc<dyn UniverseStore>>,
        weights: SectorWeights,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            weights,
            timeout,
        }
    }

    /// Loader with no store: every load yields the embedded universe.
    pub fn embedded_only() -> Self {
        Self::new(None, SectorWeights::default(), DEFAULT_LOAD_TIMEOUT)
    }

    pub fn weights(&self) -> &SectorWeights {
        &self.weights
    }

    /// Resolve `universe_key` against the store. Never fails: store errors,
    /// timeouts and empty results all fall back to the embedded universe.
    pub async fn load(&self, universe_key: &str) -> SymbolUniverse {
        let Some(store) = self.store.clone() else {
            tracing::info!(universe_key, "No universe store configured, using embedded universe");
            return embedded_universe("no universe store configured");
        };

        let key = universe_key.to_string();
        let query = tokio::task::spawn_blocking(move || store.fetch_universe(&key));

        let records = match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(Ok(records))) => records,
            Ok(Ok(Err(e))) => {
                return self.degrade(universe_key, format!("store error: {}", e));
            }
            Ok(Err(e)) => {
                return self.degrade(universe_key, format!("store task failed: {}", e));
            }
            Err(_) => {
                return self.degrade(
                    universe_key,
                    format!("store timed out after {} ms", self.timeout.as_millis()),
                );
            }
        };

        match self.build_universe(universe_key, records) {
            Some(universe) => {
                tracing::info!(
                    universe_key,
                    symbols = universe.len(),
                    sectors = universe.get_sectors().len(),
                    "Loaded symbol universe"
                );
                universe
            }
            None => self.degrade(universe_key, "store returned no usable symbols".to_string()),
        }
    }

    /// Turn raw store rows into a universe, deriving any missing sector or
    /// baseline price. Returns `None` when nothing usable remains.
    pub fn build_universe(
        &self,
        universe_key: &str,
        records: Vec<StoredSymbol>,
    ) -> Option<SymbolUniverse> {
        let mut seen = HashSet::new();
        let mut symbols = Vec::with_capacity(records.len());

        for record in records {
            let ticker = normalize_ticker(&record.ticker);
            if ticker.is_empty() || !seen.insert(ticker.clone()) {
                continue;
            }
            let sector = record
                .sector
                .unwrap_or_else(|| self.assign_sector(&ticker));
            let baseline_price = record
                .baseline_price
                .filter(|p| p.is_finite() && *p > 0.0)
                .unwrap_or_else(|| derive_baseline_price(&ticker, sector));
            symbols.push(SymbolInfo::new(&ticker, sector, baseline_price));
        }

        if symbols.is_empty() {
            return None;
        }
        Some(SymbolUniverse::new(
            symbols,
            UniverseOrigin::Store {
                key: universe_key.to_string(),
            },
        ))
    }

    /// Deterministic sector for a ticker, drawn from the configured weights.
    pub fn assign_sector(&self, ticker: &str) -> Sector {
        let u = unit_interval(stable_hash(&normalize_ticker(ticker)));
        self.weights.pick(u)
    }

    fn degrade(&self, universe_key: &str, reason: String) -> SymbolUniverse {
        tracing::warn!(universe_key, %reason, "Universe load degraded, using embedded universe");
        embedded_universe(reason)
    }
}

/// Deterministic baseline inside the sector's typical price range.
pub fn derive_baseline_price(ticker: &str, sector: Sector) -> f64 {
    let (lo, hi) = sector.profile().typical_price_range;
    // Salted so the price draw is independent of the sector draw.
    let u = unit_interval(stable_hash(&format!("price:{}", normalize_ticker(ticker))));
    let price = lo + (hi - lo) * u;
    (price * 100.0).round() / 100.0
}
