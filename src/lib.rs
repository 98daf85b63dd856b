pub mod config;
pub mod error;
pub mod generator;
pub mod market_clock;
pub mod model;
pub mod pattern_catalog;
pub mod provider;
pub mod scenario_catalog;
pub mod universe;

pub use error::{Result, SynthError};
pub use generator::{GeneratorConfig, GeneratorStatistics, TickGenerator};
pub use model::tick::{DataSource, TickData};
pub use pattern_catalog::{PatternCatalog, PatternDefinition};
pub use provider::{MarketDataProvider, ProviderFactory};
pub use scenario_catalog::{ScenarioCatalog, ScenarioParameters};
pub use universe::{SymbolInfo, SymbolUniverse, UniverseLoader};
