use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::pattern_catalog::PatternDefinition;
use crate::universe::{stable_hash, SymbolInfo};

/// Per-ticker mutable generation state. Each ticker owns its RNG so symbols
/// evolve independently of one another and of call interleaving.
#[derive(Debug, Clone)]
pub struct GeneratorState {
    pub last_price: f64,
    pub tick_count: u64,
    pub patterns_injected: u64,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) pending_pattern: Option<PatternDefinition>,
}

impl GeneratorState {
    pub fn new(info: &SymbolInfo, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed ^ stable_hash(&info.ticker)),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            last_price: info.baseline_price,
            tick_count: 0,
            patterns_injected: 0,
            rng,
            pending_pattern: None,
        }
    }
}
