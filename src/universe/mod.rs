pub mod embedded;
pub mod loader;
pub mod sector;
pub mod store;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{Result, SynthError};

pub use loader::UniverseLoader;
pub use sector::{Sector, SectorProfile, SectorWeights};
pub use store::{InMemoryUniverseStore, SqliteUniverseStore, StoredSymbol, UniverseStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub ticker: String,
    pub sector: Sector,
    pub volatility_factor: f64,
    pub baseline_price: f64,
    pub baseline_price_range: (f64, f64),
}

impl SymbolInfo {
    pub fn new(ticker: &str, sector: Sector, baseline_price: f64) -> Self {
        let profile = sector.profile();
        Self {
            ticker: normalize_ticker(ticker),
            sector,
            volatility_factor: profile.volatility_factor,
            baseline_price,
            baseline_price_range: profile.typical_price_range,
        }
    }
}

/// Where a loaded universe came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum UniverseOrigin {
    Store { key: String },
    Embedded { reason: String },
}

/// Read-only ticker -> symbol catalog.
#[derive(Debug, Clone)]
pub struct SymbolUniverse {
    symbols: BTreeMap<String, SymbolInfo>,
    origin: UniverseOrigin,
}

impl SymbolUniverse {
    pub fn new(symbols: Vec<SymbolInfo>, origin: UniverseOrigin) -> Self {
        let symbols = symbols
            .into_iter()
            .map(|info| (info.ticker.clone(), info))
            .collect();
        Self { symbols, origin }
    }

    pub fn get_symbol_info(&self, ticker: &str) -> Result<&SymbolInfo> {
        let key = normalize_ticker(ticker);
        self.symbols
            .get(&key)
            .ok_or_else(|| SynthError::UnknownSymbol(ticker.to_string()))
    }

    pub fn get_symbols_by_sector(&self, sector: Sector) -> Vec<&SymbolInfo> {
        self.symbols.values().filter(|s| s.sector == sector).collect()
    }

    pub fn get_sectors(&self) -> Vec<Sector> {
        self.symbols
            .values()
            .map(|s| s.sector)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn tickers(&self) -> Vec<String> {
        self.symbols.keys().cloned().collect()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.symbols.contains_key(&normalize_ticker(ticker))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn origin(&self) -> &UniverseOrigin {
        &self.origin
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, UniverseOrigin::Embedded { .. })
    }
}

pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_ascii_uppercase()
}

/// 64-bit FNV-1a. Stable across runs and platforms, unlike `DefaultHasher`.
pub fn stable_hash(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |h, b| (h ^ b as u64).wrapping_mul(PRIME))
}

/// Map a hash to [0, 1) using its top 53 bits.
pub(crate) fn unit_interval(h: u64) -> f64 {
    (h >> 11) as f64 / (1u64 << 53) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_and_whitespace_insensitive() {
        let universe = SymbolUniverse::new(
            vec![SymbolInfo::new("aapl", Sector::Technology, 185.0)],
            UniverseOrigin::Store {
                key: "t".to_string(),
            },
        );
        assert_eq!(universe.get_symbol_info(" AAPL ").unwrap().ticker, "AAPL");
        assert!(universe.contains("aapl"));
        assert!(!universe.is_fallback());
    }

    #[test]
    fn unknown_symbol_is_reported() {
        let universe = SymbolUniverse::new(vec![], UniverseOrigin::Store { key: "t".into() });
        match universe.get_symbol_info("ZZZZ") {
            Err(SynthError::UnknownSymbol(t)) => assert_eq!(t, "ZZZZ"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn stable_hash_is_fixed() {
        assert_eq!(stable_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(stable_hash("AAPL"), stable_hash("AAPL"));
        assert_ne!(stable_hash("AAPL"), stable_hash("MSFT"));
        let u = unit_interval(u64::MAX);
        assert!((0.0..1.0).contains(&u));
    }
}
