use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use sandbox_synth::universe::loader::DEFAULT_LOAD_TIMEOUT;
use sandbox_synth::universe::{
    InMemoryUniverseStore, Sector, SectorWeights, SqliteUniverseStore, StoredSymbol,
    UniverseLoader, UniverseOrigin, UniverseStore,
};
use sandbox_synth::{Result, SynthError};

struct SlowStore {
    delay: Duration,
}

impl UniverseStore for SlowStore {
    fn fetch_universe(&self, _universe_key: &str) -> Result<Vec<StoredSymbol>> {
        std::thread::sleep(self.delay);
        Ok(vec![StoredSymbol::bare("SLOW")])
    }
}

struct DownStore;

impl UniverseStore for DownStore {
    fn fetch_universe(&self, _universe_key: &str) -> Result<Vec<StoredSymbol>> {
        Err(SynthError::Store("connection refused".to_string()))
    }
}

fn loader_with(store: Arc<dyn UniverseStore>) -> UniverseLoader {
    UniverseLoader::new(Some(store), SectorWeights::default(), DEFAULT_LOAD_TIMEOUT)
}

fn temp_db(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "sandbox-synth-{}-{}.sqlite",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    path
}

fn assert_embedded_fallback(universe: &sandbox_synth::SymbolUniverse) {
    assert!(universe.is_fallback());
    assert_eq!(universe.len(), 29);
    assert_eq!(universe.get_sectors(), Sector::ALL.to_vec());
}

#[tokio::test]
/// Verifies fail-soft loading: a nonexistent key yields the 29-symbol
/// embedded universe spanning all 7 sectors.
async fn nonexistent_key_falls_back_to_embedded_universe() {
    let store = InMemoryUniverseStore::new().with_tickers("dev", &["AAPL", "MSFT"]);
    let universe = loader_with(Arc::new(store)).load("does_not_exist").await;
    assert_embedded_fallback(&universe);
}

#[tokio::test]
async fn unavailable_store_falls_back() {
    let universe = loader_with(Arc::new(DownStore)).load("us_large_cap").await;
    assert_embedded_fallback(&universe);
    match universe.origin() {
        UniverseOrigin::Embedded { reason } => assert!(reason.contains("connection refused")),
        other => panic!("unexpected origin {:?}", other),
    }
}

#[tokio::test]
async fn empty_store_result_falls_back() {
    let store = InMemoryUniverseStore::new().with_tickers("empty", &[]);
    let universe = loader_with(Arc::new(store)).load("empty").await;
    assert_embedded_fallback(&universe);
}

#[tokio::test]
async fn slow_store_times_out_and_falls_back() {
    let loader = UniverseLoader::new(
        Some(Arc::new(SlowStore {
            delay: Duration::from_millis(500),
        })),
        SectorWeights::default(),
        Duration::from_millis(50),
    );
    let universe = loader.load("any").await;
    assert_embedded_fallback(&universe);
}

#[test]
fn no_store_uses_embedded_universe() {
    let universe = tokio_test::block_on(UniverseLoader::embedded_only().load("anything"));
    assert_embedded_fallback(&universe);
    let tech = universe.get_symbols_by_sector(Sector::Technology);
    assert!(tech.iter().any(|s| s.ticker == "AAPL"));
    assert!(tech.iter().all(|s| s.sector == Sector::Technology));
}

#[tokio::test]
/// Verifies flat ticker lists get deterministic sector assignment
/// and baselines inside the sector's typical range.
async fn flat_ticker_list_gets_deterministic_sectors() {
    let tickers = ["ABC", "DEF", "GHI", "JKL", "MNO", "PQR", "STU", "VWX"];
    let store: Arc<dyn UniverseStore> =
        Arc::new(InMemoryUniverseStore::new().with_tickers("custom", &tickers));

    let first = loader_with(Arc::clone(&store)).load("custom").await;
    let second = loader_with(store).load("custom").await;

    assert!(!first.is_fallback());
    assert_eq!(first.len(), tickers.len());
    for t in tickers {
        let a = first.get_symbol_info(t).unwrap();
        let b = second.get_symbol_info(t).unwrap();
        assert_eq!(a, b);
        let (lo, hi) = a.sector.profile().typical_price_range;
        assert!(a.baseline_price >= lo && a.baseline_price <= hi);
        assert_eq!(a.volatility_factor, a.sector.profile().volatility_factor);
    }
}

#[tokio::test]
async fn single_sector_weights_put_every_ticker_there() {
    let weights = SectorWeights::new(vec![(Sector::Energy, 1.0)]).unwrap();
    let store = InMemoryUniverseStore::new().with_tickers("oil", &["AAA", "BBB", "CCC"]);
    let loader = UniverseLoader::new(Some(Arc::new(store)), weights, DEFAULT_LOAD_TIMEOUT);
    let universe = loader.load("oil").await;
    assert_eq!(universe.get_sectors(), vec![Sector::Energy]);
}

#[test]
fn sector_weights_not_summing_to_one_are_config_errors() {
    let err = SectorWeights::new(vec![
        (Sector::Technology, 0.6),
        (Sector::Healthcare, 0.6),
    ])
    .unwrap_err();
    assert!(err.is_config());
}

#[tokio::test]
/// Verifies the SQLite-backed store round trip: explicit sector/price are
/// kept, missing ones derived.
async fn sqlite_store_round_trip() {
    let path = temp_db("roundtrip");
    let store = SqliteUniverseStore::new(&path);
    store
        .seed_universe(
            "desk",
            &[
                StoredSymbol {
                    ticker: "aapl".to_string(),
                    sector: Some(Sector::Technology),
                    baseline_price: Some(190.5),
                },
                StoredSymbol::bare("ZZZ"),
                StoredSymbol {
                    ticker: "XOM".to_string(),
                    sector: Some(Sector::Energy),
                    baseline_price: None,
                },
            ],
        )
        .unwrap();

    let universe = loader_with(Arc::new(store)).load("desk").await;
    assert_eq!(
        universe.origin(),
        &UniverseOrigin::Store {
            key: "desk".to_string()
        }
    );
    assert_eq!(universe.len(), 3);
    let aapl = universe.get_symbol_info("AAPL").unwrap();
    assert_eq!(aapl.sector, Sector::Technology);
    assert_eq!(aapl.baseline_price, 190.5);
    assert_eq!(universe.get_symbol_info("XOM").unwrap().sector, Sector::Energy);
    assert!(universe.get_symbol_info("ZZZ").unwrap().baseline_price > 0.0);
    assert!(matches!(
        universe.get_symbol_info("MSFT"),
        Err(SynthError::UnknownSymbol(_))
    ));

    let other = loader_with(Arc::new(SqliteUniverseStore::new(&path)))
        .load("other_desk")
        .await;
    assert!(other.is_fallback());

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn missing_sqlite_file_falls_back() {
    let path = temp_db("missing");
    let universe = loader_with(Arc::new(SqliteUniverseStore::new(&path)))
        .load("desk")
        .await;
    assert_embedded_fallback(&universe);
}
