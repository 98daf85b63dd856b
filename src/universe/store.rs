use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OpenFlags};

use super::{normalize_ticker, Sector};
use crate::error::{Result, SynthError};

/// A symbol row as held by an external universe store. Missing fields are
/// derived by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSymbol {
    pub ticker: String,
    pub sector: Option<Sector>,
    pub baseline_price: Option<f64>,
}

impl StoredSymbol {
    pub fn bare(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            sector: None,
            baseline_price: None,
        }
    }
}

/// Read-only source of symbol universes keyed by name.
pub trait UniverseStore: Send + Sync {
    fn fetch_universe(&self, universe_key: &str) -> Result<Vec<StoredSymbol>>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryUniverseStore {
    universes: HashMap<String, Vec<StoredSymbol>>,
}

impl InMemoryUniverseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tickers(mut self, universe_key: &str, tickers: &[&str]) -> Self {
        self.universes.insert(
            universe_key.to_string(),
            tickers.iter().map(|t| StoredSymbol::bare(t)).collect(),
        );
        self
    }

    pub fn with_symbols(mut self, universe_key: &str, symbols: Vec<StoredSymbol>) -> Self {
        self.universes.insert(universe_key.to_string(), symbols);
        self
    }
}

impl UniverseStore for InMemoryUniverseStore {
    fn fetch_universe(&self, universe_key: &str) -> Result<Vec<StoredSymbol>> {
        self.universes
            .get(universe_key)
            .cloned()
            .ok_or_else(|| SynthError::Store(format!("unknown universe '{}'", universe_key)))
    }
}

/// Universe store backed by a SQLite file with a `universe_symbols` table.
#[derive(Debug, Clone)]
pub struct SqliteUniverseStore {
    path: PathBuf,
}

impl SqliteUniverseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the table if needed and replace `universe_key` with `symbols`.
    pub fn seed_universe(&self, universe_key: &str, symbols: &[StoredSymbol]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut conn = Connection::open(&self.path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS universe_symbols (
                universe_key TEXT NOT NULL,
                ticker TEXT NOT NULL,
                sector TEXT,
                baseline_price REAL,
                PRIMARY KEY(universe_key, ticker)
            );
            "#,
        )?;

        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM universe_symbols WHERE universe_key = ?1",
            params![universe_key],
        )?;
        for s in symbols {
            tx.execute(
                r#"
                INSERT INTO universe_symbols (universe_key, ticker, sector, baseline_price)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(universe_key, ticker) DO UPDATE SET
                    sector = excluded.sector,
                    baseline_price = excluded.baseline_price
                "#,
                params![
                    universe_key,
                    normalize_ticker(&s.ticker),
                    s.sector.map(|sec| sec.label()),
                    s.baseline_price,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

impl UniverseStore for SqliteUniverseStore {
    fn fetch_universe(&self, universe_key: &str) -> Result<Vec<StoredSymbol>> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        let mut stmt = conn.prepare(
            r#"
            SELECT ticker, sector, baseline_price
            FROM universe_symbols
            WHERE universe_key = ?1
            ORDER BY ticker ASC
            "#,
        )?;
        let rows = stmt.query_map(params![universe_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;

        let mut out = Vec::new();
        for row in rows {
            let (ticker, sector, baseline_price) = row?;
            let sector = match sector {
                Some(label) => match label.parse::<Sector>() {
                    Ok(sector) => Some(sector),
                    Err(_) => {
                        tracing::warn!(%ticker, sector = %label, "Ignoring unknown sector in universe store");
                        None
                    }
                },
                None => None,
            };
            out.push(StoredSymbol {
                ticker,
                sector,
                baseline_price,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_reports_unknown_key() {
        let store = InMemoryUniverseStore::new().with_tickers("dev", &["AAPL", "XYZ"]);
        assert_eq!(store.fetch_universe("dev").unwrap().len(), 2);
        assert!(matches!(
            store.fetch_universe("prod"),
            Err(SynthError::Store(_))
        ));
    }

    #[test]
    fn sqlite_missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "sandbox-synth-missing-{}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let store = SqliteUniverseStore::new(&path);
        assert!(store.fetch_universe("any").is_err());
    }
}
