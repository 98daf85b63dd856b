use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::generator::GeneratorConfig;
use crate::market_clock::MarketClock;
use crate::universe::{
    normalize_ticker, Sector, SectorWeights, SqliteUniverseStore, UniverseLoader, UniverseStore,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub generator: GeneratorSection,
    #[serde(default)]
    pub universe: UniverseSection,
    #[serde(default)]
    pub clock: ClockSection,
    #[serde(default)]
    pub runner: RunnerSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub universe_key: String,
    pub scenario_name: String,
    #[serde(default = "default_true")]
    pub pattern_injection_enabled: bool,
    #[serde(default = "default_pattern_frequency")]
    pub pattern_frequency: f64,
    #[serde(default)]
    pub pattern_allowlist: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_base_tick_move")]
    pub base_tick_move: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UniverseSection {
    #[serde(default)]
    pub store_path: Option<PathBuf>,
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
    /// Sector label -> proportion; empty means the built-in split.
    #[serde(default)]
    pub sector_weights: BTreeMap<String, f64>,
}

impl Default for UniverseSection {
    fn default() -> Self {
        Self {
            store_path: None,
            load_timeout_ms: default_load_timeout_ms(),
            sector_weights: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Wall,
    Simulated,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClockSection {
    #[serde(default)]
    pub mode: ClockMode,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub step_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerSection {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Tickers to drive; empty means the whole universe.
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Stop after this many steps; 0 runs until Ctrl+C.
    #[serde(default)]
    pub max_steps: u64,
    #[serde(default)]
    pub candle_interval: Option<String>,
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            symbols: Vec::new(),
            max_steps: 0,
            candle_interval: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

fn default_true() -> bool {
    true
}

fn default_pattern_frequency() -> f64 {
    0.1
}

fn default_base_tick_move() -> f64 {
    0.001
}

fn default_load_timeout_ms() -> u64 {
    2_000
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

/// Parse an interval string (e.g. "1s", "1m", "1h", "1d", "1w", "1M") into milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<u64> {
    let Some((split, _)) = s.char_indices().last().filter(|(i, _)| *i > 0) else {
        bail!("invalid interval '{}': expected format like '1m'", s);
    };

    let (num_str, suffix) = s.split_at(split);
    let n: u64 = num_str.parse().with_context(|| {
        format!(
            "invalid interval '{}': quantity must be a positive integer",
            s
        )
    })?;
    if n == 0 {
        bail!("invalid interval '{}': quantity must be > 0", s);
    }

    let unit_ms = match suffix {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 7 * 86_400_000,
        "M" => 30 * 86_400_000,
        _ => bail!(
            "invalid interval '{}': unsupported suffix '{}', expected one of s/m/h/d/w/M",
            s,
            suffix
        ),
    };

    n.checked_mul(unit_ms)
        .with_context(|| format!("invalid interval '{}': value is too large", s))
}

impl RunnerSection {
    pub fn candle_interval_ms(&self) -> Result<Option<u64>> {
        self.candle_interval
            .as_deref()
            .map(parse_interval_ms)
            .transpose()
    }

    pub fn normalized_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in &self.symbols {
            let s = normalize_ticker(sym);
            if !s.is_empty() && !out.iter().any(|v| v == &s) {
                out.push(s);
            }
        }
        out
    }
}

impl UniverseSection {
    pub fn sector_weights(&self) -> Result<SectorWeights> {
        if self.sector_weights.is_empty() {
            return Ok(SectorWeights::default());
        }
        let mut weights = Vec::with_capacity(self.sector_weights.len());
        for (label, w) in &self.sector_weights {
            let sector: Sector = label
                .parse()
                .with_context(|| format!("universe.sector_weights has unknown sector '{}'", label))?;
            weights.push((sector, *w));
        }
        // Keep the canonical sector order regardless of TOML key order.
        weights.sort_by_key(|(sector, _)| *sector);
        SectorWeights::new(weights).context("universe.sector_weights is invalid")
    }

    pub fn loader(&self) -> Result<UniverseLoader> {
        let weights = self.sector_weights()?;
        let store = self
            .store_path
            .as_ref()
            .map(|p| Arc::new(SqliteUniverseStore::new(p)) as Arc<dyn UniverseStore>);
        Ok(UniverseLoader::new(
            store,
            weights,
            Duration::from_millis(self.load_timeout_ms),
        ))
    }
}

impl ClockSection {
    pub fn market_clock(&self) -> Result<MarketClock> {
        match self.mode {
            ClockMode::Wall => Ok(MarketClock::Wall),
            ClockMode::Simulated => {
                let start = self
                    .start
                    .context("clock.start is required when clock.mode = \"simulated\"")?;
                let step_ms = self.step_ms.unwrap_or(1_000);
                if step_ms == 0 {
                    bail!("clock.step_ms must be > 0");
                }
                let step_ms = i64::try_from(step_ms).context("clock.step_ms is too large")?;
                Ok(MarketClock::Simulated {
                    start,
                    step: chrono::Duration::milliseconds(step_ms),
                })
            }
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config/default.toml"))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_str = std::fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(scenario) = std::env::var("SYNTH_SCENARIO") {
            self.generator.scenario_name = scenario;
        }
        if let Ok(key) = std::env::var("SYNTH_UNIVERSE_KEY") {
            self.generator.universe_key = key;
        }
        if let Ok(seed) = std::env::var("SYNTH_SEED") {
            let seed = seed
                .trim()
                .parse()
                .with_context(|| format!("SYNTH_SEED must be an unsigned integer, got '{}'", seed))?;
            self.generator.seed = Some(seed);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.generator.pattern_frequency) {
            bail!(
                "generator.pattern_frequency must be within [0, 1], got {}",
                self.generator.pattern_frequency
            );
        }
        if self.runner.tick_interval_ms == 0 {
            bail!("runner.tick_interval_ms must be > 0");
        }
        if self.universe.load_timeout_ms == 0 {
            bail!("universe.load_timeout_ms must be > 0");
        }
        self.universe.sector_weights()?;
        self.clock.market_clock()?;
        self.runner
            .candle_interval_ms()
            .context("runner.candle_interval is invalid")?;
        Ok(())
    }

    pub fn generator_config(&self) -> Result<GeneratorConfig> {
        Ok(GeneratorConfig {
            scenario_name: self.generator.scenario_name.clone(),
            pattern_injection_enabled: self.generator.pattern_injection_enabled,
            pattern_frequency: self.generator.pattern_frequency,
            pattern_allowlist: self.generator.pattern_allowlist.clone(),
            seed: self.generator.seed,
            base_tick_move: self.generator.base_tick_move,
            clock: self.clock.market_clock()?,
        })
    }
}
