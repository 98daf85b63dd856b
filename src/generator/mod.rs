pub mod state;
pub mod stats;

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use crate::error::{Result, SynthError};
use crate::market_clock::{time_multiplier, MarketClock, TimeMultiplier};
use crate::model::candle::Ohlc;
use crate::model::tick::{DataSource, TickData};
use crate::pattern_catalog::{PatternCatalog, PatternDefinition};
use crate::scenario_catalog::{ScenarioCatalog, ScenarioParameters};
use crate::universe::{SymbolInfo, SymbolUniverse};

pub use state::GeneratorState;
pub use stats::GeneratorStatistics;
use stats::StatsAccumulator;

/// Prices never fall below this.
pub const MIN_PRICE: f64 = 0.01;
/// Upper bound on per-tick effective volatility; keeps shadows above zero.
pub const MAX_TICK_VOLATILITY: f64 = 0.25;
/// Random steps are clipped to this many standard deviations.
const STEP_CLAMP_SIGMA: f64 = 3.0;
/// Drift per tick is `trend_bias * TREND_DRIFT_SCALE * volatility`.
const TREND_DRIFT_SCALE: f64 = 0.25;
const VOLUME_VARIANCE: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub scenario_name: String,
    pub pattern_injection_enabled: bool,
    pub pattern_frequency: f64,
    /// Empty means every catalog pattern.
    pub pattern_allowlist: Vec<String>,
    pub seed: Option<u64>,
    /// Baseline per-tick move as a fraction of price, before multipliers.
    pub base_tick_move: f64,
    pub clock: MarketClock,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            scenario_name: "normal".to_string(),
            pattern_injection_enabled: true,
            pattern_frequency: 0.1,
            pattern_allowlist: Vec::new(),
            seed: None,
            base_tick_move: 0.001,
            clock: MarketClock::Wall,
        }
    }
}

/// Stateful per-ticker synthetic tick generator.
///
/// `generate_tick` touches only the called ticker's state, so a generator can
/// be sharded by ticker across workers with one owner per ticker.
#[derive(Debug)]
pub struct TickGenerator {
    universe: Arc<SymbolUniverse>,
    patterns: Arc<PatternCatalog>,
    scenario: ScenarioParameters,
    allowlist: Vec<PatternDefinition>,
    config: GeneratorConfig,
    states: HashMap<String, GeneratorState>,
    stats: StatsAccumulator,
}

impl TickGenerator {
    /// Fails with a configuration error for an unknown scenario or pattern
    /// name, or an out-of-range frequency or base move.
    pub fn new(
        universe: Arc<SymbolUniverse>,
        patterns: Arc<PatternCatalog>,
        scenarios: &ScenarioCatalog,
        config: GeneratorConfig,
    ) -> Result<Self> {
        let scenario = scenarios.get(&config.scenario_name)?.clone();

        if !(0.0..=1.0).contains(&config.pattern_frequency) {
            return Err(SynthError::config(format!(
                "pattern_frequency must be within [0, 1], got {}",
                config.pattern_frequency
            )));
        }
        if !(config.base_tick_move > 0.0 && config.base_tick_move <= MAX_TICK_VOLATILITY) {
            return Err(SynthError::config(format!(
                "base_tick_move must be within (0, {}], got {}",
                MAX_TICK_VOLATILITY, config.base_tick_move
            )));
        }

        let allowlist: Vec<PatternDefinition> = patterns
            .resolve_allowlist(config.pattern_allowlist.as_slice())?
            .into_iter()
            .cloned()
            .collect();
        if config.pattern_injection_enabled && config.pattern_frequency > 0.0 && allowlist.is_empty()
        {
            return Err(SynthError::config(
                "pattern injection is enabled but no patterns are available",
            ));
        }

        tracing::info!(
            scenario = %scenario.name,
            universe_size = universe.len(),
            injection = config.pattern_injection_enabled,
            frequency = config.pattern_frequency,
            patterns = allowlist.len(),
            seeded = config.seed.is_some(),
            "Tick generator ready"
        );

        Ok(Self {
            universe,
            patterns,
            scenario,
            allowlist,
            config,
            states: HashMap::new(),
            stats: StatsAccumulator::default(),
        })
    }

    pub fn scenario(&self) -> &ScenarioParameters {
        &self.scenario
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn universe(&self) -> &SymbolUniverse {
        &self.universe
    }

    pub fn last_price(&self, ticker: &str) -> Option<f64> {
        let info = self.universe.get_symbol_info(ticker).ok()?;
        self.states.get(&info.ticker).map(|s| s.last_price)
    }

    pub fn state(&self, ticker: &str) -> Option<&GeneratorState> {
        let info = self.universe.get_symbol_info(ticker).ok()?;
        self.states.get(&info.ticker)
    }

    /// Produce the next tick for `ticker`. The only failure is an unknown
    /// ticker.
    pub fn generate_tick(&mut self, ticker: &str) -> Result<TickData> {
        let universe = Arc::clone(&self.universe);
        let info = universe.get_symbol_info(ticker)?;
        let profile = info.sector.profile();
        let seed = self.config.seed;

        let state = state_entry(&mut self.states, info, seed);

        let timestamp = self.config.clock.timestamp_for(state.tick_count);
        let tm = time_multiplier(timestamp);
        let vol = effective_volatility(
            self.config.base_tick_move,
            &self.scenario,
            info.volatility_factor,
            tm,
        );
        let base = next_base_price(state.last_price, vol, self.scenario.trend_bias, &mut state.rng);

        let chosen = match state.pending_pattern.take() {
            Some(forced) => Some(forced),
            None => draw_pattern(&self.config, &self.allowlist, &mut state.rng).cloned(),
        };

        let (ohlc, pattern_name) = match chosen {
            Some(def) => {
                tracing::debug!(ticker = %info.ticker, pattern = %def.name, base, "Injected pattern");
                (def.apply(base), Some(def.name))
            }
            None => (default_shape(base, vol, &mut state.rng), None),
        };

        let variance = state.rng.gen_range((1.0 - VOLUME_VARIANCE)..=(1.0 + VOLUME_VARIANCE));
        let volume = ((profile.base_volume as f64
            * self.scenario.volume_multiplier
            * tm.volume
            * variance) as u64)
            .max(1);

        let (bid, ask) = quote_around(ohlc.close, self.scenario.spread_pct);

        state.last_price = ohlc.close;
        state.tick_count += 1;
        if pattern_name.is_some() {
            state.patterns_injected += 1;
        }
        self.stats.record(pattern_name.as_deref());

        Ok(TickData {
            ticker: info.ticker.clone(),
            timestamp,
            open: ohlc.open,
            high: ohlc.high,
            low: ohlc.low,
            close: ohlc.close,
            bid,
            ask,
            volume,
            pattern_injected: pattern_name,
            source: DataSource::Simulated,
        })
    }

    /// Generate `count` consecutive ticks for one ticker.
    pub fn generate_series(&mut self, ticker: &str, count: usize) -> Result<Vec<TickData>> {
        (0..count).map(|_| self.generate_tick(ticker)).collect()
    }

    /// Shape the ticker's next tick with the named pattern regardless of the
    /// injection frequency or allow-list.
    pub fn force_pattern(&mut self, ticker: &str, pattern: &str) -> Result<()> {
        let info = self.universe.get_symbol_info(ticker)?;
        let def = self.patterns.get(pattern)?.clone();
        let seed = self.config.seed;
        let state = state_entry(&mut self.states, info, seed);
        state.pending_pattern = Some(def);
        Ok(())
    }

    pub fn get_statistics(&self) -> GeneratorStatistics {
        self.stats.snapshot(
            &self.scenario.name,
            self.universe.len(),
            self.universe.is_fallback(),
            self.states.len(),
        )
    }
}

fn state_entry<'a>(
    states: &'a mut HashMap<String, GeneratorState>,
    info: &SymbolInfo,
    seed: Option<u64>,
) -> &'a mut GeneratorState {
    states.entry(info.ticker.clone()).or_insert_with(|| {
        tracing::debug!(ticker = %info.ticker, baseline = info.baseline_price, "Creating generator state");
        GeneratorState::new(info, seed)
    })
}

pub fn effective_volatility(
    base_tick_move: f64,
    scenario: &ScenarioParameters,
    sector_volatility: f64,
    tm: TimeMultiplier,
) -> f64 {
    (base_tick_move * scenario.volatility_multiplier * sector_volatility * tm.volatility)
        .clamp(0.0, MAX_TICK_VOLATILITY)
}

/// Geometric step from `prev`: log-return mean `trend_bias * TREND_DRIFT_SCALE * vol`,
/// spread `vol`, shock clipped to +/- `STEP_CLAMP_SIGMA`.
pub fn next_base_price(prev: f64, vol: f64, trend_bias: f64, rng: &mut ChaCha8Rng) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    let shock = z.clamp(-STEP_CLAMP_SIGMA, STEP_CLAMP_SIGMA);
    let log_return = trend_bias * TREND_DRIFT_SCALE * vol + vol * shock;
    (prev.max(MIN_PRICE) * log_return.exp()).max(MIN_PRICE)
}

fn draw_pattern<'a>(
    config: &GeneratorConfig,
    allowlist: &'a [PatternDefinition],
    rng: &mut ChaCha8Rng,
) -> Option<&'a PatternDefinition> {
    if !config.pattern_injection_enabled || config.pattern_frequency <= 0.0 || allowlist.is_empty()
    {
        return None;
    }
    if !rng.gen_bool(config.pattern_frequency) {
        return None;
    }
    allowlist.get(rng.gen_range(0..allowlist.len()))
}

/// Unpatterned candle: open/close within half a volatility unit of `base`,
/// shadows up to one unit beyond the body.
fn default_shape(base: f64, vol: f64, rng: &mut ChaCha8Rng) -> Ohlc {
    let open = base * (1.0 + 0.5 * vol * rng.gen_range(-1.0..=1.0));
    let close = base * (1.0 + 0.5 * vol * rng.gen_range(-1.0..=1.0));
    let high = open.max(close) * (1.0 + vol * rng.gen_range(0.0..=1.0));
    let low = open.min(close) * (1.0 - vol * rng.gen_range(0.0..=1.0));
    Ohlc {
        open,
        high,
        low,
        close,
    }
}

/// Symmetric bid/ask around `close`; a positive `spread_pct` keeps bid < ask.
pub fn quote_around(close: f64, spread_pct: f64) -> (f64, f64) {
    let spread = close * spread_pct / 100.0;
    (close - spread / 2.0, close + spread / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn effective_volatility_compounds_multipliers() {
        let crash = ScenarioParameters::new("crash", 5.0, 4.0, -0.8, 0.5);
        let tm = TimeMultiplier {
            volume: 3.0,
            volatility: 2.0,
        };
        let v = effective_volatility(0.001, &crash, 1.3, tm);
        assert!((v - 0.013).abs() < 1e-12);
        assert_eq!(effective_volatility(0.2, &crash, 1.3, tm), MAX_TICK_VOLATILITY);
    }

    #[test]
    fn next_price_stays_above_floor() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut p = 0.02;
        for _ in 0..1_000 {
            p = next_base_price(p, MAX_TICK_VOLATILITY, -1.0, &mut rng);
            assert!(p >= MIN_PRICE);
        }
    }

    #[test]
    fn default_shape_is_valid() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1_000 {
            let ohlc = default_shape(50.0, MAX_TICK_VOLATILITY, &mut rng);
            assert!(ohlc.is_valid());
            assert!(ohlc.low > 0.0);
        }
    }

    #[test]
    fn quote_is_ordered() {
        let (bid, ask) = quote_around(100.0, 0.1);
        assert!((bid - 99.95).abs() < 1e-9);
        assert!((ask - 100.05).abs() < 1e-9);
    }

    #[test]
    fn draw_respects_disabled_injection() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let catalog = PatternCatalog::builtin().unwrap();
        let all: Vec<PatternDefinition> = catalog
            .resolve_allowlist::<&str>(&[])
            .unwrap()
            .into_iter()
            .cloned()
            .collect();
        let config = GeneratorConfig {
            pattern_injection_enabled: false,
            pattern_frequency: 1.0,
            ..GeneratorConfig::default()
        };
        assert!(draw_pattern(&config, &all, &mut rng).is_none());
        let always = GeneratorConfig {
            pattern_frequency: 1.0,
            ..GeneratorConfig::default()
        };
        assert!(draw_pattern(&always, &all, &mut rng).is_some());
    }

    #[derive(Clone, Default)]
    struct StateCreations(Arc<std::sync::atomic::AtomicUsize>);

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for StateCreations {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            if visitor.0 == "Creating generator state" {
                self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn forced_and_generated_state_are_created_once_each() {
        use tracing_subscriber::layer::SubscriberExt;

        let creations = StateCreations::default();
        let subscriber = tracing_subscriber::registry().with(creations.clone());
        let mut generator = TickGenerator::new(
            Arc::new(crate::universe::embedded::embedded_universe("test")),
            Arc::new(PatternCatalog::builtin().unwrap()),
            &ScenarioCatalog::builtin(),
            GeneratorConfig {
                seed: Some(9),
                ..GeneratorConfig::default()
            },
        )
        .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            generator.force_pattern("AAPL", "Hammer").unwrap();
            generator.generate_tick("AAPL").unwrap();
            generator.generate_tick("MSFT").unwrap();
            generator.generate_tick("MSFT").unwrap();
        });

        assert_eq!(creations.0.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(generator.get_statistics().active_tickers, 2);
        assert_eq!(generator.state("AAPL").unwrap().patterns_injected, 1);
    }
}
