use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;

use sandbox_synth::config::Config;
use sandbox_synth::model::candle::CandleBuilder;
use sandbox_synth::pattern_catalog::PatternCatalog;
use sandbox_synth::provider::ProviderFactory;
use sandbox_synth::scenario_catalog::ScenarioCatalog;
use sandbox_synth::SynthError;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/default.toml"));

    let config = match Config::load_from(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    };

    // stdout carries the tick stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.logging.level.as_str())
            }),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .json()
        .init();

    tracing::info!(
        config = %config_path.display(),
        universe_key = %config.generator.universe_key,
        scenario = %config.generator.scenario_name,
        synthetic = config.generator.enabled,
        "Starting sandbox-synth"
    );

    // Catalogs and scenario selection fail fast; the universe never does.
    let patterns = Arc::new(PatternCatalog::builtin().context("builtin pattern catalog is invalid")?);
    let scenarios = Arc::new(ScenarioCatalog::builtin());
    let loader = config.universe.loader()?;
    let universe = Arc::new(loader.load(&config.generator.universe_key).await);
    if universe.is_fallback() {
        tracing::warn!(
            symbols = universe.len(),
            origin = ?universe.origin(),
            "Running on embedded fallback universe"
        );
    }

    let generator_config = config.generator_config()?;
    let factory = ProviderFactory::new(Arc::clone(&universe), patterns, scenarios);
    let mut provider = factory
        .get_provider(config.generator.enabled, &generator_config)
        .context("failed to build market data provider")?;

    let mut symbols = config.runner.normalized_symbols();
    if symbols.is_empty() {
        symbols = universe.tickers();
    }
    let candle_interval_ms = config
        .runner
        .candle_interval_ms()?
        .map(|ms| i64::try_from(ms).unwrap_or(i64::MAX));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Ctrl+C received");
        let _ = shutdown_tx.send(true);
    });

    let mut interval = tokio::time::interval(Duration::from_millis(config.runner.tick_interval_ms));
    let mut candles: HashMap<String, CandleBuilder> = HashMap::new();
    let mut skipped: Vec<String> = Vec::new();
    let mut step: u64 = 0;
    let stdout = std::io::stdout();

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                tracing::info!("Generation loop shutting down");
                break;
            }
            _ = interval.tick() => {
                let mut out = stdout.lock();
                for ticker in &symbols {
                    if skipped.contains(ticker) {
                        continue;
                    }
                    let tick = match provider.next_tick(ticker) {
                        Ok(t) => t,
                        Err(SynthError::UnknownSymbol(t)) => {
                            tracing::warn!(ticker = %t, "Ticker not in universe, skipping");
                            skipped.push(ticker.clone());
                            continue;
                        }
                        Err(e) => return Err(e.into()),
                    };
                    writeln!(out, "{}", serde_json::to_string(&tick)?)?;

                    if let Some(interval_ms) = candle_interval_ms {
                        let ts = tick.timestamp.timestamp_millis();
                        match candles.get_mut(ticker) {
                            Some(builder) if builder.contains(ts) => builder.update(&tick),
                            Some(builder) => {
                                let candle = builder.finish();
                                tracing::info!(
                                    ticker = %candle.ticker,
                                    open = candle.ohlc.open,
                                    high = candle.ohlc.high,
                                    low = candle.ohlc.low,
                                    close = candle.ohlc.close,
                                    volume = candle.volume,
                                    ticks = candle.tick_count,
                                    "Candle closed"
                                );
                                *builder = CandleBuilder::new(&tick, interval_ms);
                            }
                            None => {
                                candles.insert(ticker.clone(), CandleBuilder::new(&tick, interval_ms));
                            }
                        }
                    }
                }
                out.flush()?;

                step += 1;
                if config.runner.max_steps > 0 && step >= config.runner.max_steps {
                    tracing::info!(steps = step, "Reached max_steps");
                    break;
                }
            }
        }
    }

    if let Some(stats) = provider.statistics() {
        tracing::info!(
            scenario = %stats.scenario,
            total_ticks = stats.total_ticks,
            patterns_injected = stats.patterns_injected,
            injection_rate = stats.injection_rate(),
            universe_size = stats.universe_size,
            universe_fallback = stats.universe_fallback,
            pattern_counts = ?stats.pattern_counts,
            "Generation statistics"
        );
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
