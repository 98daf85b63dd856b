use std::collections::BTreeMap;

use serde::Serialize;

/// Snapshot returned by `TickGenerator::get_statistics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorStatistics {
    pub scenario: String,
    pub total_ticks: u64,
    pub patterns_injected: u64,
    pub pattern_counts: BTreeMap<String, u64>,
    pub universe_size: usize,
    pub universe_fallback: bool,
    pub active_tickers: usize,
}

impl GeneratorStatistics {
    pub fn injection_rate(&self) -> f64 {
        if self.total_ticks == 0 {
            0.0
        } else {
            self.patterns_injected as f64 / self.total_ticks as f64
        }
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StatsAccumulator {
    total_ticks: u64,
    patterns_injected: u64,
    pattern_counts: BTreeMap<String, u64>,
}

impl StatsAccumulator {
    pub fn record(&mut self, pattern: Option<&str>) {
        self.total_ticks = self.total_ticks.saturating_add(1);
        if let Some(name) = pattern {
            self.patterns_injected = self.patterns_injected.saturating_add(1);
            let entry = self.pattern_counts.entry(name.to_string()).or_default();
            *entry = entry.saturating_add(1);
        }
    }

    pub fn snapshot(
        &self,
        scenario: &str,
        universe_size: usize,
        universe_fallback: bool,
        active_tickers: usize,
    ) -> GeneratorStatistics {
        GeneratorStatistics {
            scenario: scenario.to_string(),
            total_ticks: self.total_ticks,
            patterns_injected: self.patterns_injected,
            pattern_counts: self.pattern_counts.clone(),
            universe_size,
            universe_fallback,
            active_tickers,
        }
    }
}
