use std::collections::HashSet;

use serde::Serialize;

use crate::error::{Result, SynthError};
use crate::model::candle::Ohlc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

/// Candlestick template. Each `*_pct` is a signed percent offset from the base
/// price: `price = base * (1 + pct / 100)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternDefinition {
    pub name: String,
    pub open_pct: f64,
    pub high_pct: f64,
    pub low_pct: f64,
    pub close_pct: f64,
    pub bias: PatternBias,
}

impl PatternDefinition {
    pub fn new(
        name: &str,
        open_pct: f64,
        high_pct: f64,
        low_pct: f64,
        close_pct: f64,
        bias: PatternBias,
    ) -> Self {
        Self {
            name: name.to_string(),
            open_pct,
            high_pct,
            low_pct,
            close_pct,
            bias,
        }
    }

    /// Shape a candle around `base`. Valid for any positive base once the
    /// definition has passed [`PatternDefinition::validate`].
    pub fn apply(&self, base: f64) -> Ohlc {
        let at = |pct: f64| base * (1.0 + pct / 100.0);
        Ohlc {
            open: at(self.open_pct),
            high: at(self.high_pct),
            low: at(self.low_pct),
            close: at(self.close_pct),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("open_pct", self.open_pct),
            ("high_pct", self.high_pct),
            ("low_pct", self.low_pct),
            ("close_pct", self.close_pct),
        ];
        for (field, v) in fields {
            if !v.is_finite() || v <= -100.0 {
                return Err(SynthError::config(format!(
                    "pattern '{}': {} must be finite and > -100, got {}",
                    self.name, field, v
                )));
            }
        }
        if self.high_pct < self.open_pct.max(self.close_pct) {
            return Err(SynthError::config(format!(
                "pattern '{}': high_pct {} is below max(open, close)",
                self.name, self.high_pct
            )));
        }
        if self.low_pct > self.open_pct.min(self.close_pct) {
            return Err(SynthError::config(format!(
                "pattern '{}': low_pct {} is above min(open, close)",
                self.name, self.low_pct
            )));
        }
        Ok(())
    }
}

/// Validated, immutable table of candlestick templates.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    patterns: Vec<PatternDefinition>,
}

impl PatternCatalog {
    pub fn builtin() -> Result<Self> {
        Self::from_definitions(builtin_definitions())
    }

    pub fn from_definitions(patterns: Vec<PatternDefinition>) -> Result<Self> {
        let mut names = HashSet::new();
        for p in &patterns {
            if p.name.trim().is_empty() {
                return Err(SynthError::config("pattern name must not be empty"));
            }
            if !names.insert(p.name.to_ascii_lowercase()) {
                return Err(SynthError::config(format!(
                    "duplicate pattern name '{}'",
                    p.name
                )));
            }
            p.validate()?;
        }
        Ok(Self { patterns })
    }

    pub fn get(&self, name: &str) -> Result<&PatternDefinition> {
        let key = name.trim();
        self.patterns
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(key))
            .ok_or_else(|| SynthError::config(format!("unknown pattern '{}'", name)))
    }

    pub fn names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Resolve an allow-list to catalog entries; an empty list means all.
    pub fn resolve_allowlist<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&PatternDefinition>> {
        if names.is_empty() {
            return Ok(self.patterns.iter().collect());
        }
        let mut out: Vec<&PatternDefinition> = Vec::with_capacity(names.len());
        for name in names {
            let def = self.get(name.as_ref())?;
            if !out.iter().any(|p| p.name == def.name) {
                out.push(def);
            }
        }
        Ok(out)
    }
}

fn builtin_definitions() -> Vec<PatternDefinition> {
    vec![
        PatternDefinition::new("Doji", 0.0, 0.3, -0.3, 0.05, PatternBias::Neutral),
        PatternDefinition::new("Hammer", -0.2, 0.1, -2.0, 0.0, PatternBias::Bullish),
        PatternDefinition::new("ShootingStar", 0.2, 2.0, -0.1, 0.0, PatternBias::Bearish),
        PatternDefinition::new("BullishEngulfing", -2.0, 2.3, -2.2, 2.0, PatternBias::Bullish),
        PatternDefinition::new("BearishEngulfing", 2.0, 2.2, -2.3, -2.0, PatternBias::Bearish),
        PatternDefinition::new("Harami", -0.3, 0.6, -0.6, 0.3, PatternBias::Neutral),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_validates() {
        let catalog = PatternCatalog::builtin().unwrap();
        assert_eq!(
            catalog.names(),
            vec![
                "Doji",
                "Hammer",
                "ShootingStar",
                "BullishEngulfing",
                "BearishEngulfing",
                "Harami"
            ]
        );
    }

    #[test]
    fn inverted_high_is_config_error() {
        let bad = PatternDefinition::new("Broken", 1.0, 0.5, -1.0, 0.0, PatternBias::Neutral);
        let err = PatternCatalog::from_definitions(vec![bad]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn low_below_minus_hundred_percent_rejected() {
        let bad = PatternDefinition::new("Abyss", 0.0, 1.0, -100.0, 0.0, PatternBias::Bearish);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn duplicate_names_rejected() {
        let a = PatternDefinition::new("Doji", 0.0, 0.1, -0.1, 0.0, PatternBias::Neutral);
        let b = PatternDefinition::new("doji", 0.0, 0.2, -0.2, 0.0, PatternBias::Neutral);
        assert!(PatternCatalog::from_definitions(vec![a, b]).is_err());
    }
}
