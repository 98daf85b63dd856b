use serde::Serialize;

use crate::error::{Result, SynthError};

/// Market-regime parameters. `spread_pct` is in percent of the close.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioParameters {
    pub name: String,
    pub volatility_multiplier: f64,
    pub volume_multiplier: f64,
    pub trend_bias: f64,
    pub spread_pct: f64,
}

impl ScenarioParameters {
    pub fn new(
        name: &str,
        volatility_multiplier: f64,
        volume_multiplier: f64,
        trend_bias: f64,
        spread_pct: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            volatility_multiplier,
            volume_multiplier,
            trend_bias,
            spread_pct,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.volatility_multiplier.is_finite() && self.volatility_multiplier > 0.0) {
            return Err(SynthError::config(format!(
                "scenario '{}': volatility_multiplier must be > 0",
                self.name
            )));
        }
        if !(self.volume_multiplier.is_finite() && self.volume_multiplier > 0.0) {
            return Err(SynthError::config(format!(
                "scenario '{}': volume_multiplier must be > 0",
                self.name
            )));
        }
        if !(-1.0..=1.0).contains(&self.trend_bias) {
            return Err(SynthError::config(format!(
                "scenario '{}': trend_bias must be within [-1, 1], got {}",
                self.name, self.trend_bias
            )));
        }
        if !(self.spread_pct > 0.0 && self.spread_pct < 10.0) {
            return Err(SynthError::config(format!(
                "scenario '{}': spread_pct must be within (0, 10), got {}",
                self.name, self.spread_pct
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioCatalog {
    scenarios: Vec<ScenarioParameters>,
}

impl ScenarioCatalog {
    pub fn builtin() -> Self {
        Self {
            scenarios: vec![
                ScenarioParameters::new("normal", 1.0, 1.0, 0.0, 0.1),
                ScenarioParameters::new("volatile", 3.0, 2.0, 0.0, 0.2),
                ScenarioParameters::new("crash", 5.0, 4.0, -0.8, 0.5),
                ScenarioParameters::new("rally", 2.0, 2.5, 0.8, 0.15),
                ScenarioParameters::new("opening_bell", 4.0, 5.0, 0.0, 0.3),
            ],
        }
    }

    pub fn from_scenarios(scenarios: Vec<ScenarioParameters>) -> Result<Self> {
        for (i, s) in scenarios.iter().enumerate() {
            s.validate()?;
            if scenarios[..i]
                .iter()
                .any(|prev| prev.name.eq_ignore_ascii_case(&s.name))
            {
                return Err(SynthError::config(format!(
                    "duplicate scenario name '{}'",
                    s.name
                )));
            }
        }
        Ok(Self { scenarios })
    }

    /// Look up a scenario. Unknown names are configuration errors; there is
    /// no default.
    pub fn get(&self, name: &str) -> Result<&ScenarioParameters> {
        let key = name.trim();
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(key))
            .ok_or_else(|| {
                SynthError::config(format!(
                    "unknown scenario '{}', expected one of: {}",
                    name,
                    self.names().join(", ")
                ))
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScenarioParameters> {
        self.scenarios.iter()
    }
}
