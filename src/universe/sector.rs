use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SynthError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Healthcare,
    Financial,
    Consumer,
    Communication,
    Energy,
    Materials,
}

/// Per-sector generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectorProfile {
    pub volatility_factor: f64,
    pub typical_price_range: (f64, f64),
    pub base_volume: u64,
}

impl Sector {
    pub const ALL: [Sector; 7] = [
        Sector::Technology,
        Sector::Healthcare,
        Sector::Financial,
        Sector::Consumer,
        Sector::Communication,
        Sector::Energy,
        Sector::Materials,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Technology => "Technology",
            Sector::Healthcare => "Healthcare",
            Sector::Financial => "Financial",
            Sector::Consumer => "Consumer",
            Sector::Communication => "Communication",
            Sector::Energy => "Energy",
            Sector::Materials => "Materials",
        }
    }

    pub fn profile(&self) -> SectorProfile {
        match self {
            Sector::Technology => SectorProfile {
                volatility_factor: 1.3,
                typical_price_range: (50.0, 500.0),
                base_volume: 5_000,
            },
            Sector::Healthcare => SectorProfile {
                volatility_factor: 0.9,
                typical_price_range: (30.0, 550.0),
                base_volume: 2_500,
            },
            Sector::Financial => SectorProfile {
                volatility_factor: 1.0,
                typical_price_range: (25.0, 450.0),
                base_volume: 3_500,
            },
            Sector::Consumer => SectorProfile {
                volatility_factor: 1.1,
                typical_price_range: (20.0, 350.0),
                base_volume: 3_000,
            },
            Sector::Communication => SectorProfile {
                volatility_factor: 1.2,
                typical_price_range: (15.0, 600.0),
                base_volume: 2_800,
            },
            Sector::Energy => SectorProfile {
                volatility_factor: 1.4,
                typical_price_range: (20.0, 180.0),
                base_volume: 2_200,
            },
            Sector::Materials => SectorProfile {
                volatility_factor: 1.0,
                typical_price_range: (25.0, 480.0),
                base_volume: 1_500,
            },
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sector {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.label().eq_ignore_ascii_case(key))
            .ok_or_else(|| SynthError::config(format!("unknown sector '{}'", s)))
    }
}

/// Proportions used to spread a flat ticker list across sectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorWeights {
    weights: Vec<(Sector, f64)>,
}

const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

impl SectorWeights {
    pub fn new(weights: Vec<(Sector, f64)>) -> Result<Self> {
        if weights.is_empty() {
            return Err(SynthError::config("sector weights must not be empty"));
        }
        for (sector, w) in &weights {
            if !w.is_finite() || *w < 0.0 {
                return Err(SynthError::config(format!(
                    "sector weight for {} must be a non-negative number, got {}",
                    sector, w
                )));
            }
        }
        let sum: f64 = weights.iter().map(|(_, w)| w).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(SynthError::config(format!(
                "sector weights must sum to 1.0, got {:.4}",
                sum
            )));
        }
        Ok(Self { weights })
    }

    pub fn entries(&self) -> &[(Sector, f64)] {
        &self.weights
    }

    /// Pick the sector whose cumulative weight band contains `u` (in [0, 1)).
    pub fn pick(&self, u: f64) -> Sector {
        let total: f64 = self.weights.iter().map(|(_, w)| w).sum();
        let target = u.clamp(0.0, 1.0) * total;
        let mut acc = 0.0;
        for (sector, w) in &self.weights {
            acc += w;
            if target < acc {
                return *sector;
            }
        }
        self.weights
            .iter()
            .rev()
            .find(|(_, w)| *w > 0.0)
            .map(|(s, _)| *s)
            .unwrap_or(self.weights[0].0)
    }
}

impl Default for SectorWeights {
    fn default() -> Self {
        Self {
            weights: vec![
                (Sector::Technology, 0.25),
                (Sector::Healthcare, 0.15),
                (Sector::Financial, 0.15),
                (Sector::Consumer, 0.15),
                (Sector::Communication, 0.10),
                (Sector::Energy, 0.10),
                (Sector::Materials, 0.10),
            ],
        }
    }
}
