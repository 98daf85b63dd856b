use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::candle::Ohlc;

/// Origin of a tick. Downstream consumers must treat it as informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Simulated,
    Vendor,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Simulated => "simulated",
            DataSource::Vendor => "vendor",
        }
    }
}

/// One OHLCV + bid/ask observation for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickData {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub bid: f64,
    pub ask: f64,
    pub volume: u64,
    pub pattern_injected: Option<String>,
    pub source: DataSource,
}

impl TickData {
    pub fn ohlc(&self) -> Ohlc {
        Ohlc {
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
        }
    }

    pub fn spread(&self) -> f64 {
        self.ask - self.bid
    }

    /// Check the invariants every emitted tick must satisfy.
    pub fn is_consistent(&self) -> bool {
        self.ohlc().is_valid()
            && self.bid < self.ask
            && self.volume > 0
            && self.low > 0.0
            && self.bid > 0.0
    }
}
