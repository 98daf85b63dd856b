use serde::{Deserialize, Serialize};

use crate::model::tick::TickData;

/// Open/high/low/close quadruple shared by pattern templates, ticks and candles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Ohlc {
    pub fn is_valid(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }

    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    pub fn lower_shadow(&self) -> f64 {
        self.open.min(self.close) - self.low
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub ticker: String,
    pub ohlc: Ohlc,
    pub volume: u64,
    pub tick_count: u64,
    pub open_time: i64,
    pub close_time: i64,
}

impl Candle {
    pub fn is_bullish(&self) -> bool {
        self.ohlc.is_bullish()
    }
}

/// Aggregates generated ticks into a single candle over a time interval.
#[derive(Debug, Clone)]
pub struct CandleBuilder {
    ticker: String,
    ohlc: Ohlc,
    volume: u64,
    tick_count: u64,
    open_time: i64,
    close_time: i64,
}

impl CandleBuilder {
    /// Start a new candle from a tick. The bucket is aligned to the interval.
    pub fn new(tick: &TickData, interval_ms: i64) -> Self {
        assert!(interval_ms > 0, "interval_ms must be > 0");
        let ts = tick.timestamp.timestamp_millis();
        let open_time = ts - ts.rem_euclid(interval_ms);
        Self {
            ticker: tick.ticker.clone(),
            ohlc: tick.ohlc(),
            volume: tick.volume,
            tick_count: 1,
            open_time,
            close_time: open_time + interval_ms,
        }
    }

    /// Fold a later tick of the same ticker into the candle.
    pub fn update(&mut self, tick: &TickData) {
        self.ohlc.high = self.ohlc.high.max(tick.high);
        self.ohlc.low = self.ohlc.low.min(tick.low);
        self.ohlc.close = tick.close;
        self.volume = self.volume.saturating_add(tick.volume);
        self.tick_count += 1;
    }

    /// Check if a timestamp (ms) belongs to this candle's time bucket.
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        timestamp_ms >= self.open_time && timestamp_ms < self.close_time
    }

    /// Finalize into an immutable Candle.
    pub fn finish(&self) -> Candle {
        Candle {
            ticker: self.ticker.clone(),
            ohlc: self.ohlc,
            volume: self.volume,
            tick_count: self.tick_count,
            open_time: self.open_time,
            close_time: self.close_time,
        }
    }
}
