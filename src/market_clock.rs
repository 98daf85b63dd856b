//! Tick timestamps and the New York session multiplier table.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use chrono_tz::America::New_York;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionWindow {
    Opening,
    Lunch,
    Closing,
    Regular,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeMultiplier {
    pub volume: f64,
    pub volatility: f64,
}

impl TimeMultiplier {
    pub const NEUTRAL: TimeMultiplier = TimeMultiplier {
        volume: 1.0,
        volatility: 1.0,
    };
}

impl SessionWindow {
    pub fn multiplier(&self) -> TimeMultiplier {
        match self {
            SessionWindow::Opening => TimeMultiplier {
                volume: 3.0,
                volatility: 2.0,
            },
            SessionWindow::Lunch => TimeMultiplier {
                volume: 0.5,
                volatility: 0.7,
            },
            SessionWindow::Closing => TimeMultiplier {
                volume: 2.0,
                volatility: 1.5,
            },
            SessionWindow::Regular => TimeMultiplier::NEUTRAL,
        }
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
}

/// Classify an instant by New York wall-clock time. Windows are half-open.
pub fn session_window(ts: DateTime<Utc>) -> SessionWindow {
    let local = ts.with_timezone(&New_York).time();
    if local >= hm(9, 30) && local < hm(10, 0) {
        SessionWindow::Opening
    } else if local >= hm(12, 0) && local < hm(13, 0) {
        SessionWindow::Lunch
    } else if local >= hm(15, 0) && local < hm(16, 0) {
        SessionWindow::Closing
    } else {
        SessionWindow::Regular
    }
}

pub fn time_multiplier(ts: DateTime<Utc>) -> TimeMultiplier {
    session_window(ts).multiplier()
}

/// Source of tick timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MarketClock {
    #[default]
    Wall,
    /// Each ticker's n-th tick is stamped `start + n * step`.
    Simulated { start: DateTime<Utc>, step: Duration },
}

impl MarketClock {
    pub fn timestamp_for(&self, tick_index: u64) -> DateTime<Utc> {
        match self {
            MarketClock::Wall => Utc::now(),
            MarketClock::Simulated { start, step } => {
                let n = i32::try_from(tick_index).unwrap_or(i32::MAX);
                step.checked_mul(n)
                    .and_then(|offset| start.checked_add_signed(offset))
                    .unwrap_or(*start)
            }
        }
    }

    pub fn is_simulated(&self) -> bool {
        matches!(self, MarketClock::Simulated { .. })
    }
}
