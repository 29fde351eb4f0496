use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point in time below which events are considered already processed.
///
/// Renders as `YYYY-MM-DD HH:MM:SS.mmm` (UTC) when bound into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(DateTime<Utc>);

impl Watermark {
    pub const FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.3f";

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

/// Source of cycle start times
pub trait Clock: Send + Sync {
    fn now(&self) -> Watermark;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Watermark {
        Watermark::now()
    }
}

/// What happens to the watermark when a query failed during the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkPolicy {
    /// Move to the cycle start anyway; rows of the failed query in that
    /// window are never delivered.
    #[default]
    Advance,
    /// Keep the previous watermark so the next cycle covers the window again.
    /// Successful queries may then re-deliver rows.
    Hold,
}

impl WatermarkPolicy {
    /// Watermark to use after a cycle. Never moves backwards.
    pub fn next(self, previous: Watermark, cycle_start: Watermark, had_failures: bool) -> Watermark {
        match self {
            WatermarkPolicy::Hold if had_failures => previous,
            _ => previous.max(cycle_start),
        }
    }
}
