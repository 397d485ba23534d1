//! Window granularity and limiter configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CrptError, Result};

/// Time window for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Per-millisecond rate limiting
    Millisecond,
    /// Per-second rate limiting
    Second,
    /// Per-minute rate limiting
    Minute,
    /// Per-hour rate limiting
    Hour,
    /// Per-day rate limiting
    Day,
}

impl TimeWindow {
    /// Get the duration of one unit of this window.
    pub fn duration(&self) -> Duration {
        match self {
            TimeWindow::Millisecond => Duration::from_millis(1),
            TimeWindow::Second => Duration::from_secs(1),
            TimeWindow::Minute => Duration::from_secs(60),
            TimeWindow::Hour => Duration::from_secs(3600),
            TimeWindow::Day => Duration::from_secs(86400),
        }
    }
}

/// Validated limiter settings: at most `request_limit` admissions per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterConfig {
    window: Duration,
    request_limit: usize,
}

impl LimiterConfig {
    /// Allow `request_limit` admissions per one unit of `unit`.
    pub fn new(unit: TimeWindow, request_limit: i64) -> Result<Self> {
        Self::with_duration(unit.duration(), request_limit)
    }

    /// Allow `request_limit` admissions per arbitrary `window`.
    pub fn with_duration(window: Duration, request_limit: i64) -> Result<Self> {
        if request_limit <= 0 {
            return Err(CrptError::InvalidConfiguration(format!(
                "request limit must be positive, got {}",
                request_limit
            )));
        }
        if window.is_zero() {
            return Err(CrptError::InvalidConfiguration(
                "window duration must be non-zero".to_string(),
            ));
        }

        let request_limit = usize::try_from(request_limit).map_err(|_| {
            CrptError::InvalidConfiguration(format!(
                "request limit {} does not fit in memory",
                request_limit
            ))
        })?;

        Ok(Self {
            window,
            request_limit,
        })
    }

    /// Length of the sliding window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Maximum admissions inside any window.
    pub fn request_limit(&self) -> usize {
        self.request_limit
    }
}
