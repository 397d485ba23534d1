//! Sliding-window admission control.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::window::LimiterConfig;
use crate::error::{CrptError, Result};

/// A sliding-window rate limiter.
///
/// Keeps the timestamps of recent admissions, oldest first, and admits a new
/// caller only when fewer than `request_limit` of them fall inside the
/// trailing window. Callers that find the window full sleep until the oldest
/// entry ages out. The window lock is released for the duration of that sleep,
/// so many waiters can be suspended at once.
///
/// This struct is thread-safe and can be shared across multiple tasks.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    config: LimiterConfig,
    /// Admission timestamps, oldest first
    window: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter with an empty window.
    pub fn new(config: LimiterConfig) -> Self {
        Self {
            config,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Get the configuration this limiter enforces.
    pub fn config(&self) -> LimiterConfig {
        self.config
    }

    /// Wait for a free slot and reserve it.
    ///
    /// Dropping the returned future before it completes reserves nothing.
    pub async fn acquire(&self) -> Result<()> {
        self.acquire_with_cancel(&CancellationToken::new()).await
    }

    /// Wait for a free slot and reserve it, giving up when `cancel` fires.
    ///
    /// On cancellation this returns [`CrptError::Cancelled`] and the window
    /// is left exactly as it was.
    pub async fn acquire_with_cancel(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            if cancel.is_cancelled() {
                debug!("Admission cancelled");
                return Err(CrptError::Cancelled);
            }

            let wait = {
                let mut window = self.window.lock();
                let now = Instant::now();

                match self.trim(&mut window, now) {
                    None => {
                        window.push_back(now);
                        trace!(
                            admitted = window.len(),
                            limit = self.config.request_limit(),
                            "Admission granted"
                        );
                        return Ok(());
                    }
                    Some(wait) => wait,
                }
            };

            debug!(
                wait_ms = wait.as_millis() as u64,
                limit = self.config.request_limit(),
                "Window full, waiting for a slot"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Admission cancelled while waiting");
                    return Err(CrptError::Cancelled);
                }
                _ = sleep(wait) => {}
            }
        }
    }

    /// Pop entries that have left the window while it is at capacity.
    ///
    /// Returns `None` when a slot is free, otherwise how long until the
    /// oldest retained entry ages out.
    fn trim(&self, window: &mut VecDeque<Instant>, now: Instant) -> Option<Duration> {
        let length = self.config.window();

        while window.len() >= self.config.request_limit() {
            let oldest = *window.front()?;
            let elapsed = now.saturating_duration_since(oldest);
            if elapsed < length {
                return Some(length - elapsed);
            }
            window.pop_front();
        }

        None
    }

    /// Number of timestamps currently retained, aged-out ones included.
    pub fn len(&self) -> usize {
        self.window.lock().len()
    }

    /// Whether no admission has been retained.
    pub fn is_empty(&self) -> bool {
        self.window.lock().is_empty()
    }

    /// Get the number of callers that would be admitted right now.
    pub fn remaining(&self) -> usize {
        let now = Instant::now();
        let window = self.window.lock();
        let live = window
            .iter()
            .filter(|admitted| now.saturating_duration_since(**admitted) < self.config.window())
            .count();

        self.config.request_limit().saturating_sub(live)
    }

    /// Get the duration until the next slot frees up.
    pub fn duration_until_available(&self) -> Duration {
        let now = Instant::now();
        let window = self.window.lock();
        let limit = self.config.request_limit();

        if window.len() < limit {
            return Duration::ZERO;
        }

        let blocking = window[window.len() - limit];
        self.config
            .window()
            .saturating_sub(now.saturating_duration_since(blocking))
    }
}
