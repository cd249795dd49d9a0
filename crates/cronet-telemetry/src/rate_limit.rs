//! Sampling gate for traffic telemetry.
//!
//! # Design
//! - Sliding one-second window: the instants of granted permits are kept and expire one
//!   second after they were granted, so no one-second interval ever sees more than N grants.
//! - Non-blocking; a rejected caller simply drops its sample.
//! - The clock is injected so tests can drive time explicitly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};

const WINDOW: Duration = Duration::from_secs(1);

/// Grants at most `permits_per_second` permits in any one-second window.
#[derive(Debug)]
pub struct RateLimiter {
    permits_per_second: u32,
    clock: Arc<dyn Clock>,
    granted: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Limiter driven by the system clock.
    #[must_use]
    pub fn new(permits_per_second: u32) -> Self {
        Self::with_clock(permits_per_second, Arc::new(SystemClock))
    }

    /// Limiter driven by `clock`.
    #[must_use]
    pub fn with_clock(permits_per_second: u32, clock: Arc<dyn Clock>) -> Self {
        let capacity = usize::try_from(permits_per_second).unwrap_or(usize::MAX);
        Self {
            permits_per_second,
            clock,
            granted: Mutex::new(VecDeque::with_capacity(capacity.min(1_024))),
        }
    }

    /// Configured rate.
    #[must_use]
    pub const fn permits_per_second(&self) -> u32 {
        self.permits_per_second
    }

    /// Take a permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        if self.permits_per_second == 0 {
            return false;
        }
        let now = self.clock.now();
        let mut granted = self.granted.lock().unwrap_or_else(PoisonError::into_inner);
        while granted
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= WINDOW)
        {
            granted.pop_front();
        }

        let limit = usize::try_from(self.permits_per_second).unwrap_or(usize::MAX);
        if granted.len() < limit {
            granted.push_back(now);
            true
        } else {
            false
        }
    }
}
