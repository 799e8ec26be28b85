//! Per-backend request budget tracking.
//!
//! Each backend owns one [`RateLimiter`] holding a sliding one-minute window
//! and a per-day counter. The day counter resets when the UTC calendar date
//! changes, matching vendor billing days rather than a rolling 24 hours.
//! State is process-local and not persisted.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Width of the sliding request window.
const MINUTE_WINDOW_SECS: i64 = 60;

/// Request budget for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub requests_per_minute: u32,
    pub requests_per_day: u32,
}

impl RateLimits {
    pub fn new(requests_per_minute: u32, requests_per_day: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_day,
        }
    }
}

/// Mutable counters, owned exclusively by one limiter.
#[derive(Debug)]
struct RateState {
    /// Admission times within the current minute window, oldest first.
    window: VecDeque<DateTime<Utc>>,
    day_count: u32,
    day: NaiveDate,
    last_reset: DateTime<Utc>,
}

impl RateState {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            window: VecDeque::new(),
            day_count: 0,
            day: now.date_naive(),
            last_reset: now,
        }
    }

    /// Drop minute-window entries older than 60s and roll the day counter
    /// over when the calendar date has changed.
    fn reset_if_window_elapsed(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::seconds(MINUTE_WINDOW_SECS);
        while let Some(front) = self.window.front() {
            if *front <= cutoff {
                self.window.pop_front();
            } else {
                break;
            }
        }

        let today = now.date_naive();
        if today != self.day {
            self.day = today;
            self.day_count = 0;
            self.last_reset = now;
        }
    }
}

/// Point-in-time view of a limiter, for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
    pub minute_used: u32,
    pub minute_limit: u32,
    pub day_used: u32,
    pub day_limit: u32,
    pub last_reset: DateTime<Utc>,
}

impl RateLimitSnapshot {
    pub fn exhausted(&self) -> bool {
        self.minute_used >= self.minute_limit || self.day_used >= self.day_limit
    }
}

/// Thread-safe request budget for a single backend.
///
/// `try_acquire` is an atomic check-and-record under a per-limiter mutex, so
/// two concurrent callers can never both take the last remaining slot.
#[derive(Debug)]
pub struct RateLimiter {
    limits: RateLimits,
    state: Mutex<RateState>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(RateState::new(Utc::now())),
        }
    }

    pub fn limits(&self) -> RateLimits {
        self.limits
    }

    /// Record one request if both windows have room.
    ///
    /// Returns `false` without side effects when either budget is spent.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Utc::now())
    }

    /// [`try_acquire`](Self::try_acquire) evaluated at an explicit instant.
    pub fn try_acquire_at(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.lock_state();
        state.reset_if_window_elapsed(now);

        if state.window.len() as u32 >= self.limits.requests_per_minute
            || state.day_count >= self.limits.requests_per_day
        {
            return false;
        }

        state.window.push_back(now);
        state.day_count += 1;
        true
    }

    pub fn snapshot(&self) -> RateLimitSnapshot {
        self.snapshot_at(Utc::now())
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> RateLimitSnapshot {
        let mut state = self.lock_state();
        state.reset_if_window_elapsed(now);
        RateLimitSnapshot {
            minute_used: state.window.len() as u32,
            minute_limit: self.limits.requests_per_minute,
            day_used: state.day_count,
            day_limit: self.limits.requests_per_day,
            last_reset: state.last_reset,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RateState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("Rate limiter mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
