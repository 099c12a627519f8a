//! Local admission check against Twitter's 15 requests / 15 minutes quota

use chrono::{DateTime, Duration, Utc};

const WINDOW_MINUTES: i64 = 15;
const REQUESTS_PER_WINDOW: u32 = 15;

#[derive(Debug, Clone, Copy)]
pub struct RefreshPolicy {
    window: Duration,
    cap: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(WINDOW_MINUTES),
            cap: REQUESTS_PER_WINDOW,
        }
    }
}

impl RefreshPolicy {
    /// A fetch is allowed once the window has passed, or while under the cap
    pub fn should_fetch(
        &self,
        window_start: DateTime<Utc>,
        request_count: u32,
        now: DateTime<Utc>,
    ) -> bool {
        now - window_start > self.window || request_count < self.cap
    }

    /// Whole minutes (rounded up) until the current window closes
    pub fn minutes_until_next_window(
        &self,
        window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> i64 {
        let remaining = (self.window - (now - window_start)).num_milliseconds();
        if remaining <= 0 {
            return 0;
        }
        (remaining + 59_999) / 60_000
    }

    /// Bookkeeping after an allowed fetch, returns the new (window start, count)
    pub fn advance(
        &self,
        window_start: DateTime<Utc>,
        request_count: u32,
        now: DateTime<Utc>,
    ) -> (DateTime<Utc>, u32) {
        if now - window_start < self.window {
            (window_start, request_count.saturating_add(1))
        } else {
            (now, 1)
        }
    }
}
