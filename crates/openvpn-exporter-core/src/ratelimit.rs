//! Sliding-window admission control for the scrape endpoint.
//!
//! One shared map of per-client request timestamps, mutated under a single
//! lock: prune, check, and append happen as one critical section so
//! concurrent requests from the same client cannot interleave between the
//! check and the append.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Width of the trailing admission window.
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

/// Maximum requests a single client may place inside one window.
pub const MAX_REQUESTS_PER_WINDOW: usize = 100;

/// Outcome of one admission check, with the window occupancy after the
/// check (admitted requests include themselves in the count).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted { occupancy: usize },
    Denied { occupancy: usize },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admitted { .. })
    }
}

/// Sliding-window rate limiter keyed by client identifier.
pub struct RateLimiter {
    window: Duration,
    max_requests: usize,
    windows: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RATE_LIMIT_WINDOW, MAX_REQUESTS_PER_WINDOW)
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self {
            window,
            max_requests,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Decides admission for one request.
    ///
    /// `now` is passed in rather than sampled so the decision is
    /// deterministic under test. Entries older than the window are pruned
    /// before the check; an admitted request is appended inside the same
    /// critical section.
    pub fn check(&self, client_id: &str, now: Instant) -> RateDecision {
        let mut windows = self.windows.lock().unwrap();

        // Drop fully idle windows first. Client identifiers come from
        // spoofable request metadata, so without the sweep the map grows by
        // one entry per distinct id forever.
        windows.retain(|_, entries| {
            entries
                .back()
                .is_some_and(|&t| now.duration_since(t) < self.window)
        });

        let entries = windows.entry(client_id.to_string()).or_default();

        while entries
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            entries.pop_front();
        }

        if entries.len() >= self.max_requests {
            warn!(client = client_id, occupancy = entries.len(), "rate limit exceeded");
            return RateDecision::Denied {
                occupancy: entries.len(),
            };
        }

        entries.push_back(now);
        RateDecision::Admitted {
            occupancy: entries.len(),
        }
    }

    /// Number of client windows currently retained.
    pub fn tracked_clients(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}
