//! Per-host request spacing
//!
//! Every worker reserves the next free start slot for a host before sending a
//! request. Slots are `delay` apart, so the whole run issues requests to one
//! host at most once per `delay` regardless of the worker count.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Shared throttle enforcing a fixed delay between requests per host
#[derive(Debug)]
pub struct HostThrottle {
    delay: Duration,
    next_slot: Mutex<HashMap<String, Instant>>,
}

impl HostThrottle {
    /// Creates a throttle with the given spacing
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    /// Reserves the next slot for `host` and returns when it begins
    ///
    /// The reservation is made immediately, so concurrent callers queue up
    /// behind each other.
    async fn reserve(&self, host: &str) -> Instant {
        let mut slots = self.next_slot.lock().await;
        let now = Instant::now();
        let start = match slots.get(host) {
            Some(&next) if next > now => next,
            _ => now,
        };
        match start.checked_add(self.delay) {
            Some(next) => {
                slots.insert(host.to_string(), next);
            }
            None => tracing::warn!("Delay {:?} out of range, not spacing {}", self.delay, host),
        }
        start
    }

    /// Waits for this caller's turn to contact `host`
    ///
    /// Returns false if `cancel` fired before the slot was reached.
    pub async fn acquire(&self, host: &str, cancel: &CancellationToken) -> bool {
        if self.delay.is_zero() {
            return !cancel.is_cancelled();
        }

        let start = self.reserve(host).await;
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep_until(start) => true,
        }
    }
}
