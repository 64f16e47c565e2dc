//! Shared throttle for outbound API calls
//!
//! Bounds the number of requests in flight and enforces a minimum spacing
//! between dispatches across every service sharing the throttle.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::Instant;
use tracing::debug;

/// Raised once the throttle has been closed for shutdown
#[derive(Debug, Clone, Copy, Error)]
#[error("throttle is closed")]
pub struct ThrottleClosed;

/// Concurrency limit plus minimum dispatch spacing
///
/// ## Reservation-based spacing
///
/// A caller holding a permit reserves its dispatch slot while holding the
/// slot lock, then releases the lock and sleeps until the slot. Concurrent
/// callers therefore always get distinct slots at least `cooldown` apart.
/// When a permit is dropped the completion time pushes the next slot out to
/// `completion + cooldown`.
#[derive(Debug)]
pub struct Throttle {
    permits: Semaphore,
    max_concurrent: usize,
    /// Next free dispatch slot, in ms since `epoch`
    next_available_ms: Mutex<u64>,
    epoch: Instant,
    cooldown: Duration,
    total_dispatches: AtomicU64,
    waited_dispatches: AtomicU64,
}

/// Slot held for one outbound call; dropping it releases the slot
#[derive(Debug)]
pub struct ThrottlePermit<'a> {
    throttle: &'a Throttle,
    _permit: SemaphorePermit<'a>,
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        self.throttle.record_completion();
    }
}

impl Throttle {
    pub fn new(max_concurrent: usize, cooldown: Duration) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Semaphore::new(max_concurrent),
            max_concurrent,
            next_available_ms: Mutex::new(0),
            epoch: Instant::now(),
            cooldown,
            total_dispatches: AtomicU64::new(0),
            waited_dispatches: AtomicU64::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        Instant::now().duration_since(self.epoch).as_millis() as u64
    }

    fn cooldown_ms(&self) -> u64 {
        self.cooldown.as_millis() as u64
    }

    /// Wait for a free slot and the cooldown, then return the permit
    pub async fn acquire(&self) -> Result<ThrottlePermit<'_>, ThrottleClosed> {
        let permit = self.permits.acquire().await.map_err(|_| ThrottleClosed)?;
        let dispatch = self.total_dispatches.fetch_add(1, Ordering::Relaxed) + 1;

        let slot_ms = {
            let now_ms = self.now_ms();
            let mut next_available = self.next_available_ms.lock();
            let slot = if now_ms >= *next_available {
                now_ms
            } else {
                self.waited_dispatches.fetch_add(1, Ordering::Relaxed);
                *next_available
            };
            *next_available = slot + self.cooldown_ms();
            slot
        };

        let target = self.epoch + Duration::from_millis(slot_ms);
        let wait = target.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!("[Throttle] #{} waiting {:?} for cooldown", dispatch, wait);
            tokio::time::sleep_until(target).await;
        }

        Ok(ThrottlePermit {
            throttle: self,
            _permit: permit,
        })
    }

    fn record_completion(&self) {
        let done_ms = self.now_ms() + self.cooldown_ms();
        let mut next_available = self.next_available_ms.lock();
        if done_ms > *next_available {
            *next_available = done_ms;
        }
    }

    /// Reject all pending and future acquisitions
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn stats(&self) -> ThrottleStats {
        ThrottleStats {
            total_dispatches: self.total_dispatches.load(Ordering::Relaxed),
            waited_dispatches: self.waited_dispatches.load(Ordering::Relaxed),
            in_flight: self.max_concurrent - self.permits.available_permits(),
            max_concurrent: self.max_concurrent,
            cooldown_ms: self.cooldown_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStats {
    pub total_dispatches: u64,
    pub waited_dispatches: u64,
    pub in_flight: usize,
    pub max_concurrent: usize,
    pub cooldown_ms: u64,
}
