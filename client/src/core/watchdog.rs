//! Session watchdog
//!
//! One owned `Watchdog` per session: a fixed hard deadline plus a sliding
//! inactivity deadline. The controller awaits the two expiry futures inside
//! its `select!` loop, resets the inactivity window on every processed
//! event, and cancels the whole set exactly once on any terminal
//! transition. No timer handles escape this type.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline pair guarding one session
#[derive(Debug)]
pub struct Watchdog {
    hard_deadline: Instant,
    inactivity_deadline: Instant,
    inactivity_window: Duration,
    armed: bool,
}

impl Watchdog {
    /// Arm both deadlines relative to now
    pub fn new(hard_timeout: Duration, inactivity_window: Duration) -> Self {
        let now = Instant::now();
        Self {
            hard_deadline: now + hard_timeout,
            inactivity_deadline: now + inactivity_window,
            inactivity_window,
            armed: true,
        }
    }

    /// Push the inactivity deadline forward. Called on every processed
    /// event, keepalives included.
    pub fn reset(&mut self) {
        self.inactivity_deadline = Instant::now() + self.inactivity_window;
    }

    /// Disarm both deadlines. Idempotent; expiry futures never resolve
    /// afterwards.
    pub fn cancel(&mut self) {
        self.armed = false;
    }

    /// Resolves when the hard ceiling is reached; pends forever once
    /// cancelled
    pub async fn hard_expired(&self) {
        if !self.armed {
            return std::future::pending::<()>().await;
        }
        tokio::time::sleep_until(self.hard_deadline).await;
    }

    /// Resolves when the inactivity window runs out; pends forever once
    /// cancelled
    pub async fn inactivity_expired(&self) {
        if !self.armed {
            return std::future::pending::<()>().await;
        }
        tokio::time::sleep_until(self.inactivity_deadline).await;
    }
}
