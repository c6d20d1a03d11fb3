//! Time Abstractions
//!
//! Provides injectable time and delay sources for deterministic testing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Time source trait
///
/// Abstracts system time so timestamps in reports and archive names are
/// deterministic under test.
///
/// # Example
///
/// ```ignore
/// use core_remote::time::Clock;
///
/// fn stamp(clock: &dyn Clock) -> String {
///     clock.now().format("%Y-%m-%d").to_string()
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Delay source trait
///
/// Abstracts waiting so retry loops run instantly in tests while recording
/// the delays they would have taken.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current task for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Tokio-backed sleeper for production use
#[derive(Debug, Clone, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
