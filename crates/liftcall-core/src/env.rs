//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the system clock. Enables deterministic
//! simulation with a virtual clock and production use with real time.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `uptime()` is measured from the same origin for the life of the process
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`. Simulation uses a virtual
    /// instant advanced by the harness, or `tokio::time::Instant` on a
    /// turmoil clock.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = std::time::Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by driver code (not protocol logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Time since the station booted.
    fn uptime(&self) -> Duration;

    /// Whole seconds since boot, as carried in frame timestamps.
    ///
    /// Saturates at `u32::MAX` rather than wrapping.
    fn uptime_secs(&self) -> u32 {
        u32::try_from(self.uptime().as_secs()).unwrap_or(u32::MAX)
    }
}
