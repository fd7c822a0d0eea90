//! Virtual clock environment.
//!
//! Time only advances when the runtime sleeps or the scripted radio waits
//! out a listen window, so an 18-second retry cycle runs in microseconds and
//! every run is identical.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    ops::Sub,
    sync::{Arc, Mutex},
    time::Duration,
};

use liftcall_core::Environment;

/// Point on the virtual timeline (time since simulated boot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Time since simulated boot.
    #[must_use]
    pub fn since_boot(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Environment with a shared virtual clock.
///
/// Clones share the same clock.
#[derive(Debug, Clone, Default)]
pub struct SimEnv {
    clock: Arc<Mutex<Duration>>,
}

impl SimEnv {
    /// Clock at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        let mut clock = self.clock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *clock += duration;
    }

    /// Time since simulated boot.
    pub fn elapsed(&self) -> Duration {
        *self.clock.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> Self::Instant {
        SimInstant(self.elapsed())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }

    fn uptime(&self) -> Duration {
        self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_moves_when_advanced() {
        let env = SimEnv::new();
        let t0 = env.now();
        assert_eq!(env.now(), t0);

        env.advance(Duration::from_millis(1500));
        assert_eq!(env.now() - t0, Duration::from_millis(1500));
        assert_eq!(env.uptime_secs(), 1);
    }

    #[tokio::test]
    async fn sleep_advances_shared_clock() {
        let env = SimEnv::new();
        let other = env.clone();

        env.sleep(Duration::from_secs(2)).await;
        assert_eq!(other.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn instants_never_underflow() {
        let early = SimInstant(Duration::from_secs(1));
        let late = SimInstant(Duration::from_secs(3));
        assert_eq!(late - early, Duration::from_secs(2));
        assert_eq!(early - late, Duration::ZERO);
    }
}
