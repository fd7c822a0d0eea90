//! Production Environment implementation using system time.
//!
//! `SystemEnv` uses the real monotonic clock and tokio sleeps, and measures
//! uptime from the moment it was created (station boot).

use std::time::{Duration, Instant};

use liftcall_core::Environment;

/// Production environment using system time.
#[derive(Clone, Debug)]
pub struct SystemEnv {
    boot: Instant,
}

impl Default for SystemEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemEnv {
    /// Create a new system environment. Uptime starts now.
    #[must_use]
    #[allow(clippy::disallowed_methods)]
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    #[allow(clippy::disallowed_methods)]
    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn uptime(&self) -> Duration {
        self.boot.elapsed()
    }
}
