//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from system resources (time, randomness).
//! Production code uses [`SystemEnv`]; tests pin transaction ids and make
//! retry waits instantaneous.

use std::{future::Future, time::Duration};

use rand::RngCore;

/// Abstract environment providing time, sleeping and randomness.
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `random_bytes()` uses cryptographically secure entropy in production
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the only async method in the trait; the supervisor uses it
    /// to space retry attempts.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;

    /// Fills the provided buffer with random bytes.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Draws a fresh 8-bit transaction id.
    ///
    /// Every retry attempt draws a new one: a partially written fragment
    /// sequence must never be resumed under the old id.
    fn transaction_id(&self) -> u8 {
        let mut byte = [0u8; 1];
        self.random_bytes(&mut byte);
        byte[0]
    }
}

/// Production environment: system clock, tokio timer, OS entropy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Environment for SystemEnv {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        rand::rngs::OsRng.fill_bytes(buffer);
    }
}
