//! Retry and reconnect supervision.
//!
//! BLE links drop often enough that a single failed write says little.
//! The supervisor retries transport-level failures a bounded number of
//! times, re-establishing the GATT link between attempts, and propagates
//! everything else immediately. Each attempt re-invokes the operation
//! closure, which is expected to build a whole new transaction with a
//! fresh transaction id.
//!
//! Reconnection is coalesced: the supervisor is the only entity allowed
//! to trigger it, and concurrent failures on the same peripheral share a
//! single reconnect through [`ReconnectGate`].

use std::{future::Future, time::Duration};

use tokio::sync::Mutex;

use crate::{
    cancel::CancelToken,
    env::Environment,
    error::HapError,
    gatt::{GattPeripheral, TransportError},
};

/// Wait strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same wait before every retry.
    Fixed(Duration),
    /// Doubling wait starting at `base`, capped at 30 seconds.
    Exponential {
        /// Wait before the first retry.
        base: Duration,
    },
}

impl Backoff {
    /// Longest wait the exponential strategy will reach.
    pub const MAX_DELAY: Duration = Duration::from_secs(30);

    /// Wait before the retry following attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(wait) => *wait,
            Self::Exponential { base } => {
                let exponent = attempt.saturating_sub(1).min(16);
                base.saturating_mul(1 << exponent).min(Self::MAX_DELAY)
            },
        }
    }
}

/// Bounded-retry policy for transport-facing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first.
    pub max_attempts: u32,
    /// Wait strategy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, backoff: Backoff::Fixed(Duration::from_secs(1)) }
    }
}

impl RetryPolicy {
    /// Fixed wait between up to `max_attempts` attempts.
    #[must_use]
    pub fn fixed(max_attempts: u32, wait: Duration) -> Self {
        Self { max_attempts, backoff: Backoff::Fixed(wait) }
    }

    /// Doubling wait starting at `base`.
    #[must_use]
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self { max_attempts, backoff: Backoff::Exponential { base } }
    }

    /// Single attempt, no retrying.
    #[must_use]
    pub fn none() -> Self {
        Self { max_attempts: 1, backoff: Backoff::Fixed(Duration::ZERO) }
    }
}

/// Coalesces concurrent reconnect attempts on one peripheral.
///
/// Callers snapshot the generation before their operation; on failure they
/// request a reconnect with that snapshot. If the generation has already
/// advanced, someone else re-established the link in the meantime and the
/// request is a no-op.
#[derive(Debug, Default)]
pub struct ReconnectGate {
    generation: Mutex<u64>,
}

impl ReconnectGate {
    /// New gate at generation zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current link generation.
    pub async fn observe(&self) -> u64 {
        *self.generation.lock().await
    }

    /// Reconnect unless the link was already re-established after
    /// `observed` was taken.
    ///
    /// Waiters queue on the internal lock, so during a reconnect storm
    /// exactly one call reaches the peripheral and the rest return once it
    /// finishes.
    pub async fn reconnect<P: GattPeripheral>(
        &self,
        peripheral: &P,
        observed: u64,
    ) -> Result<(), TransportError> {
        let mut generation = self.generation.lock().await;
        if *generation > observed {
            return Ok(());
        }
        tracing::debug!(generation = *generation, "re-establishing GATT link");
        peripheral.reconnect().await?;
        *generation += 1;
        Ok(())
    }
}

/// Wraps transport-facing operations with bounded retries and reconnects.
///
/// Borrowing construction makes this cheap to assemble at call sites with
/// whatever policy the caller wants; the shared state (peripheral handle
/// and gate) lives with the link.
#[derive(Debug)]
pub struct Supervisor<'a, P, E> {
    peripheral: &'a P,
    gate: &'a ReconnectGate,
    env: &'a E,
    policy: RetryPolicy,
}

impl<'a, P: GattPeripheral, E: Environment> Supervisor<'a, P, E> {
    /// Supervise operations on `peripheral` under `policy`.
    #[must_use]
    pub fn new(peripheral: &'a P, gate: &'a ReconnectGate, env: &'a E, policy: RetryPolicy) -> Self {
        Self { peripheral, gate, env, policy }
    }

    /// Run `op`, retrying transient failures.
    ///
    /// `op` is re-invoked from scratch on every attempt. Application-level
    /// failures (HAP status, protocol violations, cancellation) propagate
    /// immediately; transport failures trigger a coalesced reconnect and a
    /// backoff sleep, up to the policy's attempt bound.
    pub async fn run<T, F, Fut>(&self, cancel: &CancelToken, mut op: F) -> Result<T, HapError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HapError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            cancel.check()?;
            let observed = self.gate.observe().await;
            let started = self.env.now();

            match op().await {
                Ok(value) => return Ok(value),
                Err(error) if !error.is_transient() => return Err(error),
                Err(error) => {
                    if attempt >= max_attempts {
                        return Err(error);
                    }
                    let elapsed = self.env.now() - started;
                    tracing::warn!(
                        attempt,
                        ?elapsed,
                        %error,
                        "transport failure, reconnecting before retry"
                    );
                    if let Err(reconnect_error) =
                        self.gate.reconnect(self.peripheral, observed).await
                    {
                        tracing::warn!(%reconnect_error, "reconnect failed, retrying anyway");
                    }
                    self.env.sleep(self.policy.backoff.delay(attempt)).await;
                    attempt += 1;
                },
            }
        }
    }
}
