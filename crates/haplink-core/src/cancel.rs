//! Cooperative cancellation.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::error::HapError;

/// Cloneable cancellation flag for in-flight transactions.
///
/// The engine checks the token between fragments, before each response
/// read and between retry attempts; the supervisor stops retrying once it
/// trips. Cancelling does not abort a GATT call already in flight, it
/// stops the transaction at its next suspension point. A partially
/// written fragment sequence leaves the peripheral in an undefined state;
/// the caller retries the whole transaction under a fresh transaction id.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// New, un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the flag. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the flag is tripped.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// `Err(HapError::Cancelled)` once tripped.
    pub fn check(&self) -> Result<(), HapError> {
        if self.is_cancelled() { Err(HapError::Cancelled) } else { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(token.check().is_ok());
        clone.cancel();

        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(HapError::Cancelled));
    }
}
