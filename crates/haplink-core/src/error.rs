//! Error taxonomy for HAP-BLE transactions.
//!
//! A closed sum over everything a transaction can fail with. Only
//! [`HapError::Transport`] is transient; the supervisor retries nothing
//! else. Protocol violations carry the offending response bytes so that
//! operators can diagnose a misbehaving peripheral from the error alone.

use bytes::Bytes;
use haplink_proto::{HapStatus, ProtocolError};
use thiserror::Error;

use crate::gatt::TransportError;

/// Errors surfaced by the transaction engine and supervisor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HapError {
    /// GATT read/write failed or the link dropped. Retried by the
    /// supervisor, with a reconnect between attempts.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Caller-initiated cancellation. Not retried.
    #[error("transaction cancelled")]
    Cancelled,

    /// The response violated the wire protocol.
    #[error("malformed response: {source}")]
    Malformed {
        /// The specific codec fault
        #[source]
        source: ProtocolError,
        /// Raw bytes of the offending PDU
        bytes: Bytes,
    },

    /// The response echoed a transaction id that does not match the
    /// request. Likely peripheral misbehavior or a stale read buffer.
    #[error("transaction id mismatch: expected {expected:#04x}, got {actual:#04x}")]
    TransactionMismatch {
        /// Transaction id of the originating request
        expected: u8,
        /// Transaction id the peripheral echoed
        actual: u8,
        /// Raw bytes of the offending PDU
        bytes: Bytes,
    },

    /// The peripheral reported a HAP status other than Success.
    #[error("{}: {}", .0.name(), .0.message())]
    Status(HapStatus),

    /// The operation needs a capability this client does not provide.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
}

impl HapError {
    /// Returns true if retrying the whole transaction may succeed.
    ///
    /// Only transport faults qualify. A HAP status error or a protocol
    /// violation indicates a broken request or a broken peer; retrying
    /// would just repeat it.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
