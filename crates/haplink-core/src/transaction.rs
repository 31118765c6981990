//! Transaction engine.
//!
//! One transaction is one request PDU (possibly fragmented across writes)
//! and its matching response (possibly fragmented across reads), paired by
//! transaction id.
//!
//! # State Machine
//!
//! ```text
//!  Idle → Sending → [more fragments?] → Sending
//!                         └→ AwaitingResponse → Parsing → Done
//!                                                     ↘ Failed
//! ```
//!
//! Terminal states are `Done` and `Failed`. Cancellation in any state
//! surfaces [`HapError::Cancelled`] and moves to `Failed`.

use bytes::{Bytes, BytesMut};
use haplink_proto::{
    CONTROL_CONTINUATION, DEFAULT_MAX_FRAME, MIN_FRAME, ProtocolError, RequestHeader,
    ResponseHeader, TlvItem, fragment_request,
};

use crate::{cancel::CancelToken, error::HapError, gatt::GattCharacteristic};

/// Per-transaction configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionConfig {
    max_frame: usize,
}

impl TransactionConfig {
    /// Config with an explicit frame size limit, for peripherals that
    /// negotiated an MTU below the 512-byte ceiling. Clamped to the
    /// smallest workable frame.
    #[must_use]
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self { max_frame: max_frame.max(MIN_FRAME) }
    }

    /// Serialized frame size limit.
    #[must_use]
    pub fn max_frame(&self) -> usize {
        self.max_frame
    }
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self { max_frame: DEFAULT_MAX_FRAME }
    }
}

/// Lifecycle states of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Created, nothing sent yet.
    Idle,
    /// Request fragments are being written.
    Sending,
    /// All fragments written, waiting for the response read.
    AwaitingResponse,
    /// Response bytes received, header/body validation in progress.
    Parsing,
    /// Valid matching response parsed.
    Done,
    /// Fatal error or cancellation.
    Failed,
}

/// A single request/response exchange on one characteristic.
///
/// The transaction borrows its body items; it owns no transport. Run it
/// with [`Transaction::run`], which resolves to the validated response
/// body (empty for status-only responses).
#[derive(Debug)]
pub struct Transaction<'a> {
    header: RequestHeader,
    body: &'a [TlvItem],
    config: TransactionConfig,
    state: TransactionState,
}

impl<'a> Transaction<'a> {
    /// Create a transaction in [`TransactionState::Idle`].
    #[must_use]
    pub fn new(header: RequestHeader, body: &'a [TlvItem], config: TransactionConfig) -> Self {
        Self { header, body, config, state: TransactionState::Idle }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Header of the originating request.
    #[must_use]
    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    /// Drive the transaction to completion over `chr`.
    ///
    /// Writes every request fragment in order, reads the response (issuing
    /// further reads while the peripheral continues a fragmented body) and
    /// validates control field, transaction id, status and body length.
    ///
    /// # Errors
    ///
    /// - `HapError::Transport` on any GATT failure (the caller's
    ///   supervisor retries the whole transaction under a fresh id)
    /// - `HapError::Cancelled` when the token trips at a suspension point
    /// - `HapError::Malformed` / `TransactionMismatch` / `Status` per the
    ///   validation ladder
    /// - `HapError::Unsupported` when run on a finished transaction
    pub async fn run<C: GattCharacteristic>(
        &mut self,
        chr: &C,
        cancel: &CancelToken,
    ) -> Result<Bytes, HapError> {
        if self.state != TransactionState::Idle {
            return Err(HapError::Unsupported("transaction already driven"));
        }

        self.state = TransactionState::Sending;
        let frames = fragment_request(&self.header, self.body, self.config.max_frame);
        tracing::debug!(
            op = ?self.header.op_code(),
            tid = self.header.tid(),
            frames = frames.len(),
            "sending request"
        );

        for frame in &frames {
            if let Err(error) = cancel.check() {
                return Err(self.fail(error));
            }
            if let Err(error) = chr.write_value(frame, true).await {
                return Err(self.fail(error.into()));
            }
        }

        self.state = TransactionState::AwaitingResponse;
        if let Err(error) = cancel.check() {
            return Err(self.fail(error));
        }
        let first = match chr.read_value().await {
            Ok(bytes) => bytes,
            Err(error) => return Err(self.fail(error.into())),
        };

        self.state = TransactionState::Parsing;
        match self.collect_response(chr, cancel, Bytes::from(first)).await {
            Ok(body) => {
                self.state = TransactionState::Done;
                tracing::debug!(tid = self.header.tid(), body_len = body.len(), "response parsed");
                Ok(body)
            },
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Validate the first response PDU and reassemble a fragmented body.
    ///
    /// The first PDU's 2-byte body length declares the total logical body
    /// length; continuation PDUs carry `[control, tid]` followed by raw
    /// body bytes until the total is reached.
    async fn collect_response<C: GattCharacteristic>(
        &self,
        chr: &C,
        cancel: &CancelToken,
        first: Bytes,
    ) -> Result<Bytes, HapError> {
        let header = ResponseHeader::decode(&first)
            .map_err(|source| HapError::Malformed { source, bytes: first.clone() })?;

        let expected_control = self.header.expected_response_control();
        if header.is_continuation() {
            return Err(HapError::Malformed {
                source: ProtocolError::UnexpectedContinuation,
                bytes: first,
            });
        }
        if header.control_field() != expected_control {
            return Err(HapError::Malformed {
                source: ProtocolError::UnexpectedControlField {
                    expected: expected_control,
                    actual: header.control_field(),
                },
                bytes: first,
            });
        }
        if header.tid() != self.header.tid() {
            return Err(HapError::TransactionMismatch {
                expected: self.header.tid(),
                actual: header.tid(),
                bytes: first,
            });
        }

        let status =
            header.status().map_err(|source| HapError::Malformed { source, bytes: first.clone() })?;
        if !status.is_success() {
            return Err(HapError::Status(status));
        }

        if first.len() == ResponseHeader::SIZE {
            return Ok(Bytes::new());
        }
        if first.len() < ResponseHeader::SIZE + 2 {
            return Err(HapError::Malformed {
                source: ProtocolError::HeaderTooShort {
                    expected: ResponseHeader::SIZE + 2,
                    actual: first.len(),
                },
                bytes: first,
            });
        }

        let declared = u16::from_le_bytes([first[3], first[4]]) as usize;
        let mut body = BytesMut::from(&first[ResponseHeader::SIZE + 2..]);
        if body.len() > declared {
            return Err(HapError::Malformed {
                source: ProtocolError::BodyLengthMismatch { declared, actual: body.len() },
                bytes: first,
            });
        }

        while body.len() < declared {
            cancel.check()?;
            let next = Bytes::from(chr.read_value().await?);

            if next.len() < RequestHeader::CONTINUATION_SIZE {
                return Err(HapError::Malformed {
                    source: ProtocolError::HeaderTooShort {
                        expected: RequestHeader::CONTINUATION_SIZE,
                        actual: next.len(),
                    },
                    bytes: next,
                });
            }

            let continuation_control = expected_control | CONTROL_CONTINUATION;
            if next[0] != continuation_control {
                return Err(HapError::Malformed {
                    source: ProtocolError::UnexpectedControlField {
                        expected: continuation_control,
                        actual: next[0],
                    },
                    bytes: next,
                });
            }
            if next[1] != self.header.tid() {
                return Err(HapError::TransactionMismatch {
                    expected: self.header.tid(),
                    actual: next[1],
                    bytes: next,
                });
            }

            let payload = &next[RequestHeader::CONTINUATION_SIZE..];
            if payload.is_empty() {
                return Err(HapError::Malformed {
                    source: ProtocolError::EmptyContinuation,
                    bytes: next,
                });
            }
            if body.len() + payload.len() > declared {
                return Err(HapError::Malformed {
                    source: ProtocolError::BodyLengthMismatch {
                        declared,
                        actual: body.len() + payload.len(),
                    },
                    bytes: next,
                });
            }

            body.extend_from_slice(payload);
        }

        Ok(body.freeze())
    }

    /// Record a terminal failure and hand the error back.
    fn fail(&mut self, error: HapError) -> HapError {
        self.state = TransactionState::Failed;
        error
    }
}
