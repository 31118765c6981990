//! GATT transport interface.
//!
//! The core never owns a Bluetooth stack. Scanning, connection and
//! characteristic discovery happen elsewhere; the engine consumes these
//! two traits and nothing more. Production code backs them with a real
//! BLE stack, tests with scripted fakes.

use std::future::Future;

use thiserror::Error;

/// Errors surfaced by the GATT transport.
///
/// All of these are transient from the protocol's point of view: the
/// supervisor reconnects and retries the whole transaction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link to the peripheral dropped.
    #[error("link disconnected: {0}")]
    Disconnected(String),

    /// A read or write failed at the GATT layer.
    #[error("gatt i/o error: {0}")]
    Io(String),

    /// The characteristic has no descriptor with the given UUID.
    #[error("descriptor {0:#034x} not found")]
    DescriptorNotFound(u128),
}

/// One GATT characteristic on a connected peripheral.
pub trait GattCharacteristic: Send + Sync {
    /// Write `bytes` to the characteristic, waiting for the peripheral's
    /// acknowledgement when `with_response` is set.
    fn write_value(
        &self,
        bytes: &[u8],
        with_response: bool,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read the characteristic's current value.
    fn read_value(&self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Read a descriptor of this characteristic by 128-bit UUID.
    fn read_descriptor(
        &self,
        uuid: u128,
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Handle on the peripheral that owns the GATT link.
pub trait GattPeripheral: Send + Sync {
    /// Re-establish the GATT link after a drop.
    ///
    /// Only the supervisor calls this, and concurrent calls are coalesced
    /// through [`crate::retry::ReconnectGate`].
    fn reconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}
