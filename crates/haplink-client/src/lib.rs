//! HAP-BLE characteristic façade.
//!
//! Ties the codec, transaction engine and supervisor together per GATT
//! characteristic. A [`HapPeripheral`] owns the state every characteristic
//! on one accessory shares (the link mutex that serializes transactions
//! and the reconnect gate); a [`HapCharacteristic`] lazily resolves and
//! caches its instance id and parsed signature, then exposes typed
//! read/write operations.
//!
//! # Example flow
//!
//! A caller mints a façade from a transport characteristic handle, runs
//! [`HapCharacteristic::setup`] to resolve metadata under a retry policy,
//! and then issues [`HapCharacteristic::read`] /
//! [`HapCharacteristic::write`] calls. Values decode with the format the
//! signature declared.

#![forbid(unsafe_code)]

mod characteristic;
mod peripheral;

pub use characteristic::{CHARACTERISTIC_INSTANCE_ID_UUID, HapCharacteristic};
pub use haplink_core::{
    CancelToken, Environment, GattCharacteristic, GattPeripheral, HapError, RetryPolicy,
    SystemEnv, TransactionConfig, TransportError,
};
pub use haplink_proto::{
    CharacteristicDescriptor, HapFormat, HapUnit, HapValue, OpCode, TlvItem,
};
pub use peripheral::HapPeripheral;
