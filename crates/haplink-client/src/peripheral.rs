//! Per-peripheral shared state.

use std::sync::Arc;

use haplink_core::{Environment, GattCharacteristic, GattPeripheral, ReconnectGate};
use tokio::sync::Mutex;

use crate::characteristic::HapCharacteristic;

/// State shared by every characteristic on one accessory.
///
/// All characteristics ride the same GATT link, so transactions must
/// serialize through one mutex, and reconnects must coalesce through one
/// gate.
pub(crate) struct LinkShared<P, E> {
    /// Transport handle reconnects go through.
    pub(crate) peripheral: P,
    /// Time/randomness source; transaction ids come from here.
    pub(crate) env: E,
    /// Serializes transactions across characteristics.
    pub(crate) link: Mutex<()>,
    /// Coalesces concurrent reconnect attempts.
    pub(crate) gate: ReconnectGate,
}

/// Handle on one HAP accessory.
///
/// Mints [`HapCharacteristic`] façades that share the accessory's link
/// state. Cloning is cheap and shares the same link.
pub struct HapPeripheral<P, E> {
    shared: Arc<LinkShared<P, E>>,
}

impl<P, E> Clone for HapPeripheral<P, E> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<P: GattPeripheral, E: Environment> HapPeripheral<P, E> {
    /// Wrap a transport peripheral handle.
    #[must_use]
    pub fn new(peripheral: P, env: E) -> Self {
        Self {
            shared: Arc::new(LinkShared {
                peripheral,
                env,
                link: Mutex::new(()),
                gate: ReconnectGate::new(),
            }),
        }
    }

    /// Façade over one of this accessory's characteristics.
    #[must_use]
    pub fn characteristic<C: GattCharacteristic>(&self, chr: C) -> HapCharacteristic<C, P, E> {
        HapCharacteristic::new(chr, Arc::clone(&self.shared))
    }
}
