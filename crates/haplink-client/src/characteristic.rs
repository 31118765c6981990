//! Characteristic façade.
//!
//! One [`HapCharacteristic`] per GATT characteristic. The instance id and
//! the parsed signature are read lazily on first use and cached; the
//! signature's declared format becomes the converter for every later
//! value read and write response.

use std::sync::Arc;

use bytes::Bytes;
use haplink_core::{
    CancelToken, Environment, GattCharacteristic, GattPeripheral, HapError, RetryPolicy,
    Supervisor, Transaction, TransactionConfig,
};
use haplink_proto::{
    CharacteristicDescriptor, HapParam, OpCode, ProtocolError, RequestHeader, TlvItem,
    parse_signature,
};

use crate::peripheral::LinkShared;

/// UUID of the HAP-defined descriptor carrying the 16-byte characteristic
/// instance id (dc46f0fe-81d2-4616-b5d9-6abdd796939a).
pub const CHARACTERISTIC_INSTANCE_ID_UUID: u128 = 0xdc46_f0fe_81d2_4616_b5d9_6abd_d796_939a;

/// Façade over one HAP characteristic.
///
/// Constructed via [`crate::HapPeripheral::characteristic`]. Transactions
/// on the same accessory serialize through the shared link mutex; retries
/// run under the configured [`RetryPolicy`] with reconnection between
/// attempts, and every attempt draws a fresh transaction id.
pub struct HapCharacteristic<C, P, E> {
    chr: C,
    shared: Arc<LinkShared<P, E>>,
    policy: RetryPolicy,
    config: TransactionConfig,
    cancel: CancelToken,
    cid: Option<[u8; 16]>,
    signature: Option<CharacteristicDescriptor>,
}

impl<C, P, E> HapCharacteristic<C, P, E>
where
    C: GattCharacteristic,
    P: GattPeripheral,
    E: Environment,
{
    pub(crate) fn new(chr: C, shared: Arc<LinkShared<P, E>>) -> Self {
        Self {
            chr,
            shared,
            policy: RetryPolicy::default(),
            config: TransactionConfig::default(),
            cancel: CancelToken::new(),
            cid: None,
            signature: None,
        }
    }

    /// Override the retry policy for this characteristic's operations.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Override the transaction config (smaller negotiated MTUs).
    #[must_use]
    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    /// Token that cancels this characteristic's in-flight operations.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// The cached signature, if one has been read.
    #[must_use]
    pub fn cached_signature(&self) -> Option<&CharacteristicDescriptor> {
        self.signature.as_ref()
    }

    /// The characteristic instance id, read from the HAP descriptor on
    /// first access and cached.
    pub async fn cid(&mut self) -> Result<[u8; 16], HapError> {
        if let Some(cid) = self.cid {
            return Ok(cid);
        }

        let raw = {
            let supervisor = self.supervisor();
            let chr = &self.chr;
            supervisor
                .run(&self.cancel, || async move {
                    chr.read_descriptor(CHARACTERISTIC_INSTANCE_ID_UUID)
                        .await
                        .map_err(HapError::from)
                })
                .await?
        };

        let cid = <[u8; 16]>::try_from(raw.as_slice()).map_err(|_| HapError::Malformed {
            source: ProtocolError::InstanceIdLength { actual: raw.len() },
            bytes: Bytes::from(raw.clone()),
        })?;

        self.cid = Some(cid);
        Ok(cid)
    }

    /// The parsed signature, read on first access and cached.
    ///
    /// The signature's declared format becomes the default converter for
    /// subsequent value reads and write responses.
    pub async fn signature(&mut self) -> Result<&CharacteristicDescriptor, HapError> {
        if self.signature.is_none() {
            let cid = self.cid().await?;
            let body = self.transact(cid, OpCode::CharacteristicSignatureRead, &[]).await?;
            let parsed = parse_signature(&body, None)
                .map_err(|source| HapError::Malformed { source, bytes: body.clone() })?;
            tracing::debug!(format = ?parsed.format, unit = ?parsed.unit, "signature cached");
            self.signature = Some(parsed);
        }
        self.signature.as_ref().ok_or(HapError::Unsupported("signature cache empty"))
    }

    /// Eagerly resolve the instance id and signature under `policy`.
    pub async fn setup(&mut self, policy: RetryPolicy) -> Result<(), HapError> {
        self.policy = policy;
        self.cid().await?;
        self.signature().await?;
        Ok(())
    }

    /// Read the characteristic's value.
    ///
    /// The response body decodes with the cached signature's format when
    /// one is known; otherwise values come back raw.
    pub async fn read(&mut self) -> Result<CharacteristicDescriptor, HapError> {
        let cid = self.cid().await?;
        let converter = self.signature.as_ref().and_then(CharacteristicDescriptor::converter);
        let body = self.transact(cid, OpCode::CharacteristicRead, &[]).await?;
        parse_signature(&body, converter)
            .map_err(|source| HapError::Malformed { source, bytes: body.clone() })
    }

    /// Write a TLV body to the characteristic.
    ///
    /// Returns whatever the peripheral put in the response body (often
    /// nothing), parsed like a value read.
    pub async fn write(&mut self, items: &[TlvItem]) -> Result<CharacteristicDescriptor, HapError> {
        let cid = self.cid().await?;
        let converter = self.signature.as_ref().and_then(CharacteristicDescriptor::converter);
        let body = self.transact(cid, OpCode::CharacteristicWrite, items).await?;
        parse_signature(&body, converter)
            .map_err(|source| HapError::Malformed { source, bytes: body.clone() })
    }

    /// Write raw value bytes as a single `Value` TLV.
    pub async fn write_value(
        &mut self,
        value: impl Into<Vec<u8>>,
    ) -> Result<CharacteristicDescriptor, HapError> {
        let items = [TlvItem::new(HapParam::Value.code(), value.into())];
        self.write(&items).await
    }

    /// Read the signature of a service by its instance id.
    ///
    /// Addressed at the service rather than this characteristic, so
    /// nothing is cached.
    pub async fn service_signature_read(
        &mut self,
        sid: [u8; 16],
    ) -> Result<CharacteristicDescriptor, HapError> {
        let body = self.transact(sid, OpCode::ServiceSignatureRead, &[]).await?;
        parse_signature(&body, None)
            .map_err(|source| HapError::Malformed { source, bytes: body.clone() })
    }

    /// Run one transaction under the supervisor, holding the accessory's
    /// link mutex for its duration. Every attempt draws a fresh tid.
    async fn transact(
        &self,
        cid_sid: [u8; 16],
        op_code: OpCode,
        items: &[TlvItem],
    ) -> Result<Bytes, HapError> {
        let supervisor = self.supervisor();
        let chr = &self.chr;
        let shared = &self.shared;
        let cancel = &self.cancel;
        let config = self.config;

        supervisor
            .run(cancel, move || async move {
                let tid = shared.env.transaction_id();
                let header = RequestHeader::new(cid_sid, op_code, tid);

                let _link = shared.link.lock().await;
                let mut transaction = Transaction::new(header, items, config);
                transaction.run(chr, cancel).await
            })
            .await
    }

    fn supervisor(&self) -> Supervisor<'_, P, E> {
        Supervisor::new(&self.shared.peripheral, &self.shared.gate, &self.shared.env, self.policy)
    }
}
