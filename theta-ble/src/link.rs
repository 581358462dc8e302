//! Connection handle shared by the sub-services of one session

use std::sync::Arc;
use std::time::Duration;

use data_encoding::HEXLOWER;
use theta_proto::{BleDecode, BleEncode, ThetaCharacteristic};
use tokio::sync::watch;
use tracing::trace;

use crate::config::Timeout;
use crate::error::{Error, Feature, Operation, Result};
use crate::mux::{NotificationMultiplexer, SlotCallback};
use crate::transport::Peripheral;

/// Receives decoded notification values (or decode/transport failures)
pub type NotifyCallback<T> = Box<dyn Fn(Result<T>) + Send + Sync>;

/// Everything a sub-service needs to talk to the camera. Once the session
/// disconnects the link is closed and every operation fails with
/// [`Error::NotConnected`], even through stale sub-service handles.
pub(crate) struct Link {
    peripheral: Arc<dyn Peripheral>,
    mux: NotificationMultiplexer,
    timeout: Timeout,
    closed: watch::Sender<bool>,
}

impl Link {
    pub fn new(
        peripheral: Arc<dyn Peripheral>,
        mux: NotificationMultiplexer,
        timeout: Timeout,
    ) -> Self {
        Self {
            peripheral,
            mux,
            timeout,
            closed: watch::Sender::new(false),
        }
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn mux(&self) -> &NotificationMultiplexer {
        &self.mux
    }

    pub fn peripheral(&self) -> &Arc<dyn Peripheral> {
        &self.peripheral
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Resolves once the session owning this link has disconnected
    pub async fn closed(&self) {
        let mut rx = self.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn ensure_connected(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    pub fn supports(&self, characteristic: ThetaCharacteristic) -> bool {
        self.peripheral.supports_characteristic(characteristic.uuid())
    }

    fn check(&self, characteristic: ThetaCharacteristic) -> Result<()> {
        self.ensure_connected()?;
        if !self.supports(characteristic) {
            return Err(Error::Unsupported(Feature::Characteristic(characteristic)));
        }
        Ok(())
    }

    fn io_timeout(&self) -> Duration {
        self.timeout.connect
    }

    pub async fn read_raw(&self, characteristic: ThetaCharacteristic) -> Result<Vec<u8>> {
        self.check(characteristic)?;
        let read = self.peripheral.read(characteristic.uuid());
        let value = tokio::time::timeout(self.io_timeout(), read)
            .await
            .map_err(|_| Error::Timeout(Operation::Read(characteristic)))??;
        trace!(%characteristic, payload = %HEXLOWER.encode(&value), "read");
        if value.is_empty() {
            return Err(Error::EmptyResponse(characteristic));
        }
        Ok(value)
    }

    pub async fn read<T: BleDecode>(&self, characteristic: ThetaCharacteristic) -> Result<T> {
        let value = self.read_raw(characteristic).await?;
        Ok(T::decode(&value)?)
    }

    pub async fn write_raw(&self, characteristic: ThetaCharacteristic, data: &[u8]) -> Result<()> {
        self.check(characteristic)?;
        trace!(%characteristic, payload = %HEXLOWER.encode(data), "write");
        tokio::time::timeout(
            self.io_timeout(),
            self.peripheral.write(characteristic.uuid(), data),
        )
        .await
        .map_err(|_| Error::Timeout(Operation::Write(characteristic)))??;
        Ok(())
    }

    /// Encode first, so unrepresentable values never reach the transport
    pub async fn write<T: BleEncode + ?Sized>(
        &self,
        characteristic: ThetaCharacteristic,
        value: &T,
    ) -> Result<()> {
        let data = value.encode()?;
        self.write_raw(characteristic, &data).await
    }

    /// Install or clear the decoded callback of an always-on characteristic
    pub async fn set_notify<T>(
        &self,
        characteristic: ThetaCharacteristic,
        callback: Option<NotifyCallback<T>>,
    ) -> Result<()>
    where
        T: BleDecode + 'static,
    {
        self.ensure_connected()?;
        let slot = callback.map(|callback| {
            Box::new(move |raw: Result<Vec<u8>>| {
                callback(raw.and_then(|value| decode_notification(characteristic, &value)))
            }) as SlotCallback
        });
        self.mux.set_callback(characteristic, slot).await
    }
}

pub(crate) fn decode_notification<T: BleDecode>(
    characteristic: ThetaCharacteristic,
    value: &[u8],
) -> Result<T> {
    if value.is_empty() {
        return Err(Error::EmptyResponse(characteristic));
    }
    Ok(T::decode(value)?)
}
