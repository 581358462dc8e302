//! Transport seam
//!
//! The session engine talks to the radio only through these traits. The
//! `btleplug` backend lives in [`crate::btle`]; tests use [`crate::mock`].

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error(transparent)]
    Btleplug(#[from] btleplug::Error),

    #[error("no Bluetooth adapter found")]
    NoAdapter,

    #[error("peripheral disconnected")]
    Disconnected,

    #[error("characteristic {0} not found")]
    CharacteristicNotFound(Uuid),

    #[error("{0}")]
    Other(String),
}

/// Raw characteristic values pushed by the peripheral, in delivery order
pub type NotificationStream =
    Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// Discovers advertising cameras
#[async_trait]
pub trait Transport: Send + Sync {
    /// Scan for advertisements. With `name`, stop as soon as a device with
    /// that exact local name shows up.
    async fn discover(
        &self,
        name: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<Arc<dyn Advertisement>>, TransportError>;
}

/// A device seen while scanning, not yet connected
#[async_trait]
pub trait Advertisement: Send + Sync {
    fn name(&self) -> String;

    fn address(&self) -> String;

    /// Acquire the peripheral handle used for connecting
    async fn peripheral(&self) -> Result<Arc<dyn Peripheral>, TransportError>;
}

/// GATT client operations on one peripheral
#[async_trait]
pub trait Peripheral: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Returns the MTU in effect afterwards
    async fn request_mtu(&self, mtu: u16) -> Result<u16, TransportError>;

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError>;

    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<(), TransportError>;

    /// Subscribe to value changes of `characteristic`
    async fn observe(&self, characteristic: Uuid) -> Result<NotificationStream, TransportError>;

    /// Best-effort unsubscribe
    async fn unobserve(&self, characteristic: Uuid) -> Result<(), TransportError>;

    fn supports_service(&self, service: Uuid) -> bool;

    fn supports_characteristic(&self, characteristic: Uuid) -> bool;
}
