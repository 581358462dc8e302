//! `btleplug` backend for the transport seam

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral as PlatformPeripheral};
use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::transport::{Advertisement, NotificationStream, Peripheral, Transport, TransportError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Transport over the first Bluetooth adapter of the host
pub struct BtleplugTransport {
    _manager: Manager,
    adapter: Adapter,
}

impl BtleplugTransport {
    /// Open the default Bluetooth adapter
    pub async fn new() -> Result<Self, TransportError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters.into_iter().next().ok_or(TransportError::NoAdapter)?;
        Ok(Self {
            _manager: manager,
            adapter,
        })
    }

    async fn named_peripherals(&self) -> Result<Vec<BtleplugAdvertisement>, TransportError> {
        let mut found = Vec::new();
        for peripheral in self.adapter.peripherals().await? {
            let Some(props) = peripheral.properties().await? else {
                continue;
            };
            if let Some(name) = props.local_name {
                found.push(BtleplugAdvertisement { name, peripheral });
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl Transport for BtleplugTransport {
    async fn discover(
        &self,
        name: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<Arc<dyn Advertisement>>, TransportError> {
        info!(?name, ?timeout, "starting BLE scan");
        self.adapter.start_scan(ScanFilter::default()).await?;

        let deadline = Instant::now() + timeout;
        let result = loop {
            let expired = Instant::now() >= deadline;
            match (self.named_peripherals().await, name) {
                (Err(e), _) => break Err(e),
                (Ok(found), Some(target)) => {
                    if let Some(hit) = found.into_iter().find(|a| a.name == target) {
                        break Ok(vec![hit]);
                    }
                    if expired {
                        break Ok(Vec::new());
                    }
                }
                (Ok(found), None) if expired => break Ok(found),
                (Ok(_), None) => {}
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        };

        if let Err(error) = self.adapter.stop_scan().await {
            debug!(?error, "failed to stop scan cleanly");
        }

        let found = result?;
        info!(count = found.len(), "BLE scan finished");
        Ok(found
            .into_iter()
            .map(|a| Arc::new(a) as Arc<dyn Advertisement>)
            .collect())
    }
}

struct BtleplugAdvertisement {
    name: String,
    peripheral: PlatformPeripheral,
}

#[async_trait]
impl Advertisement for BtleplugAdvertisement {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.peripheral.address().to_string()
    }

    async fn peripheral(&self) -> Result<Arc<dyn Peripheral>, TransportError> {
        Ok(Arc::new(BtleplugPeripheral {
            inner: self.peripheral.clone(),
        }))
    }
}

struct BtleplugPeripheral {
    inner: PlatformPeripheral,
}

impl BtleplugPeripheral {
    fn characteristic(&self, uuid: Uuid) -> Result<Characteristic, TransportError> {
        self.inner
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(TransportError::CharacteristicNotFound(uuid))
    }
}

#[async_trait]
impl Peripheral for BtleplugPeripheral {
    async fn connect(&self) -> Result<(), TransportError> {
        if !self.inner.is_connected().await? {
            self.inner.connect().await?;
        }
        self.inner.discover_services().await?;
        debug!(
            services = self.inner.services().len(),
            "discovered GATT services"
        );
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.inner.disconnect().await?;
        Ok(())
    }

    async fn request_mtu(&self, mtu: u16) -> Result<u16, TransportError> {
        // the host stack negotiates the MTU during connect
        debug!(mtu, "MTU request left to the platform");
        Ok(mtu)
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        let c = self.characteristic(characteristic)?;
        Ok(self.inner.read(&c).await?)
    }

    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<(), TransportError> {
        let c = self.characteristic(characteristic)?;
        let write_type = if c.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };
        self.inner.write(&c, data, write_type).await?;
        Ok(())
    }

    async fn observe(&self, characteristic: Uuid) -> Result<NotificationStream, TransportError> {
        let c = self.characteristic(characteristic)?;
        self.inner.subscribe(&c).await?;
        let notifications = self.inner.notifications().await?;
        trace!(%characteristic, "subscribed");
        Ok(Box::pin(
            notifications
                .filter(move |n| futures::future::ready(n.uuid == characteristic))
                .map(|n| Ok(n.value)),
        ))
    }

    async fn unobserve(&self, characteristic: Uuid) -> Result<(), TransportError> {
        let c = self.characteristic(characteristic)?;
        self.inner.unsubscribe(&c).await?;
        Ok(())
    }

    fn supports_service(&self, service: Uuid) -> bool {
        self.inner.services().iter().any(|s| s.uuid == service)
    }

    fn supports_characteristic(&self, characteristic: Uuid) -> bool {
        self.inner
            .characteristics()
            .iter()
            .any(|c| c.uuid == characteristic)
    }
}
