//! In-memory transport for exercising the session engine without a radio

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use parking_lot::Mutex;
use theta_proto::{ThetaCharacteristic, ThetaService};
use tokio::sync::Notify;
use uuid::Uuid;

use crate::transport::{Advertisement, NotificationStream, Peripheral, Transport, TransportError};

/// Serves a fixed list of advertisements
#[derive(Default)]
pub struct MockTransport {
    advertisements: Vec<Arc<MockAdvertisement>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, name: &str, peripheral: Arc<MockPeripheral>) -> Self {
        let address = format!("00:00:00:00:00:{:02X}", self.advertisements.len());
        self.advertisements.push(Arc::new(MockAdvertisement {
            name: name.to_string(),
            address,
            peripheral,
            acquire_delay: Mutex::new(None),
        }));
        self
    }

    pub fn advertisement(&self, name: &str) -> Option<Arc<MockAdvertisement>> {
        self.advertisements.iter().find(|a| a.name == name).cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn discover(
        &self,
        name: Option<&str>,
        _timeout: Duration,
    ) -> Result<Vec<Arc<dyn Advertisement>>, TransportError> {
        Ok(self
            .advertisements
            .iter()
            .filter(|a| name.is_none_or(|n| a.name == n))
            .map(|a| a.clone() as Arc<dyn Advertisement>)
            .collect())
    }
}

pub struct MockAdvertisement {
    name: String,
    address: String,
    peripheral: Arc<MockPeripheral>,
    acquire_delay: Mutex<Option<Duration>>,
}

impl MockAdvertisement {
    pub fn new(name: &str, peripheral: Arc<MockPeripheral>) -> Self {
        Self {
            name: name.to_string(),
            address: "00:00:00:00:00:00".to_string(),
            peripheral,
            acquire_delay: Mutex::new(None),
        }
    }

    /// Make peripheral acquisition stall for `delay`
    pub fn set_acquire_delay(&self, delay: Duration) {
        *self.acquire_delay.lock() = Some(delay);
    }
}

#[async_trait]
impl Advertisement for MockAdvertisement {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn address(&self) -> String {
        self.address.clone()
    }

    async fn peripheral(&self) -> Result<Arc<dyn Peripheral>, TransportError> {
        let delay = *self.acquire_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.peripheral.clone())
    }
}

type Observer = UnboundedSender<Result<Vec<u8>, TransportError>>;

#[derive(Default)]
struct State {
    services: HashSet<Uuid>,
    characteristics: HashSet<Uuid>,
    values: HashMap<Uuid, Vec<u8>>,
    writes: Vec<(Uuid, Vec<u8>)>,
    observers: HashMap<Uuid, Vec<Observer>>,
    observe_calls: HashMap<Uuid, usize>,
    failing_writes: HashSet<Uuid>,
    connected: bool,
    connect_calls: usize,
    disconnect_calls: usize,
    connect_delay: Option<Duration>,
    disconnect_delay: Option<Duration>,
    fail_connect: bool,
}

/// Scriptable GATT peripheral
///
/// Reads return the stored value (empty when none was set). Writes are only
/// recorded. Observation streams stay open until they are unobserved or
/// their receiver is dropped, even across a disconnect, and unobserving
/// needs a connection.
#[derive(Default)]
pub struct MockPeripheral {
    state: Mutex<State>,
    written: Notify,
}

impl MockPeripheral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `service` with all of its characteristics
    pub fn with_service(self, service: ThetaService) -> Self {
        {
            let mut state = self.state.lock();
            state.services.insert(service.uuid());
            state
                .characteristics
                .extend(service.characteristics().map(|c| c.uuid()));
        }
        self
    }

    /// Expose every known service
    pub fn with_all_services(self) -> Self {
        ThetaService::all().fold(self, Self::with_service)
    }

    /// Hide a single characteristic of an exposed service
    pub fn without_characteristic(self, characteristic: ThetaCharacteristic) -> Self {
        self.state.lock().characteristics.remove(&characteristic.uuid());
        self
    }

    /// Expose the characteristics of `service` without advertising the
    /// service itself
    pub fn with_unlisted_service(self, service: ThetaService) -> Self {
        let uuid = service.uuid();
        let this = self.with_service(service);
        this.state.lock().services.remove(&uuid);
        this
    }

    pub fn with_value(
        self,
        characteristic: ThetaCharacteristic,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.set_value(characteristic, value);
        self
    }

    pub fn set_value(&self, characteristic: ThetaCharacteristic, value: impl Into<Vec<u8>>) {
        self.state
            .lock()
            .values
            .insert(characteristic.uuid(), value.into());
    }

    pub fn fail_writes_to(&self, characteristic: ThetaCharacteristic) {
        self.state.lock().failing_writes.insert(characteristic.uuid());
    }

    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().connect_delay = Some(delay);
    }

    /// Make `disconnect` hang for `delay` before it takes effect
    pub fn set_disconnect_delay(&self, delay: Duration) {
        self.state.lock().disconnect_delay = Some(delay);
    }

    pub fn set_fail_connect(&self, fail: bool) {
        self.state.lock().fail_connect = fail;
    }

    /// Push a value to every live observer. Returns how many received it.
    pub fn notify(&self, characteristic: ThetaCharacteristic, value: impl Into<Vec<u8>>) -> usize {
        let value = value.into();
        self.push(characteristic, || Ok(value.clone()))
    }

    pub fn notify_error(&self, characteristic: ThetaCharacteristic, message: &str) -> usize {
        self.push(characteristic, || Err(TransportError::Other(message.to_string())))
    }

    fn push(
        &self,
        characteristic: ThetaCharacteristic,
        item: impl Fn() -> Result<Vec<u8>, TransportError>,
    ) -> usize {
        let mut state = self.state.lock();
        let Some(observers) = state.observers.get_mut(&characteristic.uuid()) else {
            return 0;
        };
        observers.retain(|tx| tx.unbounded_send(item()).is_ok());
        observers.len()
    }

    pub fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.state.lock().writes.clone()
    }

    pub fn writes_to(&self, characteristic: ThetaCharacteristic) -> Vec<Vec<u8>> {
        let uuid = characteristic.uuid();
        self.state
            .lock()
            .writes
            .iter()
            .filter(|(u, _)| *u == uuid)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Wait until at least `count` writes to `characteristic` were recorded
    pub async fn wait_for_writes(&self, characteristic: ThetaCharacteristic, count: usize) {
        loop {
            let notified = self.written.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.writes_to(characteristic).len() >= count {
                return;
            }
            notified.await;
        }
    }

    pub fn observe_calls(&self, characteristic: ThetaCharacteristic) -> usize {
        self.state
            .lock()
            .observe_calls
            .get(&characteristic.uuid())
            .copied()
            .unwrap_or(0)
    }

    /// Open observation streams whose receiving end is still alive
    pub fn live_observers(&self, characteristic: ThetaCharacteristic) -> usize {
        self.state
            .lock()
            .observers
            .get(&characteristic.uuid())
            .map_or(0, |o| o.iter().filter(|tx| !tx.is_closed()).count())
    }

    pub fn total_live_observers(&self) -> usize {
        self.state
            .lock()
            .observers
            .values()
            .flatten()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.lock().disconnect_calls
    }

    fn check_characteristic(&self, uuid: Uuid) -> Result<(), TransportError> {
        let state = self.state.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        if !state.characteristics.contains(&uuid) {
            return Err(TransportError::CharacteristicNotFound(uuid));
        }
        Ok(())
    }
}

#[async_trait]
impl Peripheral for MockPeripheral {
    async fn connect(&self) -> Result<(), TransportError> {
        let (delay, fail) = {
            let mut state = self.state.lock();
            state.connect_calls += 1;
            (state.connect_delay, state.fail_connect)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(TransportError::Other("connection refused".into()));
        }
        self.state.lock().connected = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let delay = {
            let mut state = self.state.lock();
            state.disconnect_calls += 1;
            state.disconnect_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().connected = false;
        Ok(())
    }

    async fn request_mtu(&self, mtu: u16) -> Result<u16, TransportError> {
        Ok(mtu)
    }

    async fn read(&self, characteristic: Uuid) -> Result<Vec<u8>, TransportError> {
        self.check_characteristic(characteristic)?;
        Ok(self
            .state
            .lock()
            .values
            .get(&characteristic)
            .cloned()
            .unwrap_or_default())
    }

    async fn write(&self, characteristic: Uuid, data: &[u8]) -> Result<(), TransportError> {
        self.check_characteristic(characteristic)?;
        let failed = {
            let mut state = self.state.lock();
            state.writes.push((characteristic, data.to_vec()));
            state.failing_writes.contains(&characteristic)
        };
        self.written.notify_waiters();
        if failed {
            return Err(TransportError::Other("write rejected".into()));
        }
        Ok(())
    }

    async fn observe(&self, characteristic: Uuid) -> Result<NotificationStream, TransportError> {
        self.check_characteristic(characteristic)?;
        let (tx, rx) = unbounded();
        let mut state = self.state.lock();
        state.observers.entry(characteristic).or_default().push(tx);
        *state.observe_calls.entry(characteristic).or_default() += 1;
        Ok(Box::pin(rx))
    }

    async fn unobserve(&self, characteristic: Uuid) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(TransportError::Disconnected);
        }
        state.observers.remove(&characteristic);
        Ok(())
    }

    fn supports_service(&self, service: Uuid) -> bool {
        self.state.lock().services.contains(&service)
    }

    fn supports_characteristic(&self, characteristic: Uuid) -> bool {
        self.state.lock().characteristics.contains(&characteristic)
    }
}
