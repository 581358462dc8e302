//! Session with one camera
//!
//! [`ThetaDevice`] drives the connection lifecycle:
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnecting -> Disconnected
//! ```
//!
//! Connecting acquires the peripheral, connects, negotiates the MTU, writes
//! the auth token (if any), opens the notification multiplexer and resolves
//! the sub-services the camera exposes. A failure at any step tears down
//! whatever was set up and leaves the device disconnected.

use std::fmt;
use std::sync::Arc;

use theta_proto::ble::MTU;
use theta_proto::{ALWAYS_ON_NOTIFICATIONS, ThetaCharacteristic, ThetaService};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Timeout;
use crate::error::{Error, Feature, Operation, Result};
use crate::link::Link;
use crate::mux::NotificationMultiplexer;
use crate::services::{
    BluetoothControl, CameraControlV2, CameraInformation, CameraStatus, FACTORIES,
    ShootingControl, SubService, WlanControlV2,
};
use crate::transport::{Advertisement, Peripheral};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Session {
    link: Arc<Link>,
    services: Vec<SubService>,
}

struct State {
    connection: ConnectionState,
    session: Option<Session>,
}

/// A discovered camera
pub struct ThetaDevice {
    advertisement: Arc<dyn Advertisement>,
    timeout: Timeout,
    auth_token: parking_lot::Mutex<Option<Uuid>>,
    lifecycle: tokio::sync::Mutex<()>,
    state: parking_lot::Mutex<State>,
}

impl ThetaDevice {
    pub fn new(advertisement: Arc<dyn Advertisement>, timeout: Timeout) -> Self {
        Self {
            advertisement,
            timeout,
            auth_token: parking_lot::Mutex::new(None),
            lifecycle: tokio::sync::Mutex::new(()),
            state: parking_lot::Mutex::new(State {
                connection: ConnectionState::Disconnected,
                session: None,
            }),
        }
    }

    pub fn name(&self) -> String {
        self.advertisement.name()
    }

    pub fn address(&self) -> String {
        self.advertisement.address()
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    pub fn auth_token(&self) -> Option<Uuid> {
        *self.auth_token.lock()
    }

    /// The first token wins. It stays valid across reconnects until the
    /// camera is power cycled.
    pub fn set_auth_token(&self, token: Uuid) {
        let mut current = self.auth_token.lock();
        match *current {
            None => *current = Some(token),
            Some(existing) if existing != token => {
                warn!(device = %self.name(), "auth token already set, keeping the first one");
            }
            Some(_) => {}
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().connection
    }

    pub fn is_connected(&self) -> bool {
        self.state.lock().session.is_some()
    }

    /// Whether the connected camera exposes `service`
    pub fn supports(&self, service: ThetaService) -> bool {
        self.services().contains(&service)
    }

    /// Services resolved at connect time, empty while disconnected
    pub fn services(&self) -> Vec<ThetaService> {
        self.state
            .lock()
            .session
            .as_ref()
            .map(|s| s.services.iter().map(SubService::service).collect())
            .unwrap_or_default()
    }

    /// Connect, replacing any previous session
    pub async fn connect(&self, auth_token: Option<Uuid>) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        if let Some(token) = auth_token {
            self.set_auth_token(token);
        }
        if let Err(error) = self.teardown().await {
            debug!(%error, "previous session did not close cleanly");
        }

        self.set_connection(ConnectionState::Connecting);
        info!(device = %self.name(), "connecting");
        match self.establish().await {
            Ok(session) => {
                let services: Vec<_> = session.services.iter().map(SubService::service).collect();
                let mut state = self.state.lock();
                state.session = Some(session);
                state.connection = ConnectionState::Connected;
                info!(device = %self.name(), ?services, "connected");
                Ok(())
            }
            Err(error) => {
                self.set_connection(ConnectionState::Disconnected);
                warn!(device = %self.name(), %error, "connect failed");
                Err(error)
            }
        }
    }

    /// Disconnect and drop every sub-service. Disconnecting an idle device
    /// is a no-op.
    pub async fn disconnect(&self) -> Result<()> {
        let _lifecycle = self.lifecycle.lock().await;
        self.teardown().await
    }

    pub fn camera_information(&self) -> Result<Arc<CameraInformation>> {
        self.resolve(ThetaService::CameraInformation, |s| match s {
            SubService::CameraInformation(service) => Some(service.clone()),
            _ => None,
        })
    }

    pub fn camera_status(&self) -> Result<Arc<CameraStatus>> {
        self.resolve(ThetaService::CameraStatusCommand, |s| match s {
            SubService::CameraStatus(service) => Some(service.clone()),
            _ => None,
        })
    }

    pub fn shooting_control(&self) -> Result<Arc<ShootingControl>> {
        self.resolve(ThetaService::ShootingControlCommand, |s| match s {
            SubService::ShootingControl(service) => Some(service.clone()),
            _ => None,
        })
    }

    pub fn camera_control_v2(&self) -> Result<Arc<CameraControlV2>> {
        self.resolve(ThetaService::CameraControlCommandV2, |s| match s {
            SubService::CameraControlV2(service) => Some(service.clone()),
            _ => None,
        })
    }

    pub fn bluetooth_control(&self) -> Result<Arc<BluetoothControl>> {
        self.resolve(ThetaService::BluetoothControlCommand, |s| match s {
            SubService::BluetoothControl(service) => Some(service.clone()),
            _ => None,
        })
    }

    pub fn wlan_control_v2(&self) -> Result<Arc<WlanControlV2>> {
        self.resolve(ThetaService::WlanControlCommandV2, |s| match s {
            SubService::WlanControlV2(service) => Some(service.clone()),
            _ => None,
        })
    }

    fn resolve<T>(
        &self,
        service: ThetaService,
        pick: impl Fn(&SubService) -> Option<Arc<T>>,
    ) -> Result<Arc<T>> {
        let state = self.state.lock();
        let session = state.session.as_ref().ok_or(Error::NotConnected)?;
        session
            .services
            .iter()
            .find_map(pick)
            .ok_or(Error::Unsupported(Feature::Service(service)))
    }

    fn set_connection(&self, connection: ConnectionState) {
        self.state.lock().connection = connection;
    }

    async fn establish(&self) -> Result<Session> {
        let acquire = self.advertisement.peripheral();
        let peripheral = tokio::time::timeout(self.timeout.peripheral, acquire)
            .await
            .map_err(|_| Error::Timeout(Operation::AcquirePeripheral))??;

        match self.open(peripheral.clone()).await {
            Ok(session) => Ok(session),
            Err(error) => {
                let _ = tokio::time::timeout(self.timeout.connect, peripheral.disconnect()).await;
                Err(error)
            }
        }
    }

    async fn open(&self, peripheral: Arc<dyn Peripheral>) -> Result<Session> {
        let limit = self.timeout.connect;
        tokio::time::timeout(limit, peripheral.connect())
            .await
            .map_err(|_| Error::Timeout(Operation::Connect))??;

        let mtu = tokio::time::timeout(limit, peripheral.request_mtu(MTU))
            .await
            .map_err(|_| Error::Timeout(Operation::RequestMtu))??;
        debug!(mtu, "MTU negotiated");

        if let Some(token) = self.auth_token() {
            authenticate(peripheral.as_ref(), token, limit).await?;
        }

        let always_on = ALWAYS_ON_NOTIFICATIONS;
        let mux = NotificationMultiplexer::open(peripheral.clone(), limit, always_on).await?;
        let link = Arc::new(Link::new(peripheral.clone(), mux, self.timeout));

        let services: Vec<SubService> = FACTORIES
            .iter()
            .filter(|(service, _)| peripheral.supports_service(service.uuid()))
            .map(|(_, factory)| factory(link.clone()))
            .collect();
        if services.is_empty() {
            link.close();
            link.mux().release().await;
            return Err(Error::Unsupported(Feature::AnyService));
        }
        Ok(Session { link, services })
    }

    async fn teardown(&self) -> Result<()> {
        let session = {
            let mut state = self.state.lock();
            let session = state.session.take();
            state.connection = if session.is_some() {
                ConnectionState::Disconnecting
            } else {
                ConnectionState::Disconnected
            };
            session
        };
        let Some(session) = session else {
            return Ok(());
        };

        session.link.close();
        let result = match tokio::time::timeout(
            self.timeout.connect,
            session.link.peripheral().disconnect(),
        )
        .await
        {
            Ok(result) => result.map_err(Error::from),
            Err(_) => Err(Error::Timeout(Operation::Disconnect)),
        };
        let subscriptions = session.link.mux().active_subscriptions().await;
        session.link.mux().release().await;
        debug!(subscriptions, "notifications released");
        self.set_connection(ConnectionState::Disconnected);
        info!(device = %self.name(), "disconnected");
        result
    }
}

impl Drop for ThetaDevice {
    fn drop(&mut self) {
        if let Some(session) = self.state.get_mut().session.take() {
            session.link.close();
        }
    }
}

async fn authenticate(
    peripheral: &dyn Peripheral,
    token: Uuid,
    limit: std::time::Duration,
) -> Result<()> {
    let characteristic = ThetaCharacteristic::AuthBluetoothDevice;
    if !peripheral.supports_characteristic(characteristic.uuid()) {
        debug!("camera has no auth characteristic, skipping token");
        return Ok(());
    }
    let token = token.hyphenated().to_string();
    tokio::time::timeout(limit, peripheral.write(characteristic.uuid(), token.as_bytes()))
        .await
        .map_err(|_| Error::Timeout(Operation::Write(characteristic)))??;
    debug!("auth token written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAdvertisement, MockPeripheral};
    use std::time::Duration;

    fn device(peripheral: Arc<MockPeripheral>) -> ThetaDevice {
        ThetaDevice::new(
            Arc::new(MockAdvertisement::new("THETAYR10100001", peripheral)),
            Timeout::default(),
        )
    }

    #[tokio::test]
    async fn resolves_only_exposed_services() {
        let peripheral = Arc::new(
            MockPeripheral::new()
                .with_service(ThetaService::CameraInformation)
                .with_service(ThetaService::CameraStatusCommand),
        );
        let device = device(peripheral);
        assert!(matches!(device.camera_information(), Err(Error::NotConnected)));

        device.connect(None).await.unwrap();
        assert_eq!(device.state(), ConnectionState::Connected);
        assert_eq!(
            device.services(),
            vec![ThetaService::CameraInformation, ThetaService::CameraStatusCommand]
        );
        assert!(device.camera_status().is_ok());
        assert!(matches!(
            device.wlan_control_v2(),
            Err(Error::Unsupported(Feature::Service(ThetaService::WlanControlCommandV2)))
        ));
    }

    #[tokio::test]
    async fn camera_without_known_services_is_rejected() {
        let peripheral = Arc::new(MockPeripheral::new());
        let device = device(peripheral.clone());
        let err = device.connect(None).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(Feature::AnyService)));
        assert_eq!(device.state(), ConnectionState::Disconnected);
        assert!(!peripheral.is_connected());
    }

    #[tokio::test]
    async fn token_is_written_as_uuid_string() {
        let token = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let peripheral = Arc::new(MockPeripheral::new().with_all_services());
        let device = device(peripheral.clone());
        device.connect(Some(token)).await.unwrap();

        let writes = peripheral.writes_to(ThetaCharacteristic::AuthBluetoothDevice);
        assert_eq!(writes, vec![b"01234567-89ab-cdef-0123-456789abcdef".to_vec()]);

        device.set_auth_token(Uuid::nil());
        assert_eq!(device.auth_token(), Some(token));
    }

    #[tokio::test(start_paused = true)]
    async fn peripheral_acquire_is_time_boxed() {
        let peripheral = Arc::new(MockPeripheral::new().with_all_services());
        let advertisement = Arc::new(MockAdvertisement::new("THETA", peripheral));
        advertisement.set_acquire_delay(Duration::from_secs(5));
        let device = ThetaDevice::new(advertisement, Timeout::default());

        let err = device.connect(None).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(Operation::AcquirePeripheral)));
        assert_eq!(device.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_when_idle_is_a_no_op() {
        let device = device(Arc::new(MockPeripheral::new().with_all_services()));
        device.disconnect().await.unwrap();
        assert_eq!(device.state(), ConnectionState::Disconnected);
    }
}
