use std::sync::Arc;
use std::time::Duration;

use theta_proto::ble::ssid_scan;
use theta_proto::codec::encode_u16;
use theta_proto::{
    AccessPoint, ConnectedWifiInfo, NetworkType, ThetaCharacteristic, WlanPasswordState,
    WlanSecurity,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::link::{Link, NotifyCallback};
use crate::scan::{CompletedCallback, ItemCallback, ScanCommands, Scanner};

/// Wi-Fi mode, client-mode access points and SSID scanning
pub struct WlanControlV2 {
    link: Arc<Link>,
    scanner: Scanner<String>,
}

impl WlanControlV2 {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        let commands = ScanCommands {
            name: "ssid",
            start: ThetaCharacteristic::ScanSsidStart,
            stop: ThetaCharacteristic::ScanSsidStop,
            stop_payload: &[ssid_scan::STOP],
            items: ThetaCharacteristic::ScannedSsid,
        };
        Self {
            scanner: Scanner::new(link.clone(), commands, String::as_str),
            link,
        }
    }

    pub async fn network_type(&self) -> Result<NetworkType> {
        self.link.read(ThetaCharacteristic::NetworkType).await
    }

    pub async fn set_network_type(&self, network_type: NetworkType) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::NetworkType, &network_type)
            .await
    }

    pub async fn set_network_type_notify(
        &self,
        callback: Option<NotifyCallback<NetworkType>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::NetworkType, callback)
            .await
    }

    pub async fn connected_wifi_info(&self) -> Result<ConnectedWifiInfo> {
        self.link.read(ThetaCharacteristic::ConnectedWifiInfo).await
    }

    pub async fn set_connected_wifi_info_notify(
        &self,
        callback: Option<NotifyCallback<ConnectedWifiInfo>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::ConnectedWifiInfo, callback)
            .await
    }

    /// Scan for `timeout` and return the SSIDs seen, in first-seen order
    pub async fn scan_ssid(&self, timeout: Duration) -> Result<Vec<String>> {
        let payload = scan_duration(timeout);
        self.scanner.collect(timeout, &payload).await
    }

    /// Streaming SSID scan. The camera is told to scan for `timeout` too.
    pub async fn scan_ssid_start(
        &self,
        timeout: Duration,
        on_item: ItemCallback<String>,
        on_completed: CompletedCallback<String>,
    ) -> Result<()> {
        let payload = scan_duration(timeout);
        self.scanner
            .start(timeout, &payload, on_item, on_completed)
            .await
    }

    pub async fn scan_ssid_stop(&self) {
        self.scanner.stop().await;
    }

    /// Register an access point for client mode
    pub async fn set_access_point(&self, access_point: &AccessPoint) -> Result<()> {
        if access_point.ssid.is_empty() {
            return Err(Error::MissingArgument("ssid"));
        }
        let has_password = access_point
            .password
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        if access_point.security != WlanSecurity::None && !has_password {
            return Err(Error::MissingArgument("password"));
        }
        debug!(ssid = %access_point.ssid, "setting access point");
        self.link
            .write(ThetaCharacteristic::SetAccessPoint, access_point)
            .await
    }

    pub async fn wlan_password_state(&self) -> Result<WlanPasswordState> {
        self.link.read(ThetaCharacteristic::WlanPasswordState).await
    }
}

/// Whole seconds, saturating at the largest value the camera accepts
fn scan_duration(timeout: Duration) -> [u8; 2] {
    let seconds = u16::try_from(timeout.as_secs()).unwrap_or(u16::MAX);
    encode_u16(seconds)
}
