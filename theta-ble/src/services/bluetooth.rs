use std::sync::Arc;
use std::time::Duration;

use theta_proto::ble::peripheral_scan;
use theta_proto::{PeripheralDevice, ThetaCharacteristic};

use crate::error::{Error, Result};
use crate::link::Link;
use crate::scan::{CompletedCallback, ItemCallback, ScanCommands, Scanner};

fn mac_address(device: &PeripheralDevice) -> &str {
    &device.mac_address
}

/// Pairing of Bluetooth peripherals (remote shutters and the like)
pub struct BluetoothControl {
    link: Arc<Link>,
    scanner: Scanner<PeripheralDevice>,
}

impl BluetoothControl {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        let commands = ScanCommands {
            name: "peripheral",
            start: ThetaCharacteristic::ScanPeripheralDevice,
            stop: ThetaCharacteristic::ScanPeripheralDevice,
            stop_payload: &[peripheral_scan::STOP],
            items: ThetaCharacteristic::ScannedPeripheralDevice,
        };
        Self {
            scanner: Scanner::new(link.clone(), commands, mac_address),
            link,
        }
    }

    /// Scan for `timeout` and return every device seen, deduplicated by MAC
    /// address in first-seen order
    pub async fn scan_peripheral_device(&self, timeout: Duration) -> Result<Vec<PeripheralDevice>> {
        self.scanner
            .collect(timeout, &[peripheral_scan::START])
            .await
    }

    /// Streaming scan. `on_item` sees every update, `on_completed` runs once
    /// when the scan ends.
    pub async fn scan_peripheral_device_start(
        &self,
        timeout: Duration,
        on_item: ItemCallback<PeripheralDevice>,
        on_completed: CompletedCallback<PeripheralDevice>,
    ) -> Result<()> {
        self.scanner
            .start(timeout, &[peripheral_scan::START], on_item, on_completed)
            .await
    }

    pub async fn scan_peripheral_device_stop(&self) {
        self.scanner.stop().await;
    }

    pub async fn connect_peripheral_device(&self, mac_address: &str) -> Result<()> {
        self.write_mac(ThetaCharacteristic::ConnectPeripheralDevice, mac_address)
            .await
    }

    pub async fn delete_peripheral_device(&self, mac_address: &str) -> Result<()> {
        self.write_mac(ThetaCharacteristic::DeletePeripheralDevice, mac_address)
            .await
    }

    async fn write_mac(
        &self,
        characteristic: ThetaCharacteristic,
        mac_address: &str,
    ) -> Result<()> {
        if mac_address.is_empty() {
            return Err(Error::MissingArgument("mac_address"));
        }
        self.link.write(characteristic, mac_address).await
    }
}
