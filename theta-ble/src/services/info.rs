use std::sync::Arc;

use theta_proto::ThetaCharacteristic;

use crate::error::Result;
use crate::link::Link;

/// Camera identity strings (device information service)
pub struct CameraInformation {
    link: Arc<Link>,
}

impl CameraInformation {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        Self { link }
    }

    pub async fn firmware_revision(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::FirmwareRevision).await
    }

    pub async fn manufacturer_name(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::ManufacturerName).await
    }

    pub async fn model_number(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::ModelNumber).await
    }

    pub async fn serial_number(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::SerialNumber).await
    }

    pub async fn wlan_mac_address(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::WlanMacAddress).await
    }

    pub async fn bluetooth_mac_address(&self) -> Result<String> {
        self.link.read(ThetaCharacteristic::BluetoothMacAddress).await
    }
}
