#![allow(dead_code)]

use std::sync::Arc;

use theta_ble::mock::{MockAdvertisement, MockPeripheral};
use theta_ble::{ThetaDevice, Timeout};

pub fn device(peripheral: &Arc<MockPeripheral>) -> ThetaDevice {
    ThetaDevice::new(
        Arc::new(MockAdvertisement::new("THETAYR10100001", peripheral.clone())),
        Timeout::default(),
    )
}

/// A connected session over `peripheral`
pub async fn connected(peripheral: MockPeripheral) -> (ThetaDevice, Arc<MockPeripheral>) {
    let peripheral = Arc::new(peripheral);
    let device = device(&peripheral);
    device.connect(None).await.unwrap();
    (device, peripheral)
}

pub fn peripheral_json(name: &str, mac: &str, pairing: bool) -> Vec<u8> {
    format!(
        r#"{{"deviceName":"{name}","macAddress":"{mac}","pairing":{pairing},"connected":false}}"#
    )
    .into_bytes()
}
