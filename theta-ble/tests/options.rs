mod common;

use theta_ble::mock::MockPeripheral;
use theta_ble::proto::{
    AccessPoint, CameraPower, CaptureMode, NetworkType, OptionName, OptionValue,
    ThetaCharacteristic, ThetaOptions, WlanSecurity,
};
use theta_ble::{Error, ErrorKind};

use common::connected;

#[tokio::test]
async fn get_options_keeps_only_requested_fields() {
    let (device, peripheral) = connected(
        MockPeripheral::new().with_all_services().with_value(
            ThetaCharacteristic::Options,
            r#"{"captureMode":"_newMode","networkType":"CL","ssid":"office"}"#,
        ),
    )
    .await;
    let control = device.camera_control_v2().unwrap();

    let options = control
        .get_options(&[OptionName::CaptureMode, OptionName::NetworkType])
        .await
        .unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::Options),
        vec![br#"["captureMode","networkType"]"#.to_vec()]
    );
    // present but unrecognised is distinct from absent
    assert_eq!(options.capture_mode, Some(CaptureMode::Unknown));
    assert_eq!(
        options.get_value(OptionName::NetworkType),
        Some(OptionValue::NetworkType(NetworkType::Client))
    );
    assert_eq!(options.ssid, None);
    assert!(!options.contains(OptionName::CameraPower));
}

#[tokio::test]
async fn get_options_by_string_passes_unknown_keys_through() {
    let (device, peripheral) = connected(
        MockPeripheral::new().with_all_services().with_value(
            ThetaCharacteristic::Options,
            r#"{"ssid":"office","_vendorOption":1}"#,
        ),
    )
    .await;
    let control = device.camera_control_v2().unwrap();

    let options = control
        .get_options_by_string(&["ssid", "_vendorOption"])
        .await
        .unwrap();
    assert_eq!(options.ssid.as_deref(), Some("office"));
    assert_eq!(options.names(), vec![OptionName::Ssid]);
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::Options),
        vec![br#"["ssid","_vendorOption"]"#.to_vec()]
    );
}

#[tokio::test]
async fn set_options_writes_only_present_fields() {
    let (device, peripheral) = connected(MockPeripheral::new().with_all_services()).await;
    let control = device.camera_control_v2().unwrap();

    let mut options = ThetaOptions::new();
    options
        .set_value(OptionName::CameraPower, OptionValue::CameraPower(CameraPower::Sleep))
        .unwrap();
    control.set_options(&options).await.unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::SetOptions),
        vec![br#"{"cameraPower":"sleep"}"#.to_vec()]
    );

    let err = control.set_options(&ThetaOptions::new()).await.unwrap_err();
    assert!(matches!(err, Error::MissingArgument("options")));
    let err = control.get_options(&[]).await.unwrap_err();
    assert!(matches!(err, Error::MissingArgument("names")));

    options.camera_power = Some(CameraPower::Unknown);
    let err = control.set_options(&options).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialization);
    assert_eq!(peripheral.writes_to(ThetaCharacteristic::SetOptions).len(), 1);
}

#[tokio::test]
async fn access_point_requires_credentials() {
    let (device, peripheral) = connected(MockPeripheral::new().with_all_services()).await;
    let wlan = device.wlan_control_v2().unwrap();

    let err = wlan
        .set_access_point(&AccessPoint::new("", WlanSecurity::None))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingArgument("ssid")));

    let err = wlan
        .set_access_point(&AccessPoint::new("office", WlanSecurity::WpaWpa2Psk))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingArgument("password")));
    assert!(peripheral.writes().is_empty());

    let access_point = AccessPoint::new("office", WlanSecurity::WpaWpa2Psk)
        .with_password("secret")
        .with_static_ip("192.168.1.20", "255.255.255.0", "192.168.1.1");
    wlan.set_access_point(&access_point).await.unwrap();

    let written = peripheral.writes_to(ThetaCharacteristic::SetAccessPoint);
    let json: serde_json::Value = serde_json::from_slice(&written[0]).unwrap();
    assert_eq!(json["ssid"], "office");
    assert_eq!(json["ipAddressAllocation"], "static");
}

#[tokio::test]
async fn network_type_round_trip() {
    let (device, peripheral) = connected(
        MockPeripheral::new()
            .with_all_services()
            .with_value(ThetaCharacteristic::NetworkType, vec![1]),
    )
    .await;
    let wlan = device.wlan_control_v2().unwrap();

    assert_eq!(wlan.network_type().await.unwrap(), NetworkType::Client);
    wlan.set_network_type(NetworkType::Direct).await.unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::NetworkType),
        vec![vec![0]]
    );
    assert!(wlan.set_network_type(NetworkType::Scan).await.is_err());
}

#[tokio::test]
async fn command_writes() {
    let (device, peripheral) = connected(MockPeripheral::new().with_all_services()).await;

    device.camera_control_v2().unwrap().release_shutter().await.unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::ReleaseShutter),
        vec![vec![0x01]]
    );

    let bluetooth = device.bluetooth_control().unwrap();
    bluetooth
        .connect_peripheral_device("AA:BB:CC:DD:EE:FF")
        .await
        .unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::ConnectPeripheralDevice),
        vec![b"AA:BB:CC:DD:EE:FF".to_vec()]
    );
    let err = bluetooth.delete_peripheral_device("").await.unwrap_err();
    assert!(matches!(err, Error::MissingArgument("mac_address")));
    assert!(peripheral.writes_to(ThetaCharacteristic::DeletePeripheralDevice).is_empty());
}
