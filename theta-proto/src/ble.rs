//! BLE GATT registry for THETA cameras
//!
//! Every logical service and characteristic is bound to one transport UUID.
//! Characteristics belong to exactly one service. The tables are static and
//! are used both forward (to issue reads/writes) and in reverse (to classify
//! inbound notifications).

use std::fmt;

use uuid::Uuid;

/// Logical GATT service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThetaService {
    CameraInformation,
    CameraStatusCommand,
    ShootingControlCommand,
    CameraControlCommandV2,
    BluetoothControlCommand,
    WlanControlCommandV2,
}

/// Logical GATT characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThetaCharacteristic {
    // Camera information
    FirmwareRevision,
    ManufacturerName,
    ModelNumber,
    SerialNumber,
    WlanMacAddress,
    BluetoothMacAddress,

    // Camera status
    BatteryLevel,
    BatteryStatus,
    CameraPower,
    CommandErrorDescription,
    PluginControl,

    // Shooting control
    CaptureMode,
    TakePicture,
    FileFormat,
    RemainingPictures,
    RemainingSpace,

    // Camera control v2
    GetInfo,
    GetState,
    GetState2,
    StateNotify,
    Options,
    SetOptions,
    ReleaseShutter,

    // Bluetooth control
    AuthBluetoothDevice,
    ScanPeripheralDevice,
    ScannedPeripheralDevice,
    ConnectPeripheralDevice,
    DeletePeripheralDevice,

    // WLAN control v2
    NetworkType,
    ConnectedWifiInfo,
    ScanSsidStart,
    ScanSsidStop,
    ScannedSsid,
    SetAccessPoint,
    WlanPasswordState,
}

const SERVICES: &[ThetaService] = &[
    ThetaService::CameraInformation,
    ThetaService::CameraStatusCommand,
    ThetaService::ShootingControlCommand,
    ThetaService::CameraControlCommandV2,
    ThetaService::BluetoothControlCommand,
    ThetaService::WlanControlCommandV2,
];

const CHARACTERISTICS: &[ThetaCharacteristic] = {
    use ThetaCharacteristic as C;
    &[
        C::FirmwareRevision,
        C::ManufacturerName,
        C::ModelNumber,
        C::SerialNumber,
        C::WlanMacAddress,
        C::BluetoothMacAddress,

        C::BatteryLevel,
        C::BatteryStatus,
        C::CameraPower,
        C::CommandErrorDescription,
        C::PluginControl,

        C::CaptureMode,
        C::TakePicture,
        C::FileFormat,
        C::RemainingPictures,
        C::RemainingSpace,

        C::GetInfo,
        C::GetState,
        C::GetState2,
        C::StateNotify,
        C::Options,
        C::SetOptions,
        C::ReleaseShutter,

        C::AuthBluetoothDevice,
        C::ScanPeripheralDevice,
        C::ScannedPeripheralDevice,
        C::ConnectPeripheralDevice,
        C::DeletePeripheralDevice,

        C::NetworkType,
        C::ConnectedWifiInfo,
        C::ScanSsidStart,
        C::ScanSsidStop,
        C::ScannedSsid,
        C::SetAccessPoint,
        C::WlanPasswordState,
    ]
};

impl ThetaService {
    /// All services, in registry order
    pub fn all() -> impl Iterator<Item = ThetaService> {
        SERVICES.iter().copied()
    }

    pub fn uuid(self) -> Uuid {
        match self {
            Self::CameraInformation => Uuid::from_u128(0x9a5ed1c5_74cc_4c50_b5b6_66a48e7ccff1),
            Self::CameraStatusCommand => Uuid::from_u128(0x8af982b1_f1ff_4d49_83f0_a56db4c431a7),
            Self::ShootingControlCommand => Uuid::from_u128(0x1d0f3602_8dfb_4340_9045_513040dad991),
            Self::CameraControlCommandV2 => Uuid::from_u128(0xb6ac7a7e_8c01_4a52_b188_68d53df53ea2),
            Self::BluetoothControlCommand => {
                Uuid::from_u128(0x0f291746_0c80_4726_87a7_3c501fd3b4b6)
            }
            Self::WlanControlCommandV2 => Uuid::from_u128(0x3c6feeb6_f335_4f93_a4bb_495a926c7db5),
        }
    }

    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::all().find(|service| service.uuid() == uuid)
    }

    pub fn characteristics(self) -> impl Iterator<Item = ThetaCharacteristic> {
        ThetaCharacteristic::all().filter(move |c| c.service() == self)
    }
}

impl ThetaCharacteristic {
    pub fn all() -> impl Iterator<Item = ThetaCharacteristic> {
        CHARACTERISTICS.iter().copied()
    }

    pub fn uuid(self) -> Uuid {
        match self {
            Self::FirmwareRevision => Uuid::from_u128(0xb4eb8905_7411_40a6_a367_2834c2157ea7),
            Self::ManufacturerName => Uuid::from_u128(0xf5666a48_6a74_40ae_a817_3c9b3efb59a6),
            Self::ModelNumber => Uuid::from_u128(0x35fe6272_6aa5_44d9_88e1_f09427f51a71),
            Self::SerialNumber => Uuid::from_u128(0x0d2fc4d5_5cb3_4cde_b519_445e599957d8),
            Self::WlanMacAddress => Uuid::from_u128(0x2353b347_7694_48c2_a417_7bce6420e5e5),
            Self::BluetoothMacAddress => Uuid::from_u128(0x9084b5aa_9f3c_4775_afee_666b2f7bdd13),
            Self::BatteryLevel => Uuid::from_u128(0x875fc41d_4980_434c_a653_fd4a4d4410c4),
            Self::BatteryStatus => Uuid::from_u128(0x5de9ad31_d4b0_4f71_9c79_84f92567c8e2),
            Self::CameraPower => Uuid::from_u128(0xb58ce84c_0666_4de9_bec8_2d27b27b3211),
            Self::CommandErrorDescription => {
                Uuid::from_u128(0x6a3affe9_a8d5_4145_a7d4_415c9659bd6d)
            }
            Self::PluginControl => Uuid::from_u128(0x8367ec59_5e17_4169_b015_16a668592404),
            Self::CaptureMode => Uuid::from_u128(0x78009238_ac3d_4370_9b6f_c9ce2f4e3ca8),
            Self::TakePicture => Uuid::from_u128(0xfec1805c_8905_4477_b862_ba5e447528a5),
            Self::FileFormat => Uuid::from_u128(0xf1a80caf_03d8_42d2_b6ed_2c75de301bdc),
            Self::RemainingPictures => Uuid::from_u128(0x704d93d9_90bb_4fa5_9100_47729236447d),
            Self::RemainingSpace => Uuid::from_u128(0x64053efc_a294_45ec_a966_799bd87c8a36),
            Self::GetInfo => Uuid::from_u128(0xbefedb5e_4928_4c51_95ab_8c859d204aa8),
            Self::GetState => Uuid::from_u128(0xf2db4446_3a41_462a_9861_789bd628c1c5),
            Self::GetState2 => Uuid::from_u128(0x7a4a35d1_3b48_438e_8357_ceebf1ddacef),
            Self::StateNotify => Uuid::from_u128(0xf5eace43_dcad_4a21_896f_a077e926ae5f),
            Self::Options => Uuid::from_u128(0xd4fc84d9_140f_4f91_b75b_2c102d3851c7),
            Self::SetOptions => Uuid::from_u128(0x0c561bbc_b3eb_473c_a5d3_014613178f75),
            Self::ReleaseShutter => Uuid::from_u128(0x385a2b2b_375e_4218_9b3c_3f6b8b09b849),
            Self::AuthBluetoothDevice => Uuid::from_u128(0xebafb2f0_0e0f_40a2_a84f_e2f098dc13c3),
            Self::ScanPeripheralDevice => Uuid::from_u128(0x7357c43d_fe82_4722_9494_6aca9b3027ec),
            Self::ScannedPeripheralDevice => {
                Uuid::from_u128(0x8955d63a_ef09_45f9_b099_df939ada77df)
            }
            Self::ConnectPeripheralDevice => {
                Uuid::from_u128(0xb3dfaa02_dd31_4522_a73e_dff92a00b833)
            }
            Self::DeletePeripheralDevice => Uuid::from_u128(0x3304013d_c424_470c_bbe3_1e5e1b14808d),
            Self::NetworkType => Uuid::from_u128(0x329831db_261f_424b_9a3a_93c2656fa6ab),
            Self::ConnectedWifiInfo => Uuid::from_u128(0xad420959_fba1_45b5_9b74_5b56b7bfc8a1),
            Self::ScanSsidStart => Uuid::from_u128(0xef6ec417_8dc2_491b_a530_075feb4cd9aa),
            Self::ScanSsidStop => Uuid::from_u128(0xd2c6f548_a30c_492c_b026_91c4deb42458),
            Self::ScannedSsid => Uuid::from_u128(0x8e687f58_8127_450d_8911_fdbfb32d863b),
            Self::SetAccessPoint => Uuid::from_u128(0xa87b98c5_a112_4c56_b548_e3306541aee6),
            Self::WlanPasswordState => Uuid::from_u128(0x1fbe80ba_a080_4f90_a797_582dff7b7e47),
        }
    }

    /// Service this characteristic belongs to
    pub fn service(self) -> ThetaService {
        use ThetaService as S;
        match self {
            Self::FirmwareRevision
            | Self::ManufacturerName
            | Self::ModelNumber
            | Self::SerialNumber
            | Self::WlanMacAddress
            | Self::BluetoothMacAddress => S::CameraInformation,
            Self::BatteryLevel
            | Self::BatteryStatus
            | Self::CameraPower
            | Self::CommandErrorDescription
            | Self::PluginControl => S::CameraStatusCommand,
            Self::CaptureMode
            | Self::TakePicture
            | Self::FileFormat
            | Self::RemainingPictures
            | Self::RemainingSpace => S::ShootingControlCommand,
            Self::GetInfo
            | Self::GetState
            | Self::GetState2
            | Self::StateNotify
            | Self::Options
            | Self::SetOptions
            | Self::ReleaseShutter => S::CameraControlCommandV2,
            Self::AuthBluetoothDevice
            | Self::ScanPeripheralDevice
            | Self::ScannedPeripheralDevice
            | Self::ConnectPeripheralDevice
            | Self::DeletePeripheralDevice => S::BluetoothControlCommand,
            Self::NetworkType
            | Self::ConnectedWifiInfo
            | Self::ScanSsidStart
            | Self::ScanSsidStop
            | Self::ScannedSsid
            | Self::SetAccessPoint
            | Self::WlanPasswordState => S::WlanControlCommandV2,
        }
    }

    /// Classify an inbound UUID. Unknown UUIDs are not an error: newer
    /// firmware may expose characteristics this table does not know.
    pub fn from_uuid(uuid: Uuid) -> Option<Self> {
        Self::all().find(|c| c.uuid() == uuid)
    }
}

/// Characteristics of the service with the given transport UUID
pub fn characteristics_of(service_uuid: Uuid) -> Vec<ThetaCharacteristic> {
    match ThetaService::from_uuid(service_uuid) {
        Some(service) => service.characteristics().collect(),
        None => Vec::new(),
    }
}

/// Characteristics observed for the whole lifetime of a connection
pub const ALWAYS_ON_NOTIFICATIONS: &[ThetaCharacteristic] = &[
    ThetaCharacteristic::BatteryLevel,
    ThetaCharacteristic::BatteryStatus,
    ThetaCharacteristic::CameraPower,
    ThetaCharacteristic::CommandErrorDescription,
    ThetaCharacteristic::PluginControl,
    ThetaCharacteristic::StateNotify,
    ThetaCharacteristic::NetworkType,
    ThetaCharacteristic::ConnectedWifiInfo,
];

impl fmt::Display for ThetaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for ThetaCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// MTU requested right after connecting
pub const MTU: u16 = 517;

/// Delay after switching capture mode before the camera accepts a shot
pub const CAPTURE_MODE_SETTLE_MS: u64 = 1_000;

/// Take-picture command bytes
pub mod take_picture {
    /// Written to TakePicture to start a shot
    pub const START: u8 = 0x01;

    /// First notification byte once the shot has been stored
    pub const COMPLETED: u8 = 0x01;
}

/// Peripheral-device scan command bytes (ScanPeripheralDevice)
pub mod peripheral_scan {
    pub const START: u8 = 0x01;
    pub const STOP: u8 = 0x00;
}

/// SSID scan command bytes. Start carries the scan duration in seconds
/// as a little-endian u16.
pub mod ssid_scan {
    pub const STOP: u8 = 0x01;
}

/// Written to ReleaseShutter
pub const RELEASE_SHUTTER: u8 = 0x01;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn uuids_are_unique() {
        let mut seen = HashSet::new();
        for service in ThetaService::all() {
            assert!(seen.insert(service.uuid()), "duplicate {service}");
        }
        for c in ThetaCharacteristic::all() {
            assert!(seen.insert(c.uuid()), "duplicate {c}");
        }
    }

    #[test]
    fn every_characteristic_round_trips_through_its_uuid() {
        for c in ThetaCharacteristic::all() {
            assert_eq!(ThetaCharacteristic::from_uuid(c.uuid()), Some(c));
            assert!(c.service().characteristics().any(|x| x == c));
        }
        assert_eq!(ThetaCharacteristic::all().count(), 35);
    }

    #[test]
    fn every_characteristic_is_listed_under_one_service() {
        let total: usize = ThetaService::all().map(|s| s.characteristics().count()).sum();
        assert_eq!(total, ThetaCharacteristic::all().count());
        for service in ThetaService::all() {
            assert_eq!(ThetaService::from_uuid(service.uuid()), Some(service));
        }
    }

    #[test]
    fn unknown_uuid_is_ignored() {
        assert_eq!(ThetaCharacteristic::from_uuid(Uuid::nil()), None);
        assert!(characteristics_of(Uuid::nil()).is_empty());
    }

    #[test]
    fn characteristics_of_service_uuid() {
        let info = characteristics_of(ThetaService::CameraInformation.uuid());
        assert_eq!(info.len(), 6);
        assert_eq!(info[0], ThetaCharacteristic::FirmwareRevision);
        assert_eq!(
            ThetaCharacteristic::TakePicture.service(),
            ThetaService::ShootingControlCommand
        );
    }

    #[test]
    fn always_on_set_excludes_scan_characteristics() {
        assert!(!ALWAYS_ON_NOTIFICATIONS.contains(&ThetaCharacteristic::ScannedSsid));
        assert!(!ALWAYS_ON_NOTIFICATIONS.contains(&ThetaCharacteristic::ScannedPeripheralDevice));
        assert!(!ALWAYS_ON_NOTIFICATIONS.contains(&ThetaCharacteristic::TakePicture));
    }
}
