//! THETA BLE protocol - registry data, value codec and wire types
//!
//! This crate has no I/O. It describes which services and characteristics a
//! THETA camera exposes, how characteristic values are laid out on the wire,
//! and the sparse camera options model used by the v2 command service.

pub mod ble;
pub mod codec;
mod error;
pub mod messages;
pub mod options;
pub mod values;

pub use ble::{ALWAYS_ON_NOTIFICATIONS, ThetaCharacteristic, ThetaService, characteristics_of};
pub use codec::{BleDecode, BleEncode};
pub use error::CodecError;
pub use messages::{
    AccessPoint, ConnectedWifiInfo, GpsInfo, IpAddressing, PeripheralDevice, Proxy, ThetaInfo,
    ThetaState, ThetaState2,
};
pub use options::{AccessInfo, OptionName, OptionValue, ThetaOptions};
pub use values::{
    CameraPower, CaptureMode, CaptureStatus, ChargingState, CommandErrorDescription, FileFormat,
    NetworkType, PluginControl, PluginPowerStatus, WlanAntennaConfig, WlanFrequency,
    WlanPasswordState, WlanSecurity,
};
