//! Camera options value model
//!
//! [`ThetaOptions`] is a sparse bag: a field that is `None` was not requested
//! (or is not known) and is omitted from the JSON wire form, so setting a bag
//! never touches options that are absent from it. A field that is present
//! may still hold a type-specific `Unknown` sentinel when the camera reported
//! a value this crate does not recognise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CodecError;
use crate::codec::{decode_json, encode_json};
use crate::values::{CameraPower, CaptureMode, NetworkType, WlanAntennaConfig, WlanFrequency};

/// Connection details of the current wireless link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessInfo {
    pub ssid: String,
    pub ip_address: String,
    pub subnet_mask: String,
    pub default_gateway: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<WlanFrequency>,
    /// dBm
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlan_signal_strength: Option<i32>,
    /// 0 to 4
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlan_signal_level: Option<u8>,
}

/// Logical option name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    NetworkType,
    CaptureMode,
    CameraPower,
    Ssid,
    Username,
    Password,
    DefaultWifiPassword,
    WlanAntennaConfig,
    WlanFrequency,
    AccessInfo,
}

impl OptionName {
    pub const ALL: [OptionName; 10] = [
        Self::NetworkType,
        Self::CaptureMode,
        Self::CameraPower,
        Self::Ssid,
        Self::Username,
        Self::Password,
        Self::DefaultWifiPassword,
        Self::WlanAntennaConfig,
        Self::WlanFrequency,
        Self::AccessInfo,
    ];

    /// Key used in the JSON wire form
    pub fn key(self) -> &'static str {
        match self {
            Self::NetworkType => "networkType",
            Self::CaptureMode => "captureMode",
            Self::CameraPower => "cameraPower",
            Self::Ssid => "ssid",
            Self::Username => "username",
            Self::Password => "password",
            Self::DefaultWifiPassword => "defaultWifiPassword",
            Self::WlanAntennaConfig => "wlanAntennaConfig",
            Self::WlanFrequency => "wlanFrequency",
            Self::AccessInfo => "accessInfo",
        }
    }

    /// Name of the value type bound to this option
    fn value_type(self) -> &'static str {
        match self {
            Self::NetworkType => "NetworkType",
            Self::CaptureMode => "CaptureMode",
            Self::CameraPower => "CameraPower",
            Self::Ssid | Self::Username | Self::Password | Self::DefaultWifiPassword => "text",
            Self::WlanAntennaConfig => "WlanAntennaConfig",
            Self::WlanFrequency => "WlanFrequency",
            Self::AccessInfo => "AccessInfo",
        }
    }
}

impl fmt::Display for OptionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for OptionName {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.key() == s)
            .ok_or_else(|| CodecError::UnknownString {
                type_name: "OptionName",
                value: s.to_string(),
            })
    }
}

/// Value of a single option, tagged with its type
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    NetworkType(NetworkType),
    CaptureMode(CaptureMode),
    CameraPower(CameraPower),
    Text(String),
    WlanAntennaConfig(WlanAntennaConfig),
    WlanFrequency(WlanFrequency),
    AccessInfo(AccessInfo),
}

/// Sparse set of camera options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_type: Option<NetworkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_mode: Option<CaptureMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_power: Option<CameraPower>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_wifi_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlan_antenna_config: Option<WlanAntennaConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlan_frequency: Option<WlanFrequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_info: Option<AccessInfo>,
}

impl ThetaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        OptionName::ALL.into_iter().all(|name| !self.contains(name))
    }

    pub fn contains(&self, name: OptionName) -> bool {
        match name {
            OptionName::NetworkType => self.network_type.is_some(),
            OptionName::CaptureMode => self.capture_mode.is_some(),
            OptionName::CameraPower => self.camera_power.is_some(),
            OptionName::Ssid => self.ssid.is_some(),
            OptionName::Username => self.username.is_some(),
            OptionName::Password => self.password.is_some(),
            OptionName::DefaultWifiPassword => self.default_wifi_password.is_some(),
            OptionName::WlanAntennaConfig => self.wlan_antenna_config.is_some(),
            OptionName::WlanFrequency => self.wlan_frequency.is_some(),
            OptionName::AccessInfo => self.access_info.is_some(),
        }
    }

    /// Names of the fields present in the bag
    pub fn names(&self) -> Vec<OptionName> {
        OptionName::ALL
            .into_iter()
            .filter(|name| self.contains(*name))
            .collect()
    }

    pub fn get_value(&self, name: OptionName) -> Option<OptionValue> {
        match name {
            OptionName::NetworkType => self.network_type.map(OptionValue::NetworkType),
            OptionName::CaptureMode => self.capture_mode.map(OptionValue::CaptureMode),
            OptionName::CameraPower => self.camera_power.map(OptionValue::CameraPower),
            OptionName::Ssid => self.ssid.clone().map(OptionValue::Text),
            OptionName::Username => self.username.clone().map(OptionValue::Text),
            OptionName::Password => self.password.clone().map(OptionValue::Text),
            OptionName::DefaultWifiPassword => {
                self.default_wifi_password.clone().map(OptionValue::Text)
            }
            OptionName::WlanAntennaConfig => {
                self.wlan_antenna_config.map(OptionValue::WlanAntennaConfig)
            }
            OptionName::WlanFrequency => self.wlan_frequency.map(OptionValue::WlanFrequency),
            OptionName::AccessInfo => self.access_info.clone().map(OptionValue::AccessInfo),
        }
    }

    /// Store `value` under `name`. The variant must match the type bound to
    /// the name; a mismatch leaves the bag unchanged.
    pub fn set_value(&mut self, name: OptionName, value: OptionValue) -> Result<(), CodecError> {
        match (name, value) {
            (OptionName::NetworkType, OptionValue::NetworkType(v)) => self.network_type = Some(v),
            (OptionName::CaptureMode, OptionValue::CaptureMode(v)) => self.capture_mode = Some(v),
            (OptionName::CameraPower, OptionValue::CameraPower(v)) => self.camera_power = Some(v),
            (OptionName::Ssid, OptionValue::Text(v)) => self.ssid = Some(v),
            (OptionName::Username, OptionValue::Text(v)) => self.username = Some(v),
            (OptionName::Password, OptionValue::Text(v)) => self.password = Some(v),
            (OptionName::DefaultWifiPassword, OptionValue::Text(v)) => {
                self.default_wifi_password = Some(v)
            }
            (OptionName::WlanAntennaConfig, OptionValue::WlanAntennaConfig(v)) => {
                self.wlan_antenna_config = Some(v)
            }
            (OptionName::WlanFrequency, OptionValue::WlanFrequency(v)) => {
                self.wlan_frequency = Some(v)
            }
            (OptionName::AccessInfo, OptionValue::AccessInfo(v)) => self.access_info = Some(v),
            (name, _) => {
                return Err(CodecError::TypeMismatch {
                    option: name.key(),
                    expected: name.value_type(),
                });
            }
        }
        Ok(())
    }

    /// Remove `name` from the bag
    pub fn clear(&mut self, name: OptionName) {
        match name {
            OptionName::NetworkType => self.network_type = None,
            OptionName::CaptureMode => self.capture_mode = None,
            OptionName::CameraPower => self.camera_power = None,
            OptionName::Ssid => self.ssid = None,
            OptionName::Username => self.username = None,
            OptionName::Password => self.password = None,
            OptionName::DefaultWifiPassword => self.default_wifi_password = None,
            OptionName::WlanAntennaConfig => self.wlan_antenna_config = None,
            OptionName::WlanFrequency => self.wlan_frequency = None,
            OptionName::AccessInfo => self.access_info = None,
        }
    }

    /// Keep only the named fields
    pub fn retain(&mut self, names: &[OptionName]) {
        for name in OptionName::ALL {
            if !names.contains(&name) {
                self.clear(name);
            }
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, CodecError> {
        encode_json(self)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, CodecError> {
        decode_json(data)
    }
}

/// JSON request body asking for the given option keys
pub fn encode_option_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<u8>, CodecError> {
    let keys: Vec<&str> = names.iter().map(|n| n.as_ref()).collect();
    encode_json(&keys)
}
