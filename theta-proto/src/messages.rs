//! JSON payloads exchanged over the v2 command services

use serde::{Deserialize, Serialize};

use crate::CodecError;
use crate::codec::{BleDecode, BleEncode, decode_json, encode_json};
use crate::values::{CaptureStatus, ChargingState, WlanSecurity};

/// Camera identity as returned by GetInfo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wlan_mac_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bluetooth_mac_address: Option<String>,
    pub firmware_version: String,
    /// Seconds since power on
    #[serde(default)]
    pub uptime: u64,
}

/// Camera state as returned by GetState and pushed by StateNotify
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaState {
    /// 0.0 to 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_state: Option<ChargingState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_status: Option<CaptureStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordable_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_pictures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_file_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub camera_error: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_insert: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsInfo {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub date_time_zone: String,
    pub datum: String,
}

/// Secondary state block (GetState2)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThetaState2 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_gps_info: Option<GpsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_gps_info: Option<GpsInfo>,
    /// Degrees Celsius
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_temp: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_temp: Option<i32>,
}

/// A Bluetooth peripheral seen by the camera (remote controller etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeripheralDevice {
    pub device_name: String,
    pub mac_address: String,
    #[serde(default)]
    pub pairing: bool,
    #[serde(default)]
    pub connected: bool,
}

/// Wi-Fi the camera is joined to in client mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedWifiInfo {
    pub ssid: String,
    pub is_connected: bool,
    #[serde(default)]
    pub is_internet_accessible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proxy {
    #[serde(rename = "use")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// IP addressing of an access point entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ipAddressAllocation", rename_all = "camelCase")]
pub enum IpAddressing {
    Dynamic,
    #[serde(rename_all = "camelCase")]
    Static {
        ip_address: String,
        subnet_mask: String,
        default_gateway: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dns1: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dns2: Option<String>,
    },
}

/// Access point the camera should join in client mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub ssid: String,
    #[serde(default)]
    pub ssid_stealth: bool,
    pub security: WlanSecurity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// 1 (highest) to 5
    pub connection_priority: u8,
    #[serde(flatten)]
    pub addressing: IpAddressing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Proxy>,
}

impl AccessPoint {
    /// Access point with DHCP addressing and the highest priority
    pub fn new(ssid: impl Into<String>, security: WlanSecurity) -> Self {
        Self {
            ssid: ssid.into(),
            ssid_stealth: false,
            security,
            password: None,
            connection_priority: 1,
            addressing: IpAddressing::Dynamic,
            proxy: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_stealth(mut self, ssid_stealth: bool) -> Self {
        self.ssid_stealth = ssid_stealth;
        self
    }

    pub fn with_priority(mut self, connection_priority: u8) -> Self {
        self.connection_priority = connection_priority;
        self
    }

    pub fn with_static_ip(
        mut self,
        ip_address: impl Into<String>,
        subnet_mask: impl Into<String>,
        default_gateway: impl Into<String>,
    ) -> Self {
        self.addressing = IpAddressing::Static {
            ip_address: ip_address.into(),
            subnet_mask: subnet_mask.into(),
            default_gateway: default_gateway.into(),
            dns1: None,
            dns2: None,
        };
        self
    }

    /// DNS servers, only meaningful with static addressing
    pub fn with_dns(mut self, primary: impl Into<String>, secondary: Option<String>) -> Self {
        if let IpAddressing::Static { dns1, dns2, .. } = &mut self.addressing {
            *dns1 = Some(primary.into());
            *dns2 = secondary;
        }
        self
    }

    pub fn with_proxy(mut self, proxy: Proxy) -> Self {
        self.proxy = Some(proxy);
        self
    }
}

macro_rules! json_payload {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BleDecode for $ty {
                fn decode(data: &[u8]) -> Result<Self, CodecError> {
                    decode_json(data)
                }
            }

            impl BleEncode for $ty {
                fn encode(&self) -> Result<Vec<u8>, CodecError> {
                    encode_json(self)
                }
            }
        )*
    };
}

json_payload!(
    ThetaInfo,
    ThetaState,
    ThetaState2,
    PeripheralDevice,
    ConnectedWifiInfo,
    AccessPoint,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_tolerates_missing_and_unknown_fields() {
        let json = concat!(
            r#"{"batteryLevel":0.8,"captureStatus":"new_mode","#,
            r#""batteryState":"charged","futureField":1}"#,
        );
        let state = ThetaState::decode(json.as_bytes()).unwrap();
        assert_eq!(state.battery_level, Some(0.8));
        assert_eq!(state.capture_status, Some(CaptureStatus::Unknown));
        assert_eq!(state.battery_state, Some(ChargingState::Completed));
        assert_eq!(state.captured_pictures, None);
    }

    #[test]
    fn static_access_point_is_flattened() {
        let ap = AccessPoint::new("office", WlanSecurity::WpaWpa2Psk)
            .with_password("secret")
            .with_static_ip("192.168.1.20", "255.255.255.0", "192.168.1.1");
        let json: serde_json::Value = serde_json::from_slice(&ap.encode().unwrap()).unwrap();
        assert_eq!(json["ipAddressAllocation"], "static");
        assert_eq!(json["ipAddress"], "192.168.1.20");
        assert_eq!(json["security"], "WPA/WPA2 PSK");
        assert!(json.get("dns1").is_none());
        assert!(json.get("proxy").is_none());
    }

    #[test]
    fn dynamic_access_point_with_proxy() {
        let ap = AccessPoint::new("cafe", WlanSecurity::None)
            .with_dns("8.8.8.8", None)
            .with_proxy(Proxy {
                enabled: true,
                url: Some("proxy.local".into()),
                port: Some(8080),
                userid: None,
                password: None,
            });
        assert_eq!(ap.addressing, IpAddressing::Dynamic);
        let json: serde_json::Value = serde_json::from_slice(&ap.encode().unwrap()).unwrap();
        assert_eq!(json["ipAddressAllocation"], "dynamic");
        assert_eq!(json["proxy"]["use"], true);
        assert_eq!(json["proxy"]["port"], 8080);
        assert!(json.get("password").is_none());
    }

    #[test]
    fn malformed_payload_is_a_json_error() {
        assert!(matches!(
            PeripheralDevice::decode(b"{\"deviceName\":1}"),
            Err(CodecError::Json(_))
        ));
    }
}
