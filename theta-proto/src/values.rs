//! Wire enumerations
//!
//! Three decoding policies are in use:
//!
//! * strict: an unmapped byte is [`CodecError::UnknownValue`]
//! * reserved-range: an unmapped byte inside the declared range decodes to a
//!   `Reserved` member, anything outside the range is an error
//! * sentinel-unknown: an unmapped option string decodes to `Unknown`
//!
//! `Reserved`, `Unknown` and members that only exist as option strings are
//! rejected when written to a characteristic.

use serde::{Deserialize, Serialize, Serializer};

use crate::CodecError;
use crate::codec::{BleDecode, BleEncode, fixed};

fn unknown(type_name: &'static str, value: u8) -> CodecError {
    CodecError::UnknownValue {
        type_name,
        value: value as u32,
    }
}

fn not_representable(type_name: &'static str, member: &'static str) -> CodecError {
    CodecError::NotRepresentable { type_name, member }
}

/// Serialize a sentinel-unknown string enum, refusing the sentinel
fn serialize_known<S: Serializer>(
    value: Option<&'static str>,
    type_name: &'static str,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(s) => serializer.serialize_str(s),
        None => Err(serde::ser::Error::custom(not_representable(type_name, "Unknown"))),
    }
}

/// Battery charging state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargingState {
    #[serde(rename = "charging")]
    Charging,
    #[serde(rename = "charged")]
    Completed,
    #[serde(rename = "disconnect")]
    NotCharging,
}

impl BleDecode for ChargingState {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::Charging),
            1 => Ok(Self::Completed),
            2 => Ok(Self::NotCharging),
            other => Err(unknown("ChargingState", other)),
        }
    }
}

/// Camera power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CameraPower {
    Off,
    On,
    Sleep,
    Unknown,
}

impl CameraPower {
    pub fn as_option_str(self) -> Option<&'static str> {
        match self {
            Self::Off => Some("off"),
            Self::On => Some("on"),
            Self::Sleep => Some("sleep"),
            Self::Unknown => None,
        }
    }
}

impl From<String> for CameraPower {
    fn from(value: String) -> Self {
        match value.as_str() {
            "off" => Self::Off,
            "on" => Self::On,
            "sleep" => Self::Sleep,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for CameraPower {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_known(self.as_option_str(), "CameraPower", serializer)
    }
}

impl BleDecode for CameraPower {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::Off),
            1 => Ok(Self::On),
            2 => Ok(Self::Sleep),
            other => Err(unknown("CameraPower", other)),
        }
    }
}

impl BleEncode for CameraPower {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Off => Ok(vec![0]),
            Self::On => Ok(vec![1]),
            Self::Sleep => Ok(vec![2]),
            Self::Unknown => Err(not_representable("CameraPower", "Unknown")),
        }
    }
}

/// Shooting mode
///
/// `Interval` and `Preset` only exist as option strings; the shooting
/// control characteristic knows image, video and live streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CaptureMode {
    Image,
    Video,
    LiveStreaming,
    Interval,
    Preset,
    Unknown,
}

impl CaptureMode {
    pub fn as_option_str(self) -> Option<&'static str> {
        match self {
            Self::Image => Some("image"),
            Self::Video => Some("video"),
            Self::LiveStreaming => Some("_liveStreaming"),
            Self::Interval => Some("interval"),
            Self::Preset => Some("_preset"),
            Self::Unknown => None,
        }
    }
}

impl From<String> for CaptureMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "_liveStreaming" => Self::LiveStreaming,
            "interval" => Self::Interval,
            "_preset" => Self::Preset,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for CaptureMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_known(self.as_option_str(), "CaptureMode", serializer)
    }
}

impl BleDecode for CaptureMode {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::Image),
            1 => Ok(Self::Video),
            2 => Ok(Self::LiveStreaming),
            other => Err(unknown("CaptureMode", other)),
        }
    }
}

impl BleEncode for CaptureMode {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Image => Ok(vec![0]),
            Self::Video => Ok(vec![1]),
            Self::LiveStreaming => Ok(vec![2]),
            Self::Interval => Err(not_representable("CaptureMode", "Interval")),
            Self::Preset => Err(not_representable("CaptureMode", "Preset")),
            Self::Unknown => Err(not_representable("CaptureMode", "Unknown")),
        }
    }
}

/// Still image / video file format. Bytes 0x00..=0x0F are allocated,
/// the gaps decode to `Reserved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    ImageJpeg5376x2688,
    ImageJpeg2048x1024,
    VideoMp41920x960,
    VideoMp41280x640,
    VideoMp43840x1920,
    ImageJpeg6720x3360,
    Reserved,
}

impl FileFormat {
    const RANGE: std::ops::RangeInclusive<u8> = 0x00..=0x0f;
}

impl BleDecode for FileFormat {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0x00 => Ok(Self::ImageJpeg5376x2688),
            0x01 => Ok(Self::ImageJpeg2048x1024),
            0x02 => Ok(Self::VideoMp41920x960),
            0x03 => Ok(Self::VideoMp41280x640),
            0x07 => Ok(Self::VideoMp43840x1920),
            0x08 => Ok(Self::ImageJpeg6720x3360),
            other if Self::RANGE.contains(&other) => Ok(Self::Reserved),
            other => Err(unknown("FileFormat", other)),
        }
    }
}

impl BleEncode for FileFormat {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let byte = match self {
            Self::ImageJpeg5376x2688 => 0x00,
            Self::ImageJpeg2048x1024 => 0x01,
            Self::VideoMp41920x960 => 0x02,
            Self::VideoMp41280x640 => 0x03,
            Self::VideoMp43840x1920 => 0x07,
            Self::ImageJpeg6720x3360 => 0x08,
            Self::Reserved => {
                return Err(CodecError::ReservedValue {
                    type_name: "FileFormat",
                });
            }
        };
        Ok(vec![byte])
    }
}

/// Reason the camera rejected the last command. Bytes 0x00..=0x7F are
/// allocated, the gaps decode to `Reserved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandErrorDescription {
    DisabledCommand,
    MissingParameter,
    InvalidParameterValue,
    PowerOffSequenceRunning,
    InvalidFileFormat,
    ServiceUnavailable,
    DeviceBusy,
    Reserved,
}

impl BleDecode for CommandErrorDescription {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0x01 => Ok(Self::DisabledCommand),
            0x02 => Ok(Self::MissingParameter),
            0x03 => Ok(Self::InvalidParameterValue),
            0x04 => Ok(Self::PowerOffSequenceRunning),
            0x05 => Ok(Self::InvalidFileFormat),
            0x06 => Ok(Self::ServiceUnavailable),
            0x07 => Ok(Self::DeviceBusy),
            0x00..=0x7f => Ok(Self::Reserved),
            other => Err(unknown("CommandErrorDescription", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginPowerStatus {
    Stop,
    Running,
}

/// Plugin power state plus the plugin slot it applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginControl {
    pub status: PluginPowerStatus,
    /// Plugin slot, 0 means the default plugin
    pub plugin: u8,
}

impl BleDecode for PluginPowerStatus {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::Stop),
            1 => Ok(Self::Running),
            other => Err(unknown("PluginPowerStatus", other)),
        }
    }
}

impl BleDecode for PluginControl {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        let [status, plugin] = fixed::<2>(data)?;
        Ok(Self {
            status: PluginPowerStatus::decode(&[status])?,
            plugin,
        })
    }
}

impl BleEncode for PluginControl {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let status = match self.status {
            PluginPowerStatus::Stop => 0,
            PluginPowerStatus::Running => 1,
        };
        Ok(vec![status, self.plugin])
    }
}

/// Wireless network mode. `Scan` only exists as an option string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum NetworkType {
    Direct,
    Client,
    Ethernet,
    Off,
    Lte,
    Scan,
    Unknown,
}

impl NetworkType {
    pub fn as_option_str(self) -> Option<&'static str> {
        match self {
            Self::Direct => Some("AP"),
            Self::Client => Some("CL"),
            Self::Ethernet => Some("ETHERNET"),
            Self::Off => Some("OFF"),
            Self::Lte => Some("LTE"),
            Self::Scan => Some("SCAN"),
            Self::Unknown => None,
        }
    }
}

impl From<String> for NetworkType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AP" => Self::Direct,
            "CL" => Self::Client,
            "ETHERNET" => Self::Ethernet,
            "OFF" => Self::Off,
            "LTE" => Self::Lte,
            "SCAN" => Self::Scan,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for NetworkType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_known(self.as_option_str(), "NetworkType", serializer)
    }
}

impl BleDecode for NetworkType {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::Direct),
            1 => Ok(Self::Client),
            2 => Ok(Self::Ethernet),
            3 => Ok(Self::Off),
            4 => Ok(Self::Lte),
            other => Err(unknown("NetworkType", other)),
        }
    }
}

impl BleEncode for NetworkType {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::Direct => Ok(vec![0]),
            Self::Client => Ok(vec![1]),
            Self::Ethernet => Ok(vec![2]),
            Self::Off => Ok(vec![3]),
            Self::Lte => Ok(vec![4]),
            Self::Scan => Err(not_representable("NetworkType", "Scan")),
            Self::Unknown => Err(not_representable("NetworkType", "Unknown")),
        }
    }
}

/// Whether the Wi-Fi password is still the factory default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WlanPasswordState {
    /// Default password derived from the serial number
    SerialNumber,
    Changed,
}

impl BleDecode for WlanPasswordState {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        match u8::decode(data)? {
            0 => Ok(Self::SerialNumber),
            1 => Ok(Self::Changed),
            other => Err(unknown("WlanPasswordState", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum WlanAntennaConfig {
    Siso,
    Mimo,
    Unknown,
}

impl WlanAntennaConfig {
    pub fn as_option_str(self) -> Option<&'static str> {
        match self {
            Self::Siso => Some("SISO"),
            Self::Mimo => Some("MIMO"),
            Self::Unknown => None,
        }
    }
}

impl From<String> for WlanAntennaConfig {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SISO" => Self::Siso,
            "MIMO" => Self::Mimo,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for WlanAntennaConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_known(self.as_option_str(), "WlanAntennaConfig", serializer)
    }
}

/// Wi-Fi band, carried as a number of GHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "f64")]
pub enum WlanFrequency {
    Ghz2_4,
    Ghz5,
    Ghz5_2,
    Ghz5_8,
    Unknown,
}

impl WlanFrequency {
    pub fn ghz(self) -> Option<f64> {
        match self {
            Self::Ghz2_4 => Some(2.4),
            Self::Ghz5 => Some(5.0),
            Self::Ghz5_2 => Some(5.2),
            Self::Ghz5_8 => Some(5.8),
            Self::Unknown => None,
        }
    }
}

impl From<f64> for WlanFrequency {
    fn from(value: f64) -> Self {
        [Self::Ghz2_4, Self::Ghz5, Self::Ghz5_2, Self::Ghz5_8]
            .into_iter()
            .find(|f| f.ghz().is_some_and(|ghz| (ghz - value).abs() < 0.01))
            .unwrap_or(Self::Unknown)
    }
}

impl Serialize for WlanFrequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.ghz() {
            Some(ghz) => serializer.serialize_f64(ghz),
            None => Err(serde::ser::Error::custom(not_representable(
                "WlanFrequency",
                "Unknown",
            ))),
        }
    }
}

/// Camera activity reported in the state JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum CaptureStatus {
    Idle,
    Shooting,
    SelfTimerCountdown,
    Bracketing,
    Converting,
    Unknown,
}

impl From<String> for CaptureStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "idle" => Self::Idle,
            "shooting" => Self::Shooting,
            "self_timer_countdown" => Self::SelfTimerCountdown,
            "bracket_shooting" => Self::Bracketing,
            "converting" => Self::Converting,
            _ => Self::Unknown,
        }
    }
}

impl Serialize for CaptureStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = match self {
            Self::Idle => Some("idle"),
            Self::Shooting => Some("shooting"),
            Self::SelfTimerCountdown => Some("self_timer_countdown"),
            Self::Bracketing => Some("bracket_shooting"),
            Self::Converting => Some("converting"),
            Self::Unknown => None,
        };
        serialize_known(s, "CaptureStatus", serializer)
    }
}

/// Access point security
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WlanSecurity {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "WEP")]
    Wep,
    #[serde(rename = "WPA/WPA2 PSK")]
    WpaWpa2Psk,
    #[serde(rename = "WPA3-SAE")]
    Wpa3Sae,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_enums_reject_unmapped_bytes() {
        assert!(matches!(
            ChargingState::decode(&[3]),
            Err(CodecError::UnknownValue { type_name: "ChargingState", value: 3 })
        ));
        assert!(matches!(CameraPower::decode(&[9]), Err(CodecError::UnknownValue { .. })));
        assert!(matches!(CaptureMode::decode(&[0x10]), Err(CodecError::UnknownValue { .. })));
        assert!(matches!(NetworkType::decode(&[5]), Err(CodecError::UnknownValue { .. })));
        assert!(matches!(WlanPasswordState::decode(&[2]), Err(CodecError::UnknownValue { .. })));
        assert!(matches!(PluginPowerStatus::decode(&[2]), Err(CodecError::UnknownValue { .. })));
        assert_eq!(ChargingState::decode(&[2]).unwrap(), ChargingState::NotCharging);
    }

    #[test]
    fn reserved_range_maps_gaps_to_reserved() {
        assert_eq!(FileFormat::decode(&[0x04]).unwrap(), FileFormat::Reserved);
        assert_eq!(FileFormat::decode(&[0x0f]).unwrap(), FileFormat::Reserved);
        assert_eq!(FileFormat::decode(&[0x08]).unwrap(), FileFormat::ImageJpeg6720x3360);
        assert!(matches!(FileFormat::decode(&[0x10]), Err(CodecError::UnknownValue { .. })));

        assert_eq!(
            CommandErrorDescription::decode(&[0x00]).unwrap(),
            CommandErrorDescription::Reserved
        );
        assert_eq!(
            CommandErrorDescription::decode(&[0x07]).unwrap(),
            CommandErrorDescription::DeviceBusy
        );
        assert!(CommandErrorDescription::decode(&[0x80]).is_err());
    }

    #[test]
    fn reserved_and_unknown_members_cannot_be_written() {
        assert!(matches!(
            FileFormat::Reserved.encode(),
            Err(CodecError::ReservedValue { type_name: "FileFormat" })
        ));
        assert!(matches!(
            CaptureMode::Interval.encode(),
            Err(CodecError::NotRepresentable { member: "Interval", .. })
        ));
        assert!(CameraPower::Unknown.encode().is_err());
        assert!(NetworkType::Scan.encode().is_err());
        assert_eq!(FileFormat::VideoMp43840x1920.encode().unwrap(), vec![0x07]);
    }

    #[test]
    fn option_strings_fall_back_to_unknown() {
        let mode: CaptureMode = serde_json::from_str("\"_timeShift\"").unwrap();
        assert_eq!(mode, CaptureMode::Unknown);
        let net: NetworkType = serde_json::from_str("\"CL\"").unwrap();
        assert_eq!(net, NetworkType::Client);
        let freq: WlanFrequency = serde_json::from_str("5.2").unwrap();
        assert_eq!(freq, WlanFrequency::Ghz5_2);
        let freq: WlanFrequency = serde_json::from_str("6").unwrap();
        assert_eq!(freq, WlanFrequency::Unknown);
        let status: CaptureStatus = serde_json::from_str("\"timelapse\"").unwrap();
        assert_eq!(status, CaptureStatus::Unknown);
    }

    #[test]
    fn unknown_option_strings_are_not_serialized() {
        assert!(serde_json::to_string(&CaptureMode::Unknown).is_err());
        assert!(serde_json::to_string(&WlanFrequency::Unknown).is_err());
        assert_eq!(serde_json::to_string(&WlanAntennaConfig::Mimo).unwrap(), "\"MIMO\"");
        assert_eq!(serde_json::to_string(&WlanFrequency::Ghz2_4).unwrap(), "2.4");
    }

    #[test]
    fn plugin_control_is_two_bytes() {
        let control = PluginControl::decode(&[1, 3]).unwrap();
        assert_eq!(control.status, PluginPowerStatus::Running);
        assert_eq!(control.plugin, 3);
        assert_eq!(control.encode().unwrap(), vec![1, 3]);
        assert!(PluginControl::decode(&[1]).is_err());
    }
}
