//! Error taxonomy
//!
//! Every fallible operation returns [`Error`]. [`Error::kind`] tells apart
//! protocol/state errors (the camera or the caller got something wrong),
//! transport errors (the radio link failed or timed out) and serialization
//! errors (a payload could not be parsed).

use std::fmt;

use theta_proto::{CodecError, ThetaCharacteristic, ThetaService};

use crate::transport::TransportError;

/// Operation bounded by a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Discover,
    AcquirePeripheral,
    Connect,
    Disconnect,
    RequestMtu,
    Read(ThetaCharacteristic),
    Write(ThetaCharacteristic),
    Observe(ThetaCharacteristic),
    TakePicture,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(c) => write!(f, "read {c}"),
            Self::Write(c) => write!(f, "write {c}"),
            Self::Observe(c) => write!(f, "observe {c}"),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

/// What is not supported by the connected camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Service(ThetaService),
    Characteristic(ThetaCharacteristic),
    /// The camera exposes none of the known services
    AnyService,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(s) => write!(f, "service {s}"),
            Self::Characteristic(c) => write!(f, "characteristic {c}"),
            Self::AnyService => f.write_str("the THETA service set"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Api,
    Transport,
    Serialization,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not connected")]
    NotConnected,

    #[error("{0} is not supported by this camera")]
    Unsupported(Feature),

    #[error("empty response from {0}")]
    EmptyResponse(ThetaCharacteristic),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    /// Another take-picture or scan is already running
    #[error("busy: {0}")]
    Busy(&'static str),

    /// The camera reported a failure status
    #[error("camera reported failure: {0}")]
    Device(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("bluetooth: {0}")]
    Transport(#[from] TransportError),

    #[error("timed out: {0}")]
    Timeout(Operation),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) | Self::Timeout(_) => ErrorKind::Transport,
            Self::Codec(
                CodecError::Json(_) | CodecError::TypeMismatch { .. } | CodecError::InvalidUtf8(_),
            ) => ErrorKind::Serialization,
            _ => ErrorKind::Api,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(Error::NotConnected.kind(), ErrorKind::Api);
        assert_eq!(Error::Busy("taking picture").kind(), ErrorKind::Api);
        assert_eq!(
            Error::from(CodecError::ReservedValue { type_name: "FileFormat" }).kind(),
            ErrorKind::Api
        );
        assert_eq!(
            Error::from(CodecError::TypeMismatch { option: "ssid", expected: "text" }).kind(),
            ErrorKind::Serialization
        );
        let timeout = Error::Timeout(Operation::Connect);
        assert_eq!(timeout.kind(), ErrorKind::Transport);
        assert!(timeout.is_timeout());
        assert_eq!(
            Error::from(TransportError::Disconnected).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn messages_name_the_operation() {
        let err = Error::Timeout(Operation::Read(ThetaCharacteristic::BatteryLevel));
        assert_eq!(err.to_string(), "timed out: read BatteryLevel");
        let err = Error::Unsupported(Feature::Service(ThetaService::WlanControlCommandV2));
        assert_eq!(
            err.to_string(),
            "service WlanControlCommandV2 is not supported by this camera"
        );
    }
}
