//! Errors raised while converting between wire bytes and typed values

/// Failure to encode or decode a wire value
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Wire value has no matching member and the type does not tolerate it
    #[error("unknown value 0x{value:02x} for {type_name}")]
    UnknownValue { type_name: &'static str, value: u32 },

    /// Unknown string value for a type that does not tolerate it
    #[error("unknown value {value:?} for {type_name}")]
    UnknownString { type_name: &'static str, value: String },

    /// Attempt to write a reserved member
    #[error("{type_name}::Reserved cannot be written")]
    ReservedValue { type_name: &'static str },

    /// Member exists but has no BLE byte representation
    #[error("{type_name}::{member} has no BLE representation")]
    NotRepresentable { type_name: &'static str, member: &'static str },

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Option value does not have the type bound to its name
    #[error("option {option} expects a {expected} value")]
    TypeMismatch { option: &'static str, expected: &'static str },
}
