//! Value codec: little-endian integers, byte/string values, JSON payloads
//!
//! Integer conversions take exact-width arrays. Checking the length of a raw
//! characteristic value is the caller's job, see [`fixed`].

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CodecError;

pub fn encode_u16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

pub fn decode_u16(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

pub fn encode_u32(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

pub fn decode_u32(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes)
}

pub fn encode_u64(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

pub fn decode_u64(bytes: [u8; 8]) -> u64 {
    u64::from_le_bytes(bytes)
}

/// Borrow `data` as an array of exactly `N` bytes
pub fn fixed<const N: usize>(data: &[u8]) -> Result<[u8; N], CodecError> {
    data.try_into().map_err(|_| CodecError::InvalidLength {
        expected: N,
        actual: data.len(),
    })
}

/// A value that can be read from a characteristic
pub trait BleDecode: Sized {
    fn decode(data: &[u8]) -> Result<Self, CodecError>;
}

/// A value that can be written to a characteristic
pub trait BleEncode {
    fn encode(&self) -> Result<Vec<u8>, CodecError>;
}

impl BleDecode for u8 {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(fixed::<1>(data)?[0])
    }
}

impl BleEncode for u8 {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(vec![*self])
    }
}

impl BleDecode for u16 {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(decode_u16(fixed(data)?))
    }
}

impl BleEncode for u16 {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(encode_u16(*self).to_vec())
    }
}

impl BleDecode for u32 {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(decode_u32(fixed(data)?))
    }
}

impl BleDecode for u64 {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(decode_u64(fixed(data)?))
    }
}

impl BleDecode for String {
    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        Ok(String::from_utf8(data.to_vec())?)
    }
}

impl BleEncode for str {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl BleEncode for String {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.as_str().encode()
    }
}

/// Parse a UTF-8 JSON characteristic value
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(data)?)
}

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        assert_eq!(encode_u16(0x1234), [0x34, 0x12]);
        assert_eq!(encode_u32(0x0102_0304), [0x04, 0x03, 0x02, 0x01]);
        assert_eq!(
            encode_u64(0x0102_0304_0506_0708),
            [0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(decode_u16([0xff, 0x00]), 255);
    }

    #[test]
    fn integers_round_trip_at_the_edges() {
        for v in [0, 1, 0x00ff, 0xff00, u16::MAX] {
            assert_eq!(decode_u16(encode_u16(v)), v);
        }
        for v in [0, 1, 0x8000_0000, u32::MAX] {
            assert_eq!(decode_u32(encode_u32(v)), v);
        }
        for v in [0, 1, 0x8000_0000_0000_0000, u64::MAX] {
            assert_eq!(decode_u64(encode_u64(v)), v);
        }
    }

    #[test]
    fn fixed_rejects_wrong_width() {
        assert!(matches!(
            fixed::<4>(&[1, 2, 3]),
            Err(CodecError::InvalidLength { expected: 4, actual: 3 })
        ));
        assert!(matches!(
            u16::decode(&[1, 2, 3]),
            Err(CodecError::InvalidLength { expected: 2, actual: 3 })
        ));
        assert_eq!(u32::decode(&[1, 0, 0, 0]).unwrap(), 1);
    }

    #[test]
    fn strings_require_utf8() {
        assert_eq!(String::decode(b"AA:BB").unwrap(), "AA:BB");
        assert!(matches!(
            String::decode(&[0xff, 0xfe]),
            Err(CodecError::InvalidUtf8(_))
        ));
    }
}
