//! Timeouts applied to transport operations

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Per-session timeouts. Serialized as milliseconds.
///
/// Characteristic reads and writes are bounded by `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeout {
    /// Camera discovery and scan operations (default 30 s)
    #[serde(with = "millis")]
    pub scan: Duration,
    /// Acquiring the peripheral handle from an advertisement (default 1 s)
    #[serde(with = "millis")]
    pub peripheral: Duration,
    /// Connect, disconnect, MTU negotiation, reads and writes (default 5 s)
    #[serde(with = "millis")]
    pub connect: Duration,
    /// Waiting for the take-picture completion notification (default 10 s)
    #[serde(with = "millis")]
    pub take_picture: Duration,
}

impl Timeout {
    pub const DEFAULT_SCAN: Duration = Duration::from_secs(30);
    pub const DEFAULT_PERIPHERAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_CONNECT: Duration = Duration::from_secs(5);
    pub const DEFAULT_TAKE_PICTURE: Duration = Duration::from_secs(10);

    pub fn with_scan(mut self, scan: Duration) -> Self {
        self.scan = scan;
        self
    }

    pub fn with_peripheral(mut self, peripheral: Duration) -> Self {
        self.peripheral = peripheral;
        self
    }

    pub fn with_connect(mut self, connect: Duration) -> Self {
        self.connect = connect;
        self
    }

    pub fn with_take_picture(mut self, take_picture: Duration) -> Self {
        self.take_picture = take_picture;
        self
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self {
            scan: Self::DEFAULT_SCAN,
            peripheral: Self::DEFAULT_PERIPHERAL,
            connect: Self::DEFAULT_CONNECT,
            take_picture: Self::DEFAULT_TAKE_PICTURE,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where D: Deserializer<'de> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
