//! Persistent defaults for the command line tool
//!
//! Read from `<config dir>/theta-ble/config.json`. Every field is optional
//! and command line flags win over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use theta_ble::Timeout;
use uuid::Uuid;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Advertised name of the camera to talk to
    pub device: Option<String>,
    /// Token presented to the camera when connecting
    pub auth_token: Option<Uuid>,
    pub timeout: Timeout,
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("theta-ble").join("config.json"))
    }

    /// Load from `path`, or from the default location when `path` is None.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match std::fs::read(&path) {
            Ok(data) => Ok(serde_json::from_slice(&data)
                .map_err(|e| format!("invalid config {}: {e}", path.display()))?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
                Ok(Self::default())
            }
            Err(e) => Err(format!("cannot read {}: {e}", path.display()).into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{"device":"THETAYN10010104","timeout":{"scan":5000}}"#,
        )
        .unwrap();
        assert_eq!(settings.device.as_deref(), Some("THETAYN10010104"));
        assert_eq!(settings.auth_token, None);
        assert_eq!(settings.timeout.scan, Duration::from_secs(5));
        assert_eq!(settings.timeout.connect, Timeout::DEFAULT_CONNECT);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("theta-ble-settings-missing.json");
        let _ = std::fs::remove_file(&path);
        assert!(Settings::load(Some(&path)).is_err());
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("theta-ble-settings-{}", std::process::id()))
            .join("config.json");
        let token = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let settings = Settings {
            device: Some("THETAYL00105377".to_string()),
            auth_token: Some(token),
            timeout: Timeout::default().with_connect(Duration::from_secs(8)),
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(Some(&path)).unwrap();
        assert_eq!(loaded.auth_token, Some(token));
        assert_eq!(loaded.timeout.connect, Duration::from_secs(8));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
