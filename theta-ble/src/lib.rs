//! THETA BLE client
//!
//! Session engine for controlling THETA 360 cameras over Bluetooth LE.
//!
//! # Example
//!
//! ```ignore
//! use theta_ble::{BtleplugTransport, Timeout, discovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = BtleplugTransport::new().await?;
//!     let devices = discovery::discover(&transport, None, Timeout::default()).await?;
//!     let Some(device) = devices.into_iter().next() else {
//!         return Ok(());
//!     };
//!
//!     device.connect(None).await?;
//!     let info = device.camera_information()?;
//!     println!("{} {}", info.model_number().await?, info.serial_number().await?);
//!
//!     device.shooting_control()?.take_picture_and_wait().await?;
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod btle;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
mod link;
pub mod mock;
mod mux;
mod scan;
pub mod services;
pub mod transport;

pub use btle::BtleplugTransport;
pub use config::Timeout;
pub use device::{ConnectionState, ThetaDevice};
pub use error::{Error, ErrorKind, Feature, Operation, Result};
pub use link::NotifyCallback;
pub use scan::{CompletedCallback, ItemCallback};
pub use services::{
    BluetoothControl, CameraControlV2, CameraInformation, CameraStatus, ShootingControl,
    SubService, TakePictureCallback, WlanControlV2,
};
pub use transport::{Advertisement, Peripheral, Transport, TransportError};

pub use theta_proto as proto;
