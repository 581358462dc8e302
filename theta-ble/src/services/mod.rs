//! Command sets layered on a connected session, one per GATT service
//!
//! A session only instantiates the sub-services whose service the camera
//! exposes. Each holds the session's link and fails with
//! [`Error::NotConnected`](crate::Error::NotConnected) once the session
//! has disconnected.

use std::sync::Arc;

use theta_proto::ThetaService;

use crate::link::Link;

mod bluetooth;
mod control_v2;
mod info;
mod shooting;
mod status;
mod wlan;

pub use bluetooth::BluetoothControl;
pub use control_v2::CameraControlV2;
pub use info::CameraInformation;
pub use shooting::{ShootingControl, TakePictureCallback};
pub use status::CameraStatus;
pub use wlan::WlanControlV2;

/// A resolved capability of the connected camera
#[derive(Clone)]
pub enum SubService {
    CameraInformation(Arc<CameraInformation>),
    CameraStatus(Arc<CameraStatus>),
    ShootingControl(Arc<ShootingControl>),
    CameraControlV2(Arc<CameraControlV2>),
    BluetoothControl(Arc<BluetoothControl>),
    WlanControlV2(Arc<WlanControlV2>),
}

impl SubService {
    pub fn service(&self) -> ThetaService {
        match self {
            Self::CameraInformation(_) => ThetaService::CameraInformation,
            Self::CameraStatus(_) => ThetaService::CameraStatusCommand,
            Self::ShootingControl(_) => ThetaService::ShootingControlCommand,
            Self::CameraControlV2(_) => ThetaService::CameraControlCommandV2,
            Self::BluetoothControl(_) => ThetaService::BluetoothControlCommand,
            Self::WlanControlV2(_) => ThetaService::WlanControlCommandV2,
        }
    }
}

type Factory = fn(Arc<Link>) -> SubService;

/// Sub-service constructors, tried in this order at connect time
pub(crate) const FACTORIES: &[(ThetaService, Factory)] = &[
    (ThetaService::CameraInformation, |link| {
        SubService::CameraInformation(Arc::new(CameraInformation::new(link)))
    }),
    (ThetaService::CameraStatusCommand, |link| {
        SubService::CameraStatus(Arc::new(CameraStatus::new(link)))
    }),
    (ThetaService::ShootingControlCommand, |link| {
        SubService::ShootingControl(Arc::new(ShootingControl::new(link)))
    }),
    (ThetaService::CameraControlCommandV2, |link| {
        SubService::CameraControlV2(Arc::new(CameraControlV2::new(link)))
    }),
    (ThetaService::BluetoothControlCommand, |link| {
        SubService::BluetoothControl(Arc::new(BluetoothControl::new(link)))
    }),
    (ThetaService::WlanControlCommandV2, |link| {
        SubService::WlanControlV2(Arc::new(WlanControlV2::new(link)))
    }),
];
