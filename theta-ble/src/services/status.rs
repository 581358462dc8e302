use std::sync::Arc;

use theta_proto::{
    CameraPower, ChargingState, CommandErrorDescription, PluginControl, ThetaCharacteristic,
};

use crate::error::Result;
use crate::link::{Link, NotifyCallback};

/// Battery, power and plugin state
pub struct CameraStatus {
    link: Arc<Link>,
}

impl CameraStatus {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        Self { link }
    }

    /// Battery level in percent (0 to 100)
    pub async fn battery_level(&self) -> Result<u8> {
        self.link.read(ThetaCharacteristic::BatteryLevel).await
    }

    pub async fn set_battery_level_notify(
        &self,
        callback: Option<NotifyCallback<u8>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::BatteryLevel, callback)
            .await
    }

    pub async fn battery_status(&self) -> Result<ChargingState> {
        self.link.read(ThetaCharacteristic::BatteryStatus).await
    }

    pub async fn set_battery_status_notify(
        &self,
        callback: Option<NotifyCallback<ChargingState>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::BatteryStatus, callback)
            .await
    }

    pub async fn camera_power(&self) -> Result<CameraPower> {
        self.link.read(ThetaCharacteristic::CameraPower).await
    }

    pub async fn set_camera_power(&self, power: CameraPower) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::CameraPower, &power)
            .await
    }

    pub async fn set_camera_power_notify(
        &self,
        callback: Option<NotifyCallback<CameraPower>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::CameraPower, callback)
            .await
    }

    pub async fn set_command_error_description_notify(
        &self,
        callback: Option<NotifyCallback<CommandErrorDescription>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::CommandErrorDescription, callback)
            .await
    }

    pub async fn plugin_control(&self) -> Result<PluginControl> {
        self.link.read(ThetaCharacteristic::PluginControl).await
    }

    pub async fn set_plugin_control(&self, control: PluginControl) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::PluginControl, &control)
            .await
    }

    pub async fn set_plugin_control_notify(
        &self,
        callback: Option<NotifyCallback<PluginControl>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::PluginControl, callback)
            .await
    }
}
