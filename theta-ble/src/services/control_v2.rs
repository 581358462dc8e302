use std::sync::Arc;

use theta_proto::ble::RELEASE_SHUTTER;
use theta_proto::options::encode_option_names;
use theta_proto::{
    OptionName, ThetaCharacteristic, ThetaInfo, ThetaOptions, ThetaState, ThetaState2,
};
use tracing::debug;

use crate::error::{Error, Result};
use crate::link::{Link, NotifyCallback};

/// JSON command set of the v2 camera control service
pub struct CameraControlV2 {
    link: Arc<Link>,
}

impl CameraControlV2 {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        Self { link }
    }

    pub async fn get_info(&self) -> Result<ThetaInfo> {
        self.link.read(ThetaCharacteristic::GetInfo).await
    }

    pub async fn get_state(&self) -> Result<ThetaState> {
        self.link.read(ThetaCharacteristic::GetState).await
    }

    pub async fn get_state2(&self) -> Result<ThetaState2> {
        self.link.read(ThetaCharacteristic::GetState2).await
    }

    pub async fn set_state_notify(
        &self,
        callback: Option<NotifyCallback<ThetaState>>,
    ) -> Result<()> {
        self.link
            .set_notify(ThetaCharacteristic::StateNotify, callback)
            .await
    }

    /// Fetch the named options. Only those fields are set in the result.
    pub async fn get_options(&self, names: &[OptionName]) -> Result<ThetaOptions> {
        if names.is_empty() {
            return Err(Error::MissingArgument("names"));
        }
        let keys: Vec<&str> = names.iter().map(|n| n.key()).collect();
        let mut options = self.query(&keys).await?;
        options.retain(names);
        Ok(options)
    }

    /// Like [`get_options`](Self::get_options) with raw option keys. Keys
    /// this crate does not model are sent as is but dropped from the result.
    pub async fn get_options_by_string<S: AsRef<str>>(&self, names: &[S]) -> Result<ThetaOptions> {
        if names.is_empty() {
            return Err(Error::MissingArgument("names"));
        }
        let known: Vec<OptionName> = names
            .iter()
            .filter_map(|n| n.as_ref().parse().ok())
            .collect();
        let mut options = self.query(names).await?;
        options.retain(&known);
        Ok(options)
    }

    async fn query<S: AsRef<str>>(&self, keys: &[S]) -> Result<ThetaOptions> {
        let request = encode_option_names(keys)?;
        self.link
            .write_raw(ThetaCharacteristic::Options, &request)
            .await?;
        let response = self.link.read_raw(ThetaCharacteristic::Options).await?;
        Ok(ThetaOptions::from_json(&response)?)
    }

    /// Write every option present in `options`; absent ones are untouched
    pub async fn set_options(&self, options: &ThetaOptions) -> Result<()> {
        if options.is_empty() {
            return Err(Error::MissingArgument("options"));
        }
        debug!(names = ?options.names(), "setting options");
        let payload = options.to_json()?;
        self.link
            .write_raw(ThetaCharacteristic::SetOptions, &payload)
            .await
    }

    pub async fn release_shutter(&self) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::ReleaseShutter, &RELEASE_SHUTTER)
            .await
    }
}
