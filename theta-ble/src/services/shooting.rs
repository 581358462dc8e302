use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use theta_proto::ble::{CAPTURE_MODE_SETTLE_MS, take_picture};
use theta_proto::{CaptureMode, FileFormat, ThetaCharacteristic};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::{Error, Operation, Result};
use crate::link::Link;
use crate::mux::SlotCallback;

/// Receives the outcome of one take-picture exchange
pub type TakePictureCallback = Box<dyn FnOnce(Result<()>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PictureState {
    Idle,
    AwaitingCompletion,
}

/// Capture mode, file format, storage counters and the shutter
pub struct ShootingControl {
    link: Arc<Link>,
    picture: Arc<Mutex<PictureState>>,
}

impl ShootingControl {
    pub(crate) fn new(link: Arc<Link>) -> Self {
        Self {
            link,
            picture: Arc::new(Mutex::new(PictureState::Idle)),
        }
    }

    pub async fn capture_mode(&self) -> Result<CaptureMode> {
        self.link.read(ThetaCharacteristic::CaptureMode).await
    }

    /// Only image, video and live streaming can be set over BLE
    pub async fn set_capture_mode(&self, mode: CaptureMode) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::CaptureMode, &mode)
            .await
    }

    pub async fn file_format(&self) -> Result<FileFormat> {
        self.link.read(ThetaCharacteristic::FileFormat).await
    }

    pub async fn set_file_format(&self, format: FileFormat) -> Result<()> {
        self.link
            .write(ThetaCharacteristic::FileFormat, &format)
            .await
    }

    pub async fn remaining_pictures(&self) -> Result<u32> {
        self.link.read(ThetaCharacteristic::RemainingPictures).await
    }

    /// Free storage in bytes
    pub async fn remaining_space(&self) -> Result<u64> {
        self.link.read(ThetaCharacteristic::RemainingSpace).await
    }

    /// Shoot a still image. Switches to image mode first if needed.
    ///
    /// Returns immediately; `callback` runs once with the outcome. Only one
    /// picture can be in flight: a call made while another is pending gets
    /// [`Error::Busy`] right away and leaves the pending one untouched.
    pub fn take_picture(&self, callback: TakePictureCallback) {
        {
            let mut state = self.picture.lock();
            if *state == PictureState::AwaitingCompletion {
                drop(state);
                callback(Err(Error::Busy("taking picture")));
                return;
            }
            *state = PictureState::AwaitingCompletion;
        }

        let link = self.link.clone();
        let picture = self.picture.clone();
        tokio::spawn(async move {
            let limit = link.timeout().take_picture;
            let result = tokio::select! {
                result = tokio::time::timeout(limit, shoot(&link)) => {
                    result.unwrap_or(Err(Error::Timeout(Operation::TakePicture)))
                }
                _ = link.closed() => Err(Error::NotConnected),
            };
            release(&link).await;
            *picture.lock() = PictureState::Idle;
            match &result {
                Ok(()) => info!("picture taken"),
                Err(error) => warn!(%error, "take picture failed"),
            }
            callback(result);
        });
    }

    /// [`take_picture`](Self::take_picture) awaiting its completion
    pub async fn take_picture_and_wait(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.take_picture(Box::new(move |result: Result<()>| {
            let _ = tx.send(result);
        }));
        rx.await.map_err(|_| Error::NotConnected)?
    }
}

async fn shoot(link: &Link) -> Result<()> {
    let mode: CaptureMode = link.read(ThetaCharacteristic::CaptureMode).await?;
    if mode != CaptureMode::Image {
        debug!(?mode, "switching to image mode");
        link.write(ThetaCharacteristic::CaptureMode, &CaptureMode::Image)
            .await?;
        tokio::time::sleep(Duration::from_millis(CAPTURE_MODE_SETTLE_MS)).await;
    }

    let mux = link.mux();
    mux.register(ThetaCharacteristic::TakePicture).await?;
    let (tx, rx) = oneshot::channel();
    let tx = Mutex::new(Some(tx));
    let completion: SlotCallback = Box::new(move |value: Result<Vec<u8>>| {
        if let Some(tx) = tx.lock().take() {
            let _ = tx.send(value);
        }
    });
    mux.set_callback(ThetaCharacteristic::TakePicture, Some(completion))
        .await?;
    link.write(ThetaCharacteristic::TakePicture, &take_picture::START)
        .await?;

    let value = rx.await.map_err(|_| Error::NotConnected)??;
    completion_status(&value)
}

fn completion_status(value: &[u8]) -> Result<()> {
    match value.first() {
        None => Err(Error::EmptyResponse(ThetaCharacteristic::TakePicture)),
        Some(&take_picture::COMPLETED) => Ok(()),
        Some(status) => Err(Error::Device(format!(
            "take picture failed with status 0x{status:02x}"
        ))),
    }
}

async fn release(link: &Link) {
    let mux = link.mux();
    let _ = mux
        .set_callback(ThetaCharacteristic::TakePicture, None)
        .await;
    mux.unregister(ThetaCharacteristic::TakePicture).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_byte_is_checked() {
        assert!(completion_status(&[0x01]).is_ok());
        assert!(matches!(completion_status(&[0x02]), Err(Error::Device(_))));
        assert!(matches!(
            completion_status(&[]),
            Err(Error::EmptyResponse(ThetaCharacteristic::TakePicture))
        ));
    }
}
