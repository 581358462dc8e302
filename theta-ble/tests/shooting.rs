mod common;

use std::time::Duration;

use theta_ble::mock::MockPeripheral;
use theta_ble::proto::{CaptureMode, CodecError, FileFormat, ThetaCharacteristic};
use theta_ble::{Error, Operation, Result};
use tokio::sync::oneshot;
use tokio::time::Instant;

use common::connected;

const TAKE_PICTURE: ThetaCharacteristic = ThetaCharacteristic::TakePicture;

fn image_mode_camera() -> MockPeripheral {
    MockPeripheral::new()
        .with_all_services()
        .with_value(ThetaCharacteristic::CaptureMode, vec![0])
}

fn outcome() -> (oneshot::Receiver<Result<()>>, theta_ble::TakePictureCallback) {
    let (tx, rx) = oneshot::channel();
    (
        rx,
        Box::new(move |result: Result<()>| {
            let _ = tx.send(result);
        }),
    )
}

#[tokio::test]
async fn second_picture_while_pending_is_busy() {
    let (device, peripheral) = connected(image_mode_camera()).await;
    let shooting = device.shooting_control().unwrap();

    let (first, on_first) = outcome();
    let (second, on_second) = outcome();
    shooting.take_picture(on_first);
    shooting.take_picture(on_second);
    assert!(matches!(second.await.unwrap(), Err(Error::Busy(_))));

    peripheral.wait_for_writes(TAKE_PICTURE, 1).await;
    peripheral.notify(TAKE_PICTURE, vec![0x01]);
    first.await.unwrap().unwrap();

    // the guard is released once the first picture completes
    assert_eq!(peripheral.writes_to(TAKE_PICTURE), vec![vec![0x01]]);
    let (third, on_third) = outcome();
    shooting.take_picture(on_third);
    peripheral.wait_for_writes(TAKE_PICTURE, 2).await;
    peripheral.notify(TAKE_PICTURE, vec![0x01]);
    third.await.unwrap().unwrap();
    assert_eq!(peripheral.live_observers(TAKE_PICTURE), 0);
}

#[tokio::test(start_paused = true)]
async fn switches_to_image_mode_and_settles() {
    let (device, peripheral) = connected(
        MockPeripheral::new()
            .with_all_services()
            .with_value(ThetaCharacteristic::CaptureMode, vec![1]),
    )
    .await;
    let shooting = device.shooting_control().unwrap();

    let started = Instant::now();
    let (done, on_done) = outcome();
    shooting.take_picture(on_done);
    peripheral.wait_for_writes(TAKE_PICTURE, 1).await;
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::CaptureMode),
        vec![vec![0]]
    );

    peripheral.notify(TAKE_PICTURE, vec![0x01]);
    done.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn missing_completion_times_out() {
    let (device, peripheral) = connected(image_mode_camera()).await;
    let shooting = device.shooting_control().unwrap();

    let err = shooting.take_picture_and_wait().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(Operation::TakePicture)));
    assert!(err.is_timeout());
    assert_eq!(peripheral.live_observers(TAKE_PICTURE), 0);
}

#[tokio::test]
async fn failure_status_is_a_device_error() {
    let (device, peripheral) = connected(image_mode_camera()).await;
    let shooting = device.shooting_control().unwrap();

    let (done, on_done) = outcome();
    shooting.take_picture(on_done);
    peripheral.wait_for_writes(TAKE_PICTURE, 1).await;
    peripheral.notify(TAKE_PICTURE, vec![0x00]);
    assert!(matches!(done.await.unwrap(), Err(Error::Device(_))));
}

#[tokio::test]
async fn disconnect_fails_a_pending_picture() {
    let (device, peripheral) = connected(image_mode_camera()).await;
    let shooting = device.shooting_control().unwrap();

    let (done, on_done) = outcome();
    shooting.take_picture(on_done);
    peripheral.wait_for_writes(TAKE_PICTURE, 1).await;
    device.disconnect().await.unwrap();
    assert!(matches!(done.await.unwrap(), Err(Error::NotConnected)));
}

#[tokio::test]
async fn unrepresentable_values_never_reach_the_camera() {
    let (device, peripheral) = connected(image_mode_camera()).await;
    let shooting = device.shooting_control().unwrap();

    let err = shooting.set_file_format(FileFormat::Reserved).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Codec(CodecError::ReservedValue { type_name: "FileFormat" })
    ));
    let err = shooting
        .set_capture_mode(CaptureMode::Interval)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Codec(CodecError::NotRepresentable { .. })));
    assert!(peripheral.writes().is_empty());

    shooting
        .set_file_format(FileFormat::ImageJpeg6720x3360)
        .await
        .unwrap();
    assert_eq!(
        peripheral.writes_to(ThetaCharacteristic::FileFormat),
        vec![vec![0x08]]
    );
}
