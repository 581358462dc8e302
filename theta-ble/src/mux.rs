//! Notification multiplexer
//!
//! One transport observation per characteristic, owned for the lifetime of a
//! connection. Each observation feeds a dispatcher task that forwards raw
//! values to whatever callback currently sits in the characteristic's slot,
//! or drops them when the slot is empty.
//!
//! The dispatcher holds the slot lock while it runs the callback, so once
//! [`NotificationMultiplexer::set_callback`] returns, the previous callback
//! will not be called again. Callbacks must not block.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use data_encoding::HEXLOWER;
use futures::StreamExt;
use futures::future::join_all;
use theta_proto::ThetaCharacteristic;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Feature, Operation, Result};
use crate::transport::{NotificationStream, Peripheral};

/// Receives raw values (or transport failures) of one characteristic
pub type SlotCallback = Box<dyn Fn(Result<Vec<u8>>) + Send + Sync>;

type Slot = Arc<Mutex<Option<SlotCallback>>>;

struct Subscription {
    slot: Slot,
    task: JoinHandle<()>,
}

pub struct NotificationMultiplexer {
    peripheral: Arc<dyn Peripheral>,
    timeout: Duration,
    subscriptions: Mutex<HashMap<ThetaCharacteristic, Subscription>>,
    released: AtomicBool,
}

impl NotificationMultiplexer {
    pub fn new(peripheral: Arc<dyn Peripheral>, timeout: Duration) -> Self {
        Self {
            peripheral,
            timeout,
            subscriptions: Mutex::new(HashMap::new()),
            released: AtomicBool::new(false),
        }
    }

    /// Create a multiplexer observing every characteristic of `always_on`
    /// that the peripheral exposes. Unsupported ones are skipped.
    pub async fn open(
        peripheral: Arc<dyn Peripheral>,
        timeout: Duration,
        always_on: &[ThetaCharacteristic],
    ) -> Result<Self> {
        let mux = Self::new(peripheral, timeout);
        for &characteristic in always_on {
            if !mux.peripheral.supports_characteristic(characteristic.uuid()) {
                trace!(%characteristic, "not exposed, skipping");
                continue;
            }
            if let Err(e) = mux.register(characteristic).await {
                mux.release().await;
                return Err(e);
            }
        }
        Ok(mux)
    }

    /// Start observing `characteristic`. Registering twice is a no-op.
    pub async fn register(&self, characteristic: ThetaCharacteristic) -> Result<()> {
        if self.released.load(Ordering::Acquire) {
            return Err(Error::NotConnected);
        }
        if !self.peripheral.supports_characteristic(characteristic.uuid()) {
            return Err(Error::Unsupported(Feature::Characteristic(characteristic)));
        }

        let mut subscriptions = self.subscriptions.lock().await;
        // release may have drained the map while we waited for the lock
        if self.released.load(Ordering::Acquire) {
            return Err(Error::NotConnected);
        }
        if subscriptions.contains_key(&characteristic) {
            return Ok(());
        }

        let stream = tokio::time::timeout(
            self.timeout,
            self.peripheral.observe(characteristic.uuid()),
        )
        .await
        .map_err(|_| Error::Timeout(Operation::Observe(characteristic)))??;

        let slot: Slot = Arc::new(Mutex::new(None));
        let task = tokio::spawn(dispatch(characteristic, stream, slot.clone()));
        subscriptions.insert(characteristic, Subscription { slot, task });
        debug!(%characteristic, "notification registered");
        Ok(())
    }

    /// Stop observing `characteristic` and drop its slot. The unsubscribe
    /// completes before this returns, so registering again right after
    /// cannot be undone by a late unsubscribe.
    pub async fn unregister(&self, characteristic: ThetaCharacteristic) {
        let removed = self.subscriptions.lock().await.remove(&characteristic);
        if let Some(subscription) = removed {
            stop(subscription).await;
            unobserve(self.peripheral.clone(), characteristic, self.timeout).await;
            debug!(%characteristic, "notification unregistered");
        }
    }

    /// Replace the callback of a registered characteristic. `None` stops
    /// delivery but keeps the transport observation alive.
    pub async fn set_callback(
        &self,
        characteristic: ThetaCharacteristic,
        callback: Option<SlotCallback>,
    ) -> Result<()> {
        let slot = self
            .subscriptions
            .lock()
            .await
            .get(&characteristic)
            .map(|s| s.slot.clone())
            .ok_or(Error::Unsupported(Feature::Characteristic(characteristic)))?;
        *slot.lock().await = callback;
        Ok(())
    }

    #[cfg(test)]
    pub async fn is_registered(&self, characteristic: ThetaCharacteristic) -> bool {
        self.subscriptions.lock().await.contains_key(&characteristic)
    }

    pub async fn active_subscriptions(&self) -> usize {
        self.subscriptions.lock().await.len()
    }

    /// Cancel every observation. Safe to call more than once.
    ///
    /// Unsubscribes run concurrently and finish before this returns, so none
    /// of them can land on the observations of a later connection.
    pub async fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        let drained: Vec<_> = self.subscriptions.lock().await.drain().collect();
        let count = drained.len();
        let mut characteristics = Vec::with_capacity(count);
        for (characteristic, subscription) in drained {
            stop(subscription).await;
            characteristics.push(characteristic);
        }
        join_all(
            characteristics
                .into_iter()
                .map(|c| unobserve(self.peripheral.clone(), c, self.timeout)),
        )
        .await;
        debug!(count, "notification multiplexer released");
    }
}

impl Drop for NotificationMultiplexer {
    fn drop(&mut self) {
        for subscription in self.subscriptions.get_mut().values() {
            subscription.task.abort();
        }
    }
}

/// Best-effort unsubscribe, failures are only traced
async fn unobserve(
    peripheral: Arc<dyn Peripheral>,
    characteristic: ThetaCharacteristic,
    timeout: Duration,
) {
    match tokio::time::timeout(timeout, peripheral.unobserve(characteristic.uuid())).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => trace!(%characteristic, %error, "unsubscribe failed"),
        Err(_) => trace!(%characteristic, "unsubscribe timed out"),
    }
}

async fn stop(subscription: Subscription) {
    subscription.task.abort();
    let _ = subscription.task.await;
}

async fn dispatch(characteristic: ThetaCharacteristic, mut stream: NotificationStream, slot: Slot) {
    while let Some(item) = stream.next().await {
        let slot = slot.lock().await;
        let Some(callback) = slot.as_ref() else {
            trace!(%characteristic, "no callback set, dropping notification");
            continue;
        };
        match &item {
            Ok(value) => trace!(%characteristic, payload = %HEXLOWER.encode(value), "notification"),
            Err(error) => warn!(%characteristic, %error, "notification stream error"),
        }
        callback(item.map_err(Error::from));
    }
    debug!(%characteristic, "notification stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPeripheral;
    use theta_proto::{ALWAYS_ON_NOTIFICATIONS, ThetaService};
    use tokio::sync::mpsc;

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn collector() -> (SlotCallback, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let callback: SlotCallback = Box::new(move |value: Result<Vec<u8>>| {
            let _ = tx.send(value.unwrap());
        });
        (callback, rx)
    }

    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    async fn connected_status_peripheral() -> Arc<MockPeripheral> {
        let peripheral =
            Arc::new(MockPeripheral::new().with_service(ThetaService::CameraStatusCommand));
        peripheral.connect().await.unwrap();
        peripheral
    }

    async fn open(peripheral: &Arc<MockPeripheral>) -> NotificationMultiplexer {
        NotificationMultiplexer::open(peripheral.clone(), TIMEOUT, ALWAYS_ON_NOTIFICATIONS)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn open_skips_unsupported_characteristics() {
        let peripheral = connected_status_peripheral().await;
        let mux = open(&peripheral).await;

        // five of the always-on characteristics live in the status service
        assert_eq!(mux.active_subscriptions().await, 5);
        assert!(mux.is_registered(ThetaCharacteristic::BatteryLevel).await);
        assert!(!mux.is_registered(ThetaCharacteristic::StateNotify).await);

        let err = mux
            .set_callback(ThetaCharacteristic::StateNotify, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[tokio::test]
    async fn delivers_in_transport_order() {
        let peripheral = connected_status_peripheral().await;
        let mux = open(&peripheral).await;
        let (callback, mut rx) = collector();
        mux.set_callback(ThetaCharacteristic::BatteryLevel, Some(callback))
            .await
            .unwrap();

        for level in [10u8, 20, 30] {
            peripheral.notify(ThetaCharacteristic::BatteryLevel, vec![level]);
        }
        for level in [10u8, 20, 30] {
            assert_eq!(rx.recv().await.unwrap(), vec![level]);
        }
    }

    #[tokio::test]
    async fn clearing_and_resetting_reuses_the_observation() {
        let peripheral = connected_status_peripheral().await;
        let mux = open(&peripheral).await;
        let c = ThetaCharacteristic::CameraPower;

        mux.set_callback(c, None).await.unwrap();
        mux.set_callback(c, None).await.unwrap();

        let (first, mut first_rx) = collector();
        mux.set_callback(c, Some(first)).await.unwrap();
        mux.set_callback(c, None).await.unwrap();
        peripheral.notify(c, vec![1]);
        settle().await;

        let (second, mut second_rx) = collector();
        mux.set_callback(c, Some(second)).await.unwrap();
        peripheral.notify(c, vec![2]);

        assert_eq!(second_rx.recv().await.unwrap(), vec![2]);
        assert!(first_rx.try_recv().is_err());
        assert_eq!(peripheral.observe_calls(c), 1);
        assert_eq!(peripheral.live_observers(c), 1);
    }

    #[tokio::test]
    async fn register_twice_is_a_no_op() {
        let peripheral = connected_status_peripheral().await;
        let mux = NotificationMultiplexer::new(peripheral.clone(), TIMEOUT);
        mux.register(ThetaCharacteristic::PluginControl).await.unwrap();
        mux.register(ThetaCharacteristic::PluginControl).await.unwrap();
        assert_eq!(peripheral.observe_calls(ThetaCharacteristic::PluginControl), 1);

        let err = mux.register(ThetaCharacteristic::ScannedSsid).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));

        mux.unregister(ThetaCharacteristic::PluginControl).await;
        assert_eq!(mux.active_subscriptions().await, 0);
        assert_eq!(peripheral.live_observers(ThetaCharacteristic::PluginControl), 0);
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let peripheral = connected_status_peripheral().await;
        let mux = open(&peripheral).await;
        mux.release().await;
        mux.release().await;

        assert_eq!(mux.active_subscriptions().await, 0);
        assert_eq!(peripheral.total_live_observers(), 0);
        assert!(matches!(
            mux.register(ThetaCharacteristic::BatteryLevel).await,
            Err(Error::NotConnected)
        ));
    }

    #[tokio::test]
    async fn register_waiting_on_a_release_does_not_subscribe() {
        let peripheral = connected_status_peripheral().await;
        let mux = NotificationMultiplexer::new(peripheral.clone(), TIMEOUT);

        let guard = mux.subscriptions.lock().await;
        let register = mux.register(ThetaCharacteristic::BatteryLevel);
        tokio::pin!(register);
        assert!(futures::poll!(register.as_mut()).is_pending());

        // released while the register call sat behind the lock
        mux.released.store(true, Ordering::Release);
        drop(guard);

        assert!(matches!(register.await, Err(Error::NotConnected)));
        assert_eq!(mux.active_subscriptions().await, 0);
        assert_eq!(peripheral.observe_calls(ThetaCharacteristic::BatteryLevel), 0);
    }

    #[tokio::test]
    async fn transport_errors_reach_the_callback() {
        let peripheral = connected_status_peripheral().await;
        let mux = open(&peripheral).await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        mux.set_callback(
            ThetaCharacteristic::BatteryStatus,
            Some(Box::new(move |value: Result<Vec<u8>>| {
                let _ = tx.send(value.is_err());
            })),
        )
        .await
        .unwrap();

        peripheral.notify_error(ThetaCharacteristic::BatteryStatus, "link lost");
        peripheral.notify(ThetaCharacteristic::BatteryStatus, vec![0]);
        assert!(rx.recv().await.unwrap());
        assert!(!rx.recv().await.unwrap());
    }
}
