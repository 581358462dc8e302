//! Time-boxed scans driven through a dynamic notification
//!
//! A scan writes a start command, collects items pushed on its notification
//! characteristic and ends when its timer fires, when it is stopped, or when
//! the session goes away. Whichever comes first, the worker task runs the
//! stop sequence and reports completion exactly once.

use std::sync::Arc;
use std::time::Duration;

use theta_proto::{BleDecode, ThetaCharacteristic};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::link::{Link, decode_notification};
use crate::mux::SlotCallback;

pub type ItemCallback<T> = Box<dyn FnMut(Result<T>) + Send>;
pub type CompletedCallback<T> = Box<dyn FnOnce(Result<Vec<T>>) + Send>;

/// Characteristics and stop command of one kind of scan
pub(crate) struct ScanCommands {
    pub name: &'static str,
    pub start: ThetaCharacteristic,
    pub stop: ThetaCharacteristic,
    pub stop_payload: &'static [u8],
    pub items: ThetaCharacteristic,
}

struct ActiveScan {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

pub(crate) struct Scanner<T> {
    link: Arc<Link>,
    commands: ScanCommands,
    identity: fn(&T) -> &str,
    active: Mutex<Option<ActiveScan>>,
}

impl<T> Scanner<T>
where
    T: BleDecode + Clone + Send + 'static,
{
    pub fn new(link: Arc<Link>, commands: ScanCommands, identity: fn(&T) -> &str) -> Self {
        Self {
            link,
            commands,
            identity,
            active: Mutex::new(None),
        }
    }

    /// Start a scan, stopping any scan that is still running
    pub async fn start(
        &self,
        timeout: Duration,
        start_payload: &[u8],
        on_item: ItemCallback<T>,
        on_completed: CompletedCallback<T>,
    ) -> Result<()> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            debug!(scan = self.commands.name, "stopping previous scan");
            previous.finish().await;
        }
        self.link.ensure_connected()?;

        let items = self.commands.items;
        let mux = self.link.mux();
        mux.register(items).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let forward: SlotCallback = Box::new(move |item: Result<Vec<u8>>| {
            let _ = tx.send(item);
        });
        if let Err(e) = mux.set_callback(items, Some(forward)).await {
            mux.unregister(items).await;
            return Err(e);
        }
        if let Err(e) = self.link.write_raw(self.commands.start, start_payload).await {
            let _ = mux.set_callback(items, None).await;
            mux.unregister(items).await;
            return Err(e);
        }
        debug!(scan = self.commands.name, ?timeout, "scan started");

        let (stop, stopped) = oneshot::channel();
        let worker = Worker {
            link: self.link.clone(),
            name: self.commands.name,
            stop: self.commands.stop,
            stop_payload: self.commands.stop_payload,
            items,
            identity: self.identity,
        };
        let task = tokio::spawn(worker.run(timeout, rx, stopped, on_item, on_completed));
        *active = Some(ActiveScan { stop, task });
        Ok(())
    }

    /// Stop the running scan. Completion is reported before this returns.
    pub async fn stop(&self) {
        let active = self.active.lock().await.take();
        if let Some(active) = active {
            active.finish().await;
        }
    }

    /// Scan for `timeout` and return everything seen
    pub async fn collect(&self, timeout: Duration, start_payload: &[u8]) -> Result<Vec<T>> {
        let (tx, rx) = oneshot::channel();
        self.start(
            timeout,
            start_payload,
            Box::new(|_: Result<T>| {}),
            Box::new(move |result: Result<Vec<T>>| {
                let _ = tx.send(result);
            }),
        )
        .await?;
        rx.await.map_err(|_| Error::NotConnected)?
    }
}

impl ActiveScan {
    async fn finish(self) {
        let _ = self.stop.send(());
        if let Err(error) = self.task.await {
            warn!(%error, "scan worker failed");
        }
    }
}

struct Worker<T> {
    link: Arc<Link>,
    name: &'static str,
    stop: ThetaCharacteristic,
    stop_payload: &'static [u8],
    items: ThetaCharacteristic,
    identity: fn(&T) -> &str,
}

impl<T: BleDecode + Clone + Send + 'static> Worker<T> {
    async fn run(
        self,
        timeout: Duration,
        mut rx: mpsc::UnboundedReceiver<Result<Vec<u8>>>,
        mut stopped: oneshot::Receiver<()>,
        mut on_item: ItemCallback<T>,
        on_completed: CompletedCallback<T>,
    ) {
        let mut found: Vec<T> = Vec::new();
        let timer = tokio::time::sleep(timeout);
        tokio::pin!(timer);

        let disconnected = loop {
            tokio::select! {
                Some(raw) = rx.recv() => {
                    let item = raw.and_then(|value| decode_notification::<T>(self.items, &value));
                    match item {
                        Ok(item) => {
                            on_item(Ok(item.clone()));
                            self.upsert(&mut found, item);
                        }
                        Err(e) => on_item(Err(e)),
                    }
                }
                _ = &mut timer => break false,
                _ = &mut stopped => break false,
                _ = self.link.closed() => break true,
            }
        };

        let result = self.finish(disconnected).await.map(|()| found);
        debug!(scan = self.name, ok = result.is_ok(), "scan completed");
        on_completed(result);
    }

    /// Replace an entry with the same identity in place, else append
    fn upsert(&self, found: &mut Vec<T>, item: T) {
        let key = (self.identity)(&item);
        match found.iter().position(|f| (self.identity)(f) == key) {
            Some(i) => found[i] = item,
            None => found.push(item),
        }
    }

    /// Only a lost session fails the scan. A rejected stop command still
    /// completes with what was collected.
    async fn finish(&self, disconnected: bool) -> Result<()> {
        let stopped = if disconnected {
            Err(Error::NotConnected)
        } else {
            if let Err(error) = self.link.write_raw(self.stop, self.stop_payload).await {
                warn!(scan = self.name, %error, "stop command failed");
            }
            Ok(())
        };
        let _ = self.link.mux().set_callback(self.items, None).await;
        self.link.mux().unregister(self.items).await;
        stopped
    }
}
