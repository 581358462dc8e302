use tracing::info;

use crate::config::Timeout;
use crate::device::ThetaDevice;
use crate::error::{Error, Operation, Result};
use crate::transport::Transport;

/// Scan for cameras. With `name`, returns as soon as that camera is seen.
///
/// Every device shares `timeout`; the scan itself is bounded by
/// `timeout.scan`.
pub async fn discover(
    transport: &dyn Transport,
    name: Option<&str>,
    timeout: Timeout,
) -> Result<Vec<ThetaDevice>> {
    let limit = timeout.scan + timeout.connect;
    let advertisements = tokio::time::timeout(limit, transport.discover(name, timeout.scan))
        .await
        .map_err(|_| Error::Timeout(Operation::Discover))??;

    info!(count = advertisements.len(), "cameras found");
    Ok(advertisements
        .into_iter()
        .map(|advertisement| ThetaDevice::new(advertisement, timeout))
        .collect())
}

/// Find a single camera by its advertised name
pub async fn find(
    transport: &dyn Transport,
    name: &str,
    timeout: Timeout,
) -> Result<Option<ThetaDevice>> {
    let mut found = discover(transport, Some(name), timeout).await?;
    Ok(found
        .iter()
        .position(|d| d.name() == name)
        .map(|i| found.swap_remove(i)))
}
