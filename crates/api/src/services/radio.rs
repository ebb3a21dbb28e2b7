//! Beacon radio drivers.
//!
//! With the `bridge` provider an external process owns the radio and posts
//! power changes and advertisements to the HTTP API. With the `bluetooth`
//! provider (feature `bluetooth`) the host adapter is driven directly.

/// Rebuilds the manufacturer payload in CoreBluetooth layout: the company
/// identifier little endian, followed by the vendor bytes.
pub fn manufacturer_payload(company_id: u16, data: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(data.len() + 2);
    payload.extend_from_slice(&company_id.to_le_bytes());
    payload.extend_from_slice(data);
    payload
}

#[cfg(feature = "bluetooth")]
pub use bluetooth::spawn_bluetooth_radio;

#[cfg(feature = "bluetooth")]
mod bluetooth {
    use std::time::Duration;

    use bluest::{Adapter, AdvertisingDevice};
    use domain::models::Advertisement;
    use futures::StreamExt;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;
    use tracing::{info, warn};

    use super::manufacturer_payload;
    use crate::services::tracker::Tracker;

    fn advertisement(device: &AdvertisingDevice) -> Advertisement {
        Advertisement {
            beacon_id: format!("{:?}", device.device.id()),
            name: device.adv_data.local_name.clone(),
            rssi: device.rssi.unwrap_or(i16::MIN),
            manufacturer_data: device
                .adv_data
                .manufacturer_data
                .as_ref()
                .map(|m| manufacturer_payload(m.company_id, &m.data)),
        }
    }

    /// Drives the default adapter until the task is aborted.
    pub fn spawn_bluetooth_radio(tracker: Tracker, retry: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(e) = drive(&tracker).await {
                    warn!(error = %e, "Bluetooth radio error");
                }
                tracker.set_radio_powered(false).await;
                sleep(retry).await;
            }
        })
    }

    async fn drive(tracker: &Tracker) -> Result<(), bluest::Error> {
        let Some(adapter) = Adapter::default().await else {
            warn!("No Bluetooth adapter found");
            return Ok(());
        };
        adapter.wait_available().await?;
        tracker.set_radio_powered(true).await;
        info!("Bluetooth adapter available");

        let mut scan_requested = tracker.watch_scan_requested();
        loop {
            while !*scan_requested.borrow_and_update() {
                if scan_requested.changed().await.is_err() {
                    return Ok(());
                }
            }

            let stream = adapter.scan(&[]).await?;
            let mut stream = std::pin::pin!(stream);
            loop {
                tokio::select! {
                    device = stream.next() => match device {
                        Some(device) => {
                            tracker.ingest(&[advertisement(&device)]).await;
                        }
                        // The adapter went away mid-scan.
                        None => return Ok(()),
                    },
                    changed = scan_requested.changed() => {
                        if changed.is_err() || !*scan_requested.borrow() {
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manufacturer_payload_layout() {
        let payload = manufacturer_payload(0x004C, &[0xC8, 0x01]);
        assert_eq!(payload, vec![0x4C, 0x00, 0xC8, 0x01]);
    }

    #[test]
    fn test_manufacturer_payload_without_vendor_bytes() {
        assert_eq!(manufacturer_payload(0x0102, &[]), vec![0x02, 0x01]);
    }
}
