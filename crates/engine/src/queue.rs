//! Offline order replay.
//!
//! The calling application inserts a pending order through
//! [`StoreDb::insert_order`](larder_core::StoreDb::insert_order) when a
//! write fails offline; this module drains those records once the host
//! delivers the deferred-sync event.

use crate::engine::Engine;
use larder_core::Error;

/// Outcome of one replay batch.
#[derive(Debug, Clone, Default)]
pub struct ReplayReport {
    /// Ids delivered to the backend and removed from the store.
    pub replayed: Vec<String>,
    /// Ids that stay pending for the next sync opportunity.
    pub retained: Vec<String>,
}

impl ReplayReport {
    /// True when every pending record was delivered.
    pub fn is_complete(&self) -> bool {
        self.retained.is_empty()
    }
}

impl Engine {
    /// Replay pending orders for a deferred-sync event.
    ///
    /// Records are processed strictly in submission order, one at a time.
    /// Each is POSTed to the configured orders path; a 2xx deletes the
    /// record and announces it, anything else leaves the record untouched
    /// and moves on — one bad record never blocks the rest of the queue.
    ///
    /// When records remain after the batch, the sync tag is registered
    /// again so the next connectivity signal retries them. Events carrying
    /// a different tag are ignored.
    pub async fn handle_sync(&self, tag: &str) -> Result<ReplayReport, Error> {
        if tag != self.config.sync_tag {
            tracing::debug!("ignoring sync event with unknown tag {}", tag);
            return Ok(ReplayReport::default());
        }

        let pending = self.store.pending_orders().await?;
        tracing::info!("replaying {} pending orders", pending.len());

        let mut report = ReplayReport::default();
        for order in pending {
            match self.gateway.post_json(&self.config.orders_path, &order.payload).await {
                Ok(response) if response.is_ok() => {
                    match self.store.delete_order(&order.id).await {
                        Ok(_) => {
                            self.notify_order_synced(&order.id).await;
                            report.replayed.push(order.id);
                        }
                        Err(e) => {
                            // Delivered but not deleted: keep it visible as
                            // retained so the caller knows the store is ill.
                            tracing::error!("order {} delivered but not deleted: {}", order.id, e);
                            report.retained.push(order.id);
                        }
                    }
                }
                Ok(response) => {
                    tracing::warn!("replay of order {} rejected with status {}", order.id, response.status);
                    report.retained.push(order.id);
                }
                Err(e) => {
                    tracing::warn!("replay of order {} failed: {}", order.id, e);
                    report.retained.push(order.id);
                }
            }
        }

        if !report.is_complete() {
            tracing::info!("{} orders retained; re-arming sync registration", report.retained.len());
            if let Err(e) = self.platform.register_sync(&self.config.sync_tag).await {
                tracing::warn!("sync re-registration failed: {}", e);
            }
        }

        Ok(report)
    }
}
