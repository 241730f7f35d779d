//! Offline order queue persistence.
//!
//! The calling application inserts a pending order when a write fails
//! offline. Replay consumes pending records in insertion order and
//! deletes each one only after the backend accepts it.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// Queue state of a stored order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Synced,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Synced => "synced",
        }
    }

    /// Parse a stored status string, treating anything unrecognized as
    /// pending so a record is retried rather than stranded.
    pub fn parse(s: &str) -> Self {
        match s {
            "synced" => OrderStatus::Synced,
            _ => OrderStatus::Pending,
        }
    }
}

/// An order captured while offline, waiting for replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: String,
    pub payload: serde_json::Value,
    pub status: OrderStatus,
    pub timestamp: String,
}

impl PendingOrder {
    /// Build a pending order stamped with the current time.
    pub fn new(id: &str, payload: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            payload,
            status: OrderStatus::Pending,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

fn order_from_row(row: &rusqlite::Row<'_>) -> Result<(String, String, String, String), rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn decode_order(raw: (String, String, String, String)) -> Result<PendingOrder, Error> {
    let (id, payload, status, timestamp) = raw;
    Ok(PendingOrder {
        id,
        payload: serde_json::from_str(&payload)?,
        status: OrderStatus::parse(&status),
        timestamp,
    })
}

impl StoreDb {
    /// Insert or replace an order record.
    pub async fn insert_order(&self, order: &PendingOrder) -> Result<(), Error> {
        let payload = serde_json::to_string(&order.payload)?;
        let order = order.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO orders (id, payload, status, timestamp)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        payload = excluded.payload,
                        status = excluded.status,
                        timestamp = excluded.timestamp",
                    params![order.id, payload, order.status.as_str(), order.timestamp],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// All pending orders, oldest first.
    ///
    /// Replay depends on this ordering to preserve submission order.
    pub async fn pending_orders(&self) -> Result<Vec<PendingOrder>, Error> {
        self.conn
            .call(move |conn| -> Result<Vec<PendingOrder>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT id, payload, status, timestamp FROM orders
                     WHERE status = 'pending'
                     ORDER BY timestamp ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map([], order_from_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter().map(decode_order).collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Get one order by id.
    pub async fn order(&self, id: &str) -> Result<Option<PendingOrder>, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<PendingOrder>, Error> {
                let mut stmt =
                    conn.prepare("SELECT id, payload, status, timestamp FROM orders WHERE id = ?1")?;

                let result = stmt.query_row(params![id], order_from_row);

                match result {
                    Ok(raw) => Ok(Some(decode_order(raw)?)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete an order after a successful replay.
    ///
    /// Returns false if the id was already gone.
    pub async fn delete_order(&self, id: &str) -> Result<bool, Error> {
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM orders WHERE id = ?1", params![id])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let order = PendingOrder::new("o1", json!({"items": [{"name": "pad thai", "qty": 2}]}));

        db.insert_order(&order).await.unwrap();

        let stored = db.order("o1").await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);
        assert_eq!(stored.payload["items"][0]["name"], "pad thai");
    }

    #[tokio::test]
    async fn test_pending_orders_sorted_by_insertion() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let mut first = PendingOrder::new("b", json!({"n": 1}));
        first.timestamp = "2026-01-01T10:00:00+00:00".to_string();
        let mut second = PendingOrder::new("a", json!({"n": 2}));
        second.timestamp = "2026-01-01T10:05:00+00:00".to_string();

        db.insert_order(&second).await.unwrap();
        db.insert_order(&first).await.unwrap();

        let pending = db.pending_orders().await.unwrap();
        let ids: Vec<&str> = pending.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_pending_excludes_synced() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        let mut done = PendingOrder::new("done", json!({}));
        done.status = OrderStatus::Synced;

        db.insert_order(&done).await.unwrap();
        db.insert_order(&PendingOrder::new("open", json!({}))).await.unwrap();

        let pending = db.pending_orders().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "open");
    }

    #[tokio::test]
    async fn test_delete_order() {
        let db = super::super::connection::StoreDb::open_in_memory().await.unwrap();
        db.insert_order(&PendingOrder::new("o1", json!({}))).await.unwrap();

        assert!(db.delete_order("o1").await.unwrap());
        assert!(!db.delete_order("o1").await.unwrap());
        assert!(db.order("o1").await.unwrap().is_none());
    }

    #[test]
    fn test_status_parse_unknown_is_pending() {
        assert_eq!(OrderStatus::parse("garbage"), OrderStatus::Pending);
        assert_eq!(OrderStatus::parse("synced"), OrderStatus::Synced);
    }
}
