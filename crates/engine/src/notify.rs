//! Notification dispatcher.
//!
//! Turns inbound push payloads and replay outcomes into user-visible
//! notifications, and handles the user's interaction with them. Display
//! itself is the host's job, reached through [`Platform`](crate::Platform).

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::Engine;
use larder_core::Error;

/// Title every push notification is displayed under.
const PUSH_TITLE: &str = "Restaurant updates";

/// Body used when a push event arrives without a payload.
const DEFAULT_PUSH_BODY: &str = "Fresh updates from your restaurants are ready.";

/// Action id for the button that opens the app.
const EXPLORE_ACTION: &str = "explore";

/// Tag shared by replay-success notifications so repeats coalesce
/// instead of stacking up.
pub const ORDER_SUCCESS_TAG: &str = "order-success";

const PUSH_ICON: &str = "/icons/icon-192.png";
const PUSH_BADGE: &str = "/icons/badge-72.png";
const EXPLORE_ICON: &str = "/icons/checkmark.png";

/// A button attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Display options for a notification.
///
/// Every field is optional; hosts render whatever subset their
/// notification surface supports. Serialized form omits unset fields so
/// the wire shape stays minimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Vibration pattern in milliseconds (on, off, on, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibrate: Option<Vec<u32>>,

    /// Coalescing key: a new notification with the same tag replaces
    /// the old one instead of stacking.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Opaque payload handed back to the interaction handler.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<NotificationAction>,
}

/// A user's interaction with a displayed notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationClick {
    /// Tag of the notification that was clicked.
    pub tag: String,
    /// Action button id, or None when the notification body was clicked.
    #[serde(default)]
    pub action: Option<String>,
}

impl Engine {
    /// Handle an inbound push event.
    ///
    /// The payload text becomes the notification body; an absent or empty
    /// payload falls back to a fixed default message.
    pub async fn handle_push(&self, payload: Option<&str>) -> Result<(), Error> {
        let body = match payload {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => DEFAULT_PUSH_BODY.to_string(),
        };

        tracing::debug!("push received: {}", body);

        let options = NotificationOptions {
            body: Some(body),
            icon: Some(PUSH_ICON.to_string()),
            badge: Some(PUSH_BADGE.to_string()),
            vibrate: Some(vec![100, 50, 100]),
            data: Some(json!({
                "arrived_at": chrono::Utc::now().to_rfc3339(),
                "primary_key": 1,
            })),
            actions: vec![NotificationAction {
                action: EXPLORE_ACTION.to_string(),
                title: "Open the app".to_string(),
                icon: Some(EXPLORE_ICON.to_string()),
            }],
            ..Default::default()
        };

        self.platform.show_notification(PUSH_TITLE, options).await
    }

    /// Handle the user's interaction with a notification.
    ///
    /// Always closes the notification; the explore action additionally
    /// opens a window at the application root.
    pub async fn handle_notification_click(&self, click: &NotificationClick) -> Result<(), Error> {
        self.platform.close_notification(&click.tag).await?;

        if click.action.as_deref() == Some(EXPLORE_ACTION) {
            self.platform.open_window("/").await?;
        }

        Ok(())
    }

    /// Announce one successfully replayed order.
    ///
    /// Uses a fixed tag so a burst of replays collapses into a single
    /// visible notification. Display failures are logged, not propagated:
    /// the order is already delivered and must stay deleted.
    pub(crate) async fn notify_order_synced(&self, order_id: &str) {
        let options = NotificationOptions {
            body: Some(format!("Order {order_id} was submitted.")),
            icon: Some(PUSH_ICON.to_string()),
            tag: Some(ORDER_SUCCESS_TAG.to_string()),
            data: Some(json!({ "order_id": order_id })),
            ..Default::default()
        };

        if let Err(e) = self.platform.show_notification("Order synced", options).await {
            tracing::warn!("could not show order-success notification for {}: {}", order_id, e);
        }
    }
}
