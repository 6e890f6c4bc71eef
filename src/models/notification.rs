use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Sender of a system-originated notification.
pub const SYSTEM_SENDER: &str = "system";

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    /// User id of the sender, or `"system"`.
    pub sender: String,
    pub message: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}
