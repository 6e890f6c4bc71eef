use crate::db::{Database, NOTIFICATIONS};
use crate::models::notification::Notification;
use bincode::{Decode, Encode};
use redb::ReadableTable;
use tracing::info;

#[derive(Debug, Encode, Decode)]
pub struct StoredNotification {
    pub id: String,
    pub recipient_id: String,
    pub sender: String,
    pub message: String,
    pub sent_at: i64, // Millisecond timestamp, preserves list ordering
    pub read: bool,
}

impl From<Notification> for StoredNotification {
    fn from(notification: Notification) -> Self {
        StoredNotification {
            id: notification.id,
            recipient_id: notification.recipient_id,
            sender: notification.sender,
            message: notification.message,
            sent_at: notification.sent_at.timestamp_millis(),
            read: notification.read,
        }
    }
}

impl From<StoredNotification> for Notification {
    fn from(stored: StoredNotification) -> Self {
        Notification {
            id: stored.id,
            recipient_id: stored.recipient_id,
            sender: stored.sender,
            message: stored.message,
            sent_at: chrono::DateTime::from_timestamp_millis(stored.sent_at)
                .unwrap_or_else(chrono::Utc::now),
            read: stored.read,
        }
    }
}

fn decode_notification(data: &[u8]) -> Result<Notification, String> {
    let (stored, _): (StoredNotification, usize) =
        bincode::decode_from_slice(data, bincode::config::standard())
            .map_err(|e| format!("Failed to decode notification: {}", e))?;
    Ok(Notification::from(stored))
}

pub struct NotificationRepository {
    db: Database,
}

impl NotificationRepository {
    pub fn new(db: Database) -> Self {
        NotificationRepository { db }
    }

    pub async fn create(&self, notification: Notification) -> Result<Notification, String> {
        let stored = StoredNotification::from(notification.clone());
        let encoded = bincode::encode_to_vec(&stored, bincode::config::standard())
            .map_err(|e| format!("Failed to encode notification: {}", e))?;

        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        {
            let mut notifications = txn
                .open_table(NOTIFICATIONS)
                .map_err(|e| format!("Failed to open notifications table: {}", e))?;
            notifications
                .insert(notification.id.as_str(), encoded.as_slice())
                .map_err(|e| format!("Failed to insert notification: {}", e))?;
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit notification insert: {}", e))?;

        info!(
            notification_id = %notification.id,
            recipient_id = %notification.recipient_id,
            "Notification stored"
        );

        Ok(notification)
    }

    /// Newest first, optionally capped.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Notification>, String> {
        let txn = self
            .db
            .db
            .begin_read()
            .map_err(|e| format!("Failed to begin read: {}", e))?;
        let notifications = txn
            .open_table(NOTIFICATIONS)
            .map_err(|e| format!("Failed to open notifications table: {}", e))?;

        let mut result = Vec::new();
        for entry in notifications.iter().map_err(|e| e.to_string())? {
            let (_, data) = entry.map_err(|e| e.to_string())?;
            let notification = decode_notification(data.value())?;
            if notification.recipient_id == user_id {
                result.push(notification);
            }
        }
        result.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        if let Some(limit) = limit {
            result.truncate(limit);
        }
        Ok(result)
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize, String> {
        Ok(self
            .list_for_user(user_id, None)
            .await?
            .iter()
            .filter(|n| !n.read)
            .count())
    }

    /// Sets read=true. Re-marking an already-read notification is a no-op.
    /// Returns false when the id does not exist.
    pub async fn mark_read(&self, id: &str) -> Result<bool, String> {
        let txn = self
            .db
            .db
            .begin_write()
            .map_err(|e| format!("Failed to begin write: {}", e))?;
        let found;
        {
            let mut notifications = txn
                .open_table(NOTIFICATIONS)
                .map_err(|e| format!("Failed to open notifications table: {}", e))?;

            let existing = match notifications
                .get(id)
                .map_err(|e| format!("Failed to get notification: {}", e))?
            {
                Some(data) => Some(decode_notification(data.value())?),
                None => None,
            };

            match existing {
                Some(mut notification) => {
                    found = true;
                    if !notification.read {
                        notification.read = true;
                        let stored = StoredNotification::from(notification);
                        let encoded =
                            bincode::encode_to_vec(&stored, bincode::config::standard())
                                .map_err(|e| format!("Failed to encode notification: {}", e))?;
                        notifications
                            .insert(id, encoded.as_slice())
                            .map_err(|e| format!("Failed to update notification: {}", e))?;
                    }
                }
                None => found = false,
            }
        }
        txn.commit()
            .map_err(|e| format!("Failed to commit mark-read: {}", e))?;

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn test_notification(recipient: &str, message: &str, age_minutes: i64) -> Notification {
        Notification {
            id: uuid::Uuid::new_v4().to_string(),
            recipient_id: recipient.to_string(),
            sender: "system".to_string(),
            message: message.to_string(),
            sent_at: Utc::now() - Duration::minutes(age_minutes),
            read: false,
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let db = Database::in_memory().unwrap();
        let repo = NotificationRepository::new(db);
        repo.create(test_notification("user-1", "oldest", 30)).await.unwrap();
        repo.create(test_notification("user-1", "newest", 1)).await.unwrap();
        repo.create(test_notification("user-1", "middle", 10)).await.unwrap();
        repo.create(test_notification("user-2", "other", 5)).await.unwrap();

        let all = repo.list_for_user("user-1", None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].message, "newest");
        assert_eq!(all[2].message, "oldest");

        let capped = repo.list_for_user("user-1", Some(2)).await.unwrap();
        assert_eq!(capped.len(), 2);
        assert_eq!(capped[1].message, "middle");
    }

    #[tokio::test]
    async fn test_unread_count_and_mark_read() {
        let db = Database::in_memory().unwrap();
        let repo = NotificationRepository::new(db);
        let first = repo.create(test_notification("user-1", "a", 2)).await.unwrap();
        repo.create(test_notification("user-1", "b", 1)).await.unwrap();

        assert_eq!(repo.unread_count("user-1").await.unwrap(), 2);

        assert!(repo.mark_read(&first.id).await.unwrap());
        assert_eq!(repo.unread_count("user-1").await.unwrap(), 1);

        // Idempotent: marking again neither errors nor reverts
        assert!(repo.mark_read(&first.id).await.unwrap());
        assert_eq!(repo.unread_count("user-1").await.unwrap(), 1);

        let listed = repo.list_for_user("user-1", None).await.unwrap();
        let marked = listed.iter().find(|n| n.id == first.id).unwrap();
        assert!(marked.read);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_id() {
        let db = Database::in_memory().unwrap();
        let repo = NotificationRepository::new(db);
        assert!(!repo.mark_read("missing").await.unwrap());
    }
}
