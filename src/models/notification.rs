use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "notification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Unread,
    Read,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub link: Option<String>,
    pub status: NotificationStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub link: Option<String>,
}

impl Notification {
    pub async fn create(
        pool: &DbPool,
        notification: CreateNotification,
    ) -> Result<Self, NotificationError> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, user_id, title, message, notification_type, link, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(notification.title)
        .bind(notification.message)
        .bind(notification.notification_type)
        .bind(notification.link)
        .bind(NotificationStatus::Unread)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    pub async fn find_by_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_read(
        pool: &DbPool,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, NotificationError> {
        let notification = sqlx::query_as::<_, Notification>(
            "UPDATE notifications SET status = 'read', read_at = $3
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(NotificationError::NotFound { id })?;

        Ok(notification)
    }

    pub async fn mark_all_read(pool: &DbPool, user_id: Uuid) -> Result<u64, NotificationError> {
        let result = sqlx::query(
            "UPDATE notifications SET status = 'read', read_at = $2
             WHERE user_id = $1 AND status = 'unread'",
        )
        .bind(user_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub fn is_read(&self) -> bool {
        self.status == NotificationStatus::Read || self.read_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unread() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Refund declined".to_string(),
            message: "Your refund request was declined".to_string(),
            notification_type: "refund_decision".to_string(),
            link: None,
            status: NotificationStatus::Unread,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn read_state_derives_from_status_or_timestamp() {
        let mut notification = unread();
        assert!(!notification.is_read());

        notification.read_at = Some(Utc::now());
        assert!(notification.is_read());

        notification.read_at = None;
        notification.status = NotificationStatus::Read;
        assert!(notification.is_read());
    }
}
