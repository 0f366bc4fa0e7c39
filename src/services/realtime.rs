use crate::models::notification::Notification;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::warn;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 16;

lazy_static! {
    // Process-local registry of per-user broadcast channels. A multi-instance
    // deployment only delivers events on the instance holding the connection.
    static ref CHANNELS: RwLock<HashMap<Uuid, broadcast::Sender<Notification>>> =
        RwLock::new(HashMap::new());
}

pub fn subscribe(user_id: Uuid) -> broadcast::Receiver<Notification> {
    let mut channels = match CHANNELS.write() {
        Ok(channels) => channels,
        Err(poisoned) => poisoned.into_inner(),
    };

    channels
        .entry(user_id)
        .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
        .subscribe()
}

pub fn publish(notification: &Notification) {
    let mut channels = match CHANNELS.write() {
        Ok(channels) => channels,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(sender) = channels.get(&notification.user_id) {
        match sender.send(notification.clone()) {
            Ok(_) => {}
            Err(_) => {
                // Last receiver disconnected; drop the channel.
                warn!(
                    "No live SSE subscribers for user {}, dropping channel",
                    notification.user_id
                );
                channels.remove(&notification.user_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationStatus;
    use chrono::Utc;

    fn sample_notification(user_id: Uuid) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            user_id,
            title: "Refund processed".to_string(),
            message: "Your refund has been processed".to_string(),
            notification_type: "refund".to_string(),
            link: None,
            status: NotificationStatus::Unread,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscriber_receives_published_notification() {
        let user_id = Uuid::new_v4();
        let mut rx = subscribe(user_id);

        let notification = sample_notification(user_id);
        publish(&notification);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, notification.id);
        assert_eq!(received.title, "Refund processed");
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_no_op() {
        // Must not panic or block.
        publish(&sample_notification(Uuid::new_v4()));
    }
}
