use crate::database::connection::DbPool;
use crate::models::booking::Booking;
use crate::models::notification::{CreateNotification, Notification};
use crate::models::refund::Refund;
use crate::models::user::User;
use crate::services::email::EmailService;
use crate::services::realtime;
use crate::services::sms::SmsService;
use tracing::{info, warn};
use uuid::Uuid;

/// Best-effort fan-out after a state transition: persist the in-app row,
/// push it over SSE, then email/SMS. Only the database insert is reported
/// back to the caller; outbound failures are logged and swallowed.
pub async fn notify_refund_requested(pool: &DbPool, booking: &Booking, refund: &Refund) {
    let provider_user = match provider_user_for_booking(pool, booking).await {
        Some(user) => user,
        None => return,
    };

    let title = "New refund request".to_string();
    let message = format!(
        "A refund of PHP {} was requested for the booking for {}.",
        refund.amount, booking.pet_name
    );
    let link = Some(format!("/provider/refunds/{}", refund.id));

    persist_and_broadcast(pool, provider_user.id, &title, &message, "refund_request", link).await;

    match EmailService::new() {
        Ok(email) => {
            let template = email.refund_requested_template(
                &provider_user.full_name(),
                &booking.pet_name,
                refund.amount,
            );
            if let Err(e) = email.send_email(
                &provider_user.email,
                Some(&provider_user.full_name()),
                template,
            ) {
                warn!("Failed to email provider about refund request: {}", e);
            }
        }
        Err(e) => warn!("Email service unavailable: {}", e),
    }
}

pub async fn notify_refund_decided(
    pool: &DbPool,
    booking: &Booking,
    refund: &Refund,
    approved: bool,
) {
    let requester = match User::find_by_id(pool, refund.user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Refund requester {} no longer exists", refund.user_id);
            return;
        }
        Err(e) => {
            warn!("Failed to load refund requester: {}", e);
            return;
        }
    };

    let (title, message) = if approved {
        (
            "Refund processed".to_string(),
            format!(
                "Your refund of PHP {} for {} has been processed.",
                refund.amount, booking.pet_name
            ),
        )
    } else {
        (
            "Refund declined".to_string(),
            format!(
                "Your refund request of PHP {} for {} was declined.",
                refund.amount, booking.pet_name
            ),
        )
    };
    let link = Some(format!("/bookings/{}", booking.id));

    persist_and_broadcast(pool, requester.id, &title, &message, "refund_decision", link).await;

    match EmailService::new() {
        Ok(email) => {
            let template = email.refund_decided_template(
                &requester.full_name(),
                &booking.pet_name,
                refund.amount,
                approved,
                refund.notes.as_deref(),
            );
            if let Err(e) =
                email.send_email(&requester.email, Some(&requester.full_name()), template)
            {
                warn!("Failed to email requester about refund decision: {}", e);
            }
        }
        Err(e) => warn!("Email service unavailable: {}", e),
    }

    if let Some(phone) = requester.phone.as_deref() {
        match SmsService::new() {
            Ok(sms) => {
                if let Err(e) = sms.send_sms(phone, &message).await {
                    warn!("Failed to SMS requester about refund decision: {}", e);
                }
            }
            Err(e) => warn!("SMS service unavailable: {}", e),
        }
    }
}

pub async fn notify_booking_status(pool: &DbPool, booking: &Booking, headline: &str) {
    let message = format!("{} (booking for {}).", headline, booking.pet_name);
    let link = Some(format!("/bookings/{}", booking.id));

    persist_and_broadcast(pool, booking.user_id, headline, &message, "booking", link).await;
}

async fn persist_and_broadcast(
    pool: &DbPool,
    user_id: Uuid,
    title: &str,
    message: &str,
    notification_type: &str,
    link: Option<String>,
) {
    let create = CreateNotification {
        user_id,
        title: title.to_string(),
        message: message.to_string(),
        notification_type: notification_type.to_string(),
        link,
    };

    match Notification::create(pool, create).await {
        Ok(notification) => {
            realtime::publish(&notification);
            info!("Notification {} stored for user {}", notification.id, user_id);
        }
        Err(e) => warn!("Failed to store notification for user {}: {}", user_id, e),
    }
}

async fn provider_user_for_booking(pool: &DbPool, booking: &Booking) -> Option<User> {
    use crate::models::provider::ServiceProvider;

    let provider = match ServiceProvider::find_by_id(pool, booking.provider_id).await {
        Ok(Some(provider)) => provider,
        Ok(None) => {
            warn!("Provider {} not found for booking {}", booking.provider_id, booking.id);
            return None;
        }
        Err(e) => {
            warn!("Failed to load provider for booking {}: {}", booking.id, e);
            return None;
        }
    };

    match User::find_by_id(pool, provider.user_id).await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            warn!("Provider user {} not found", provider.user_id);
            None
        }
        Err(e) => {
            warn!("Failed to load provider user: {}", e);
            None
        }
    }
}
