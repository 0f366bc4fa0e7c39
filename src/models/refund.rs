use crate::database::connection::DbPool;
use crate::models::booking::{PaymentMethod, PaymentStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum RefundError {
    #[error("Refund with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Booking payment status is {status:?}; only paid bookings can be refunded")]
    BookingNotRefundable { status: PaymentStatus },
    #[error("Booking {booking_id} already has an active refund")]
    ActiveRefundExists { booking_id: Uuid },
    #[error("Refund is {from:?}; cannot {action}")]
    InvalidTransition { from: RefundStatus, action: RefundAction },
    #[error("No confirmed payment receipt on file for this booking")]
    ReceiptNotConfirmed,
    #[error("Retry is only supported for gcash refunds in pending or failed status")]
    RetryNotSupported,
    #[error("Payment gateway error: {0}")]
    Gateway(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "refund_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl RefundStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefundStatus::Completed | RefundStatus::Failed | RefundStatus::Cancelled
        )
    }

    pub fn can_approve(&self) -> bool {
        matches!(self, RefundStatus::Pending | RefundStatus::Processing)
    }

    pub fn can_reject(&self) -> bool {
        matches!(self, RefundStatus::Pending | RefundStatus::Processing)
    }

    pub fn can_reset(&self) -> bool {
        matches!(
            self,
            RefundStatus::Failed | RefundStatus::Pending | RefundStatus::Processing
        )
    }

    pub fn can_cancel(&self) -> bool {
        matches!(self, RefundStatus::Pending)
    }

    pub fn can_retry(&self, method: PaymentMethod) -> bool {
        method == PaymentMethod::Gcash
            && matches!(self, RefundStatus::Pending | RefundStatus::Failed)
    }
}

impl FromStr for RefundStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RefundStatus::Pending),
            "processing" => Ok(RefundStatus::Processing),
            "completed" => Ok(RefundStatus::Completed),
            "failed" => Ok(RefundStatus::Failed),
            "cancelled" => Ok(RefundStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundAction {
    Approve,
    Reject,
    Reset,
    Cancel,
}

impl std::fmt::Display for RefundAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RefundAction::Approve => "approve",
            RefundAction::Reject => "reject",
            RefundAction::Reset => "reset",
            RefundAction::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

impl FromStr for RefundAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(RefundAction::Approve),
            "reject" => Ok(RefundAction::Reject),
            "reset" => Ok(RefundAction::Reset),
            "cancel" => Ok(RefundAction::Cancel),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Refund {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub amount: Decimal,
    pub reason: String,
    pub status: RefundStatus,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub processed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let refund = sqlx::query_as::<_, Refund>("SELECT * FROM refunds WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(refund)
    }

    pub async fn find_active_for_booking(
        pool: &DbPool,
        booking_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let refund = sqlx::query_as::<_, Refund>(
            "SELECT * FROM refunds WHERE booking_id = $1 AND status NOT IN ('completed', 'failed', 'cancelled')",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;

        Ok(refund)
    }

    pub async fn find_by_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let refunds = sqlx::query_as::<_, Refund>(
            "SELECT * FROM refunds WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(refunds)
    }

    pub async fn find_by_provider(
        pool: &DbPool,
        provider_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let refunds = sqlx::query_as::<_, Refund>(
            "SELECT r.* FROM refunds r
             JOIN bookings b ON b.id = r.booking_id
             WHERE b.provider_id = $1
             ORDER BY r.created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(pool)
        .await?;

        Ok(refunds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(RefundStatus::Completed.is_terminal());
        assert!(RefundStatus::Failed.is_terminal());
        assert!(RefundStatus::Cancelled.is_terminal());
        assert!(!RefundStatus::Pending.is_terminal());
        assert!(!RefundStatus::Processing.is_terminal());
    }

    #[test]
    fn approve_and_reject_only_from_open_statuses() {
        assert!(RefundStatus::Pending.can_approve());
        assert!(RefundStatus::Processing.can_approve());
        assert!(!RefundStatus::Completed.can_approve());
        assert!(!RefundStatus::Cancelled.can_approve());

        assert!(RefundStatus::Pending.can_reject());
        assert!(!RefundStatus::Failed.can_reject());
    }

    #[test]
    fn reset_returns_open_or_failed_refunds_to_pending() {
        assert!(RefundStatus::Failed.can_reset());
        assert!(RefundStatus::Pending.can_reset());
        assert!(RefundStatus::Processing.can_reset());
        assert!(!RefundStatus::Completed.can_reset());
        assert!(!RefundStatus::Cancelled.can_reset());
    }

    #[test]
    fn retry_restricted_to_gcash_pending_or_failed() {
        assert!(RefundStatus::Pending.can_retry(PaymentMethod::Gcash));
        assert!(RefundStatus::Failed.can_retry(PaymentMethod::Gcash));
        assert!(!RefundStatus::Processing.can_retry(PaymentMethod::Gcash));
        assert!(!RefundStatus::Completed.can_retry(PaymentMethod::Gcash));
        assert!(!RefundStatus::Pending.can_retry(PaymentMethod::Cash));
        assert!(!RefundStatus::Failed.can_retry(PaymentMethod::QrManual));
    }

    #[test]
    fn action_parses_from_request_strings() {
        assert_eq!("approve".parse(), Ok(RefundAction::Approve));
        assert_eq!("reject".parse(), Ok(RefundAction::Reject));
        assert_eq!("reset".parse(), Ok(RefundAction::Reset));
        assert_eq!("cancel".parse(), Ok(RefundAction::Cancel));
        assert_eq!("escalate".parse::<RefundAction>(), Err(()));
    }
}
