use crate::database::connection::DbPool;
use crate::models::booking::{Booking, PaymentStatus};
use crate::models::refund::{Refund, RefundAction, RefundError, RefundStatus};
use crate::services::gateway::{GatewayRefundStatus, GatewayService};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

/// Preconditions for opening a refund: the booking must be fully paid and
/// must not already have a non-terminal refund in flight.
pub fn validate_refund_request(
    booking: &Booking,
    active: Option<&Refund>,
) -> Result<(), RefundError> {
    if booking.payment_status != PaymentStatus::Paid {
        return Err(RefundError::BookingNotRefundable {
            status: booking.payment_status,
        });
    }

    if active.is_some() {
        return Err(RefundError::ActiveRefundExists {
            booking_id: booking.id,
        });
    }

    Ok(())
}

/// Audit notes are plain strings appended newest-last.
pub fn append_note(existing: Option<&str>, entry: &str) -> String {
    match existing {
        Some(notes) if !notes.is_empty() => format!("{}\n{}", notes, entry),
        _ => entry.to_string(),
    }
}

/// Opens a `pending` refund and stamps the booking with its id, both in
/// one transaction.
pub async fn request_refund(
    pool: &DbPool,
    booking: &Booking,
    requester_id: Uuid,
    reason: String,
    amount: Option<Decimal>,
) -> Result<Refund, RefundError> {
    let active = Refund::find_active_for_booking(pool, booking.id).await?;
    validate_refund_request(booking, active.as_ref())?;

    let amount = amount.unwrap_or(booking.price);
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let refund = sqlx::query_as::<_, Refund>(
        "INSERT INTO refunds (id, booking_id, user_id, amount, reason, status, payment_method, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(booking.id)
    .bind(requester_id)
    .bind(amount)
    .bind(reason)
    .bind(RefundStatus::Pending)
    .bind(booking.payment_method)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE bookings SET refund_id = $2, updated_at = $3 WHERE id = $1")
        .bind(booking.id)
        .bind(refund.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Refund {} opened for booking {}", refund.id, booking.id);
    Ok(refund)
}

/// Approves a refund. Offline payment methods (cash, QR) require a
/// confirmed payment receipt and complete directly; gcash refunds go
/// through the gateway and complete only once the gateway reports so.
/// The refund row and the booking's payment status move together inside
/// one transaction, with the refund row locked for the duration.
pub async fn approve(
    pool: &DbPool,
    gateway: &GatewayService,
    refund_id: Uuid,
    actor_id: Uuid,
) -> Result<Refund, RefundError> {
    let refund = Refund::find_by_id(pool, refund_id)
        .await?
        .ok_or(RefundError::NotFound { id: refund_id })?;

    if !refund.status.can_approve() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Approve,
        });
    }

    if refund.payment_method.is_offline() {
        let confirmed =
            crate::models::receipt::PaymentReceipt::find_confirmed_for_booking(pool, refund.booking_id)
                .await?;

        if confirmed.is_none() {
            return Err(RefundError::ReceiptNotConfirmed);
        }

        return complete(pool, refund_id, actor_id, None).await;
    }

    // Gateway-settled method: the refund id is the idempotency key, so a
    // crash after this call and before the commit is recoverable by retry.
    let gateway_refund = match gateway
        .initiate_refund(refund.id, refund.amount, &refund.reason)
        .await
    {
        Ok(gateway_refund) => gateway_refund,
        Err(e) => {
            mark_failed_best_effort(pool, refund_id, &e.to_string()).await;
            return Err(RefundError::Gateway(e.to_string()));
        }
    };

    match gateway_refund.status {
        GatewayRefundStatus::Completed => {
            complete(pool, refund_id, actor_id, Some(gateway_refund.reference)).await
        }
        GatewayRefundStatus::Accepted => {
            mark_processing(pool, refund_id, actor_id, gateway_refund.reference).await
        }
        GatewayRefundStatus::Failed => {
            mark_failed_best_effort(pool, refund_id, "gateway reported failure").await;
            Err(RefundError::Gateway("gateway reported failure".to_string()))
        }
    }
}

/// Rejects a refund: `failed` with the supplied note. The booking's
/// payment status is deliberately left untouched.
pub async fn reject(
    pool: &DbPool,
    refund_id: Uuid,
    actor_id: Uuid,
    note: Option<String>,
) -> Result<Refund, RefundError> {
    let mut tx = pool.begin().await?;
    let refund = lock_refund(&mut tx, refund_id).await?;

    if !refund.status.can_reject() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Reject,
        });
    }

    let notes = note.map(|n| append_note(refund.notes.as_deref(), &n));

    let updated = sqlx::query_as::<_, Refund>(
        "UPDATE refunds
         SET status = $2, processed_by = $3, notes = COALESCE($4, notes), updated_at = $5
         WHERE id = $1
         RETURNING *",
    )
    .bind(refund_id)
    .bind(RefundStatus::Failed)
    .bind(actor_id)
    .bind(notes)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Refund {} rejected by {}", refund_id, actor_id);
    Ok(updated)
}

/// Returns a stuck or failed refund to `pending`, appending an audit line.
/// Amount and booking linkage are never touched.
pub async fn reset(pool: &DbPool, refund_id: Uuid, actor_id: Uuid) -> Result<Refund, RefundError> {
    let mut tx = pool.begin().await?;
    let refund = lock_refund(&mut tx, refund_id).await?;

    if !refund.status.can_reset() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Reset,
        });
    }

    let audit = format!(
        "Reset to pending by {} at {}",
        actor_id,
        Utc::now().to_rfc3339()
    );
    let notes = append_note(refund.notes.as_deref(), &audit);

    let updated = sqlx::query_as::<_, Refund>(
        "UPDATE refunds SET status = $2, notes = $3, updated_at = $4 WHERE id = $1 RETURNING *",
    )
    .bind(refund_id)
    .bind(RefundStatus::Pending)
    .bind(notes)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Refund {} reset to pending by {}", refund_id, actor_id);
    Ok(updated)
}

/// Cancels a pending refund at the requester's initiative and unlinks it
/// from the booking. Payment status is unchanged.
pub async fn cancel(pool: &DbPool, refund_id: Uuid, actor_id: Uuid) -> Result<Refund, RefundError> {
    let mut tx = pool.begin().await?;
    let refund = lock_refund(&mut tx, refund_id).await?;

    if !refund.status.can_cancel() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Cancel,
        });
    }

    let now = Utc::now();

    let updated = sqlx::query_as::<_, Refund>(
        "UPDATE refunds SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(refund_id)
    .bind(RefundStatus::Cancelled)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE bookings SET refund_id = NULL, updated_at = $2 WHERE id = $1")
        .bind(refund.booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Refund {} cancelled by {}", refund_id, actor_id);
    Ok(updated)
}

/// Re-invokes the gateway refund call. Only gcash refunds in `pending` or
/// `failed` may retry; no backoff and no retry counter, the gateway's own
/// idempotency handling carries the weight.
pub async fn retry(
    pool: &DbPool,
    gateway: &GatewayService,
    refund_id: Uuid,
    actor_id: Uuid,
) -> Result<Refund, RefundError> {
    let refund = Refund::find_by_id(pool, refund_id)
        .await?
        .ok_or(RefundError::NotFound { id: refund_id })?;

    if !refund.status.can_retry(refund.payment_method) {
        return Err(RefundError::RetryNotSupported);
    }

    let gateway_refund = match gateway
        .initiate_refund(refund.id, refund.amount, &refund.reason)
        .await
    {
        Ok(gateway_refund) => gateway_refund,
        Err(e) => {
            mark_failed_best_effort(pool, refund_id, &e.to_string()).await;
            return Err(RefundError::Gateway(e.to_string()));
        }
    };

    match gateway_refund.status {
        GatewayRefundStatus::Completed => {
            complete(pool, refund_id, actor_id, Some(gateway_refund.reference)).await
        }
        GatewayRefundStatus::Accepted => {
            mark_processing(pool, refund_id, actor_id, gateway_refund.reference).await
        }
        GatewayRefundStatus::Failed => {
            mark_failed_best_effort(pool, refund_id, "gateway reported failure").await;
            Err(RefundError::Gateway("gateway reported failure".to_string()))
        }
    }
}

/// Finalizes a refund: refund row to `completed` and booking to
/// `refunded`, atomically.
async fn complete(
    pool: &DbPool,
    refund_id: Uuid,
    actor_id: Uuid,
    transaction_id: Option<String>,
) -> Result<Refund, RefundError> {
    let mut tx = pool.begin().await?;
    let refund = lock_refund(&mut tx, refund_id).await?;

    if !refund.status.can_approve() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Approve,
        });
    }

    let now = Utc::now();

    let updated = sqlx::query_as::<_, Refund>(
        "UPDATE refunds
         SET status = $2, processed_by = $3, transaction_id = COALESCE($4, transaction_id), updated_at = $5
         WHERE id = $1
         RETURNING *",
    )
    .bind(refund_id)
    .bind(RefundStatus::Completed)
    .bind(actor_id)
    .bind(transaction_id)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE bookings SET payment_status = $2, updated_at = $3 WHERE id = $1")
        .bind(refund.booking_id)
        .bind(PaymentStatus::Refunded)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!("Refund {} completed by {}", refund_id, actor_id);
    Ok(updated)
}

async fn mark_processing(
    pool: &DbPool,
    refund_id: Uuid,
    actor_id: Uuid,
    transaction_id: String,
) -> Result<Refund, RefundError> {
    let mut tx = pool.begin().await?;
    let refund = lock_refund(&mut tx, refund_id).await?;

    // The refund may have been cancelled or rejected while the gateway
    // call was in flight; a terminal refund must not be resurrected.
    if !refund.status.can_approve() {
        return Err(RefundError::InvalidTransition {
            from: refund.status,
            action: RefundAction::Approve,
        });
    }

    let updated = sqlx::query_as::<_, Refund>(
        "UPDATE refunds
         SET status = $2, processed_by = $3, transaction_id = $4, updated_at = $5
         WHERE id = $1
         RETURNING *",
    )
    .bind(refund_id)
    .bind(RefundStatus::Processing)
    .bind(actor_id)
    .bind(transaction_id)
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!("Refund {} moved to processing", refund_id);
    Ok(updated)
}

async fn mark_failed_best_effort(pool: &DbPool, refund_id: Uuid, reason: &str) {
    let result = sqlx::query(
        "UPDATE refunds
         SET status = $2, notes = CONCAT_WS(E'\\n', notes, $3::text), updated_at = $4
         WHERE id = $1 AND status NOT IN ('completed', 'cancelled')",
    )
    .bind(refund_id)
    .bind(RefundStatus::Failed)
    .bind(format!("Gateway failure: {}", reason))
    .bind(Utc::now())
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!("Failed to mark refund {} as failed: {}", refund_id, e);
    }
}

async fn lock_refund(
    tx: &mut Transaction<'_, Postgres>,
    refund_id: Uuid,
) -> Result<Refund, RefundError> {
    let refund = sqlx::query_as::<_, Refund>("SELECT * FROM refunds WHERE id = $1 FOR UPDATE")
        .bind(refund_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RefundError::NotFound { id: refund_id })?;

    Ok(refund)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{BookingStatus, PaymentMethod};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    fn paid_booking() -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            package_id: Uuid::new_v4(),
            pet_name: "Biscuit".to_string(),
            pet_type: "dog".to_string(),
            cause_of_death: None,
            booking_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            booking_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            status: BookingStatus::Completed,
            payment_method: PaymentMethod::Gcash,
            payment_status: PaymentStatus::Paid,
            refund_id: None,
            price: Decimal::new(1500, 0),
            special_requests: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn refund_for(booking: &Booking, status: RefundStatus) -> Refund {
        let now = Utc::now();
        Refund {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            user_id: booking.user_id,
            amount: booking.price,
            reason: "Service not rendered".to_string(),
            status,
            payment_method: booking.payment_method,
            transaction_id: None,
            processed_by: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn paid_booking_with_no_active_refund_is_refundable() {
        let booking = paid_booking();
        assert!(validate_refund_request(&booking, None).is_ok());
    }

    #[test]
    fn unpaid_booking_is_not_refundable() {
        let mut booking = paid_booking();
        booking.payment_status = PaymentStatus::NotPaid;

        match validate_refund_request(&booking, None) {
            Err(RefundError::BookingNotRefundable { status }) => {
                assert_eq!(status, PaymentStatus::NotPaid)
            }
            other => panic!("expected BookingNotRefundable, got {:?}", other),
        }
    }

    #[test]
    fn already_refunded_booking_is_not_refundable() {
        let mut booking = paid_booking();
        booking.payment_status = PaymentStatus::Refunded;
        assert!(validate_refund_request(&booking, None).is_err());
    }

    #[test]
    fn second_request_with_active_refund_is_rejected() {
        let booking = paid_booking();
        let active = refund_for(&booking, RefundStatus::Pending);

        match validate_refund_request(&booking, Some(&active)) {
            Err(RefundError::ActiveRefundExists { booking_id }) => {
                assert_eq!(booking_id, booking.id)
            }
            other => panic!("expected ActiveRefundExists, got {:?}", other),
        }
    }

    #[test]
    fn terminal_refund_does_not_block_a_new_request() {
        // `find_active_for_booking` filters terminal statuses out, so the
        // validator only ever sees non-terminal refunds; a cancelled one
        // simply never reaches it.
        let booking = paid_booking();
        assert!(validate_refund_request(&booking, None).is_ok());
    }

    #[test]
    fn refund_cancelled_during_gateway_call_stays_cancelled() {
        // A requester can cancel while the gateway call is in flight; the
        // accepted response must not move the refund back to processing.
        // `mark_processing` re-checks this predicate under the row lock.
        let booking = paid_booking();
        let cancelled = refund_for(&booking, RefundStatus::Cancelled);
        assert!(!cancelled.status.can_approve());

        let failed = refund_for(&booking, RefundStatus::Failed);
        assert!(!failed.status.can_approve());

        let completed = refund_for(&booking, RefundStatus::Completed);
        assert!(!completed.status.can_approve());
    }

    #[test]
    fn notes_append_newest_last() {
        assert_eq!(append_note(None, "first"), "first");
        assert_eq!(append_note(Some(""), "first"), "first");
        assert_eq!(append_note(Some("first"), "second"), "first\nsecond");
    }
}
