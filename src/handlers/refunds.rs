use crate::{
    database::connection::DbPool,
    handlers::bookings::is_bookings_provider,
    middleware::auth::AuthenticatedUser,
    models::booking::Booking,
    models::provider::ServiceProvider,
    models::refund::{Refund, RefundAction, RefundError},
    requests::refund::{RefundDecisionRequest, RefundRequest},
    services::gateway::GatewayService,
    services::{notifier, refunds},
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};
use uuid::Uuid;

/// POST /api/bookings/refund-request
pub async fn request_refund(
    pool: web::Data<DbPool>,
    request: web::Json<RefundRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    info!(
        "Refund requested for booking {} by {}",
        request.booking_id, user.user_id
    );

    let booking = match Booking::find_by_id(&pool, request.booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Booking not found".to_string())));
        }
        Err(e) => {
            error!("Failed to fetch booking {}: {}", request.booking_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch booking".to_string(),
            )));
        }
    };

    if booking.user_id != user.user_id {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    match refunds::request_refund(
        &pool,
        &booking,
        user.user_id,
        request.reason.clone(),
        request.amount,
    )
    .await
    {
        Ok(refund) => {
            // Best-effort; the refund stands even if the provider never hears.
            notifier::notify_refund_requested(&pool, &booking, &refund).await;
            Ok(HttpResponse::Created().json(ApiResponse::success(refund)))
        }
        Err(e @ RefundError::BookingNotRefundable { .. })
        | Err(e @ RefundError::ActiveRefundExists { .. }) => {
            Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())))
        }
        Err(RefundError::Database(e)) => {
            error!("Database error creating refund: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to create refund".to_string(),
            )))
        }
        Err(e) => {
            error!("Error creating refund: {}", e);
            Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())))
        }
    }
}

/// PUT /api/refunds/{id} with an `action` field: approve, reject, reset
/// or cancel.
pub async fn decide(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<RefundDecisionRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let refund_id = path.into_inner();

    let action: RefundAction = match request.action.parse() {
        Ok(action) => action,
        Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Unknown refund action: {}",
                request.action
            ))));
        }
    };

    let (refund, booking) = match load_refund_with_booking(&pool, refund_id).await {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };

    // Cancellation belongs to the requester; everything else to the
    // provider handling the booking or an admin.
    let authorized = match action {
        RefundAction::Cancel => refund.user_id == user.user_id || user.is_admin(),
        _ => user.is_admin() || is_bookings_provider(&pool, &booking, &user).await,
    };

    if !authorized {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    let outcome = match action {
        RefundAction::Approve => {
            let gateway = match GatewayService::new() {
                Ok(gateway) => gateway,
                Err(e) => {
                    error!("Payment gateway unavailable: {}", e);
                    return Ok(HttpResponse::InternalServerError().json(
                        ApiResponse::<()>::error("Payment gateway unavailable".to_string()),
                    ));
                }
            };
            refunds::approve(&pool, &gateway, refund_id, user.user_id).await
        }
        RefundAction::Reject => {
            refunds::reject(&pool, refund_id, user.user_id, request.notes.clone()).await
        }
        RefundAction::Reset => refunds::reset(&pool, refund_id, user.user_id).await,
        RefundAction::Cancel => refunds::cancel(&pool, refund_id, user.user_id).await,
    };

    match outcome {
        Ok(updated) => {
            match action {
                // A gateway-accepted refund is only `processing`; hold the
                // "processed" notice until it actually completes.
                RefundAction::Approve if updated.status.is_terminal() => {
                    notifier::notify_refund_decided(&pool, &booking, &updated, true).await
                }
                RefundAction::Reject => {
                    notifier::notify_refund_decided(&pool, &booking, &updated, false).await
                }
                RefundAction::Approve | RefundAction::Reset | RefundAction::Cancel => {}
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
        }
        Err(e) => Ok(refund_error_response(e)),
    }
}

/// POST /api/refunds/{id}/retry
pub async fn retry(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let refund_id = path.into_inner();

    let (refund, booking) = match load_refund_with_booking(&pool, refund_id).await {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };

    let authorized = refund.user_id == user.user_id
        || user.is_admin()
        || is_bookings_provider(&pool, &booking, &user).await;

    if !authorized {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    let gateway = match GatewayService::new() {
        Ok(gateway) => gateway,
        Err(e) => {
            error!("Payment gateway unavailable: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Payment gateway unavailable".to_string(),
            )));
        }
    };

    match refunds::retry(&pool, &gateway, refund_id, user.user_id).await {
        Ok(updated) => {
            if updated.status.is_terminal() {
                notifier::notify_refund_decided(&pool, &booking, &updated, true).await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
        }
        Err(e) => Ok(refund_error_response(e)),
    }
}

pub async fn get_refund(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let refund_id = path.into_inner();

    let (refund, booking) = match load_refund_with_booking(&pool, refund_id).await {
        Ok(pair) => pair,
        Err(response) => return Ok(response),
    };

    if refund.user_id != user.user_id
        && !user.is_admin()
        && !is_bookings_provider(&pool, &booking, &user).await
    {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(refund)))
}

pub async fn my_refunds(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    match Refund::find_by_user(&pool, user.user_id).await {
        Ok(refunds) => Ok(HttpResponse::Ok().json(ApiResponse::success(refunds))),
        Err(e) => {
            error!("Failed to fetch refunds: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch refunds".to_string(),
            )))
        }
    }
}

pub async fn provider_refunds(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let provider = match ServiceProvider::find_by_user(&pool, user.user_id).await {
        Ok(Some(provider)) => provider,
        Ok(None) => {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::<()>::error(
                "No provider account linked to this user".to_string(),
            )));
        }
        Err(e) => {
            error!("Failed to look up provider: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to verify provider".to_string(),
            )));
        }
    };

    match Refund::find_by_provider(&pool, provider.id).await {
        Ok(refunds) => Ok(HttpResponse::Ok().json(ApiResponse::success(refunds))),
        Err(e) => {
            error!("Failed to fetch provider refunds: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch refunds".to_string(),
            )))
        }
    }
}

async fn load_refund_with_booking(
    pool: &DbPool,
    refund_id: Uuid,
) -> std::result::Result<(Refund, Booking), HttpResponse> {
    let refund = match Refund::find_by_id(pool, refund_id).await {
        Ok(Some(refund)) => refund,
        Ok(None) => {
            return Err(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Refund not found".to_string())));
        }
        Err(e) => {
            error!("Failed to fetch refund {}: {}", refund_id, e);
            return Err(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch refund".to_string(),
            )));
        }
    };

    let booking = match Booking::find_by_id(pool, refund.booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            error!("Refund {} points at a missing booking", refund_id);
            return Err(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Refund booking is missing".to_string(),
            )));
        }
        Err(e) => {
            error!("Failed to fetch booking for refund {}: {}", refund_id, e);
            return Err(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch booking".to_string(),
            )));
        }
    };

    Ok((refund, booking))
}

fn refund_error_response(e: RefundError) -> HttpResponse {
    match e {
        RefundError::NotFound { id } => HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("Refund {} not found", id))),
        e @ (RefundError::InvalidTransition { .. }
        | RefundError::BookingNotRefundable { .. }
        | RefundError::ActiveRefundExists { .. }
        | RefundError::ReceiptNotConfirmed
        | RefundError::RetryNotSupported) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string()))
        }
        RefundError::Gateway(details) => {
            error!("Gateway refund failure: {}", details);
            HttpResponse::BadGateway().json(ApiResponse::<()>::error_with_details(
                "Payment gateway refund failed".to_string(),
                details,
            ))
        }
        RefundError::Database(e) => {
            error!("Database error in refund flow: {}", e);
            HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Refund operation failed".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::models::refund::RefundStatus;

    #[test]
    fn processing_refund_is_not_a_decided_outcome() {
        // An approval that the gateway merely accepted leaves the refund
        // in processing; the "refund processed" notice waits for a
        // terminal state.
        assert!(!RefundStatus::Processing.is_terminal());
        assert!(!RefundStatus::Pending.is_terminal());

        assert!(RefundStatus::Completed.is_terminal());
        assert!(RefundStatus::Failed.is_terminal());
        assert!(RefundStatus::Cancelled.is_terminal());
    }
}
