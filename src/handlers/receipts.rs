use crate::{
    database::connection::DbPool,
    handlers::bookings::is_bookings_provider,
    middleware::auth::AuthenticatedUser,
    models::booking::{Booking, PaymentStatus},
    models::receipt::{PaymentReceipt, ReceiptError, ReceiptStatus},
    requests::receipt::ReceiptDecisionRequest,
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info, warn};
use uuid::Uuid;

pub async fn by_booking(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();

    let booking = match Booking::find_by_id(&pool, booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Booking not found".to_string())));
        }
        Err(e) => {
            error!("Failed to fetch booking {}: {}", booking_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch booking".to_string(),
            )));
        }
    };

    if booking.user_id != user.user_id
        && !user.is_admin()
        && !is_bookings_provider(&pool, &booking, &user).await
    {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    match PaymentReceipt::find_by_booking(&pool, booking_id).await {
        Ok(receipts) => Ok(HttpResponse::Ok().json(ApiResponse::success(receipts))),
        Err(e) => {
            error!("Failed to fetch receipts: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch receipts".to_string(),
            )))
        }
    }
}

/// Provider confirms or rejects a submitted payment reference. Confirming
/// also marks the booking paid.
pub async fn decide(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<ReceiptDecisionRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let receipt_id = path.into_inner();

    let receipt = match PaymentReceipt::find_by_id(&pool, receipt_id).await {
        Ok(Some(receipt)) => receipt,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Receipt not found".to_string())));
        }
        Err(e) => {
            error!("Failed to fetch receipt {}: {}", receipt_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch receipt".to_string(),
            )));
        }
    };

    let booking = match Booking::find_by_id(&pool, receipt.booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Booking not found".to_string())));
        }
        Err(e) => {
            error!("Failed to fetch booking for receipt: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch booking".to_string(),
            )));
        }
    };

    if !user.is_admin() && !is_bookings_provider(&pool, &booking, &user).await {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    let status = if request.confirm {
        ReceiptStatus::Confirmed
    } else {
        ReceiptStatus::Rejected
    };

    let decided = match PaymentReceipt::decide(
        &pool,
        receipt_id,
        status,
        user.user_id,
        request.notes.clone(),
    )
    .await
    {
        Ok(decided) => decided,
        Err(ReceiptError::AlreadyDecided { status }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Receipt was already {:?}",
                status
            ))));
        }
        Err(ReceiptError::NotFound { id }) => {
            return Ok(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error(format!("Receipt {} not found", id))));
        }
        Err(e) => {
            error!("Failed to update receipt: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update receipt".to_string(),
            )));
        }
    };

    if decided.status == ReceiptStatus::Confirmed {
        if let Err(e) =
            Booking::set_payment_status(&pool, booking.id, PaymentStatus::Paid).await
        {
            // Receipt stands; the payment status can be fixed by re-confirming.
            warn!("Receipt {} confirmed but booking update failed: {}", receipt_id, e);
        }
    }

    info!(
        "Receipt {} marked {:?} by {}",
        receipt_id, decided.status, user.user_id
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(decided)))
}
