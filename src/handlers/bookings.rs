use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::booking::{
        Booking, BookingError, BookingStatus, CreateBooking, PaymentMethod, PaymentStatus,
    },
    models::package::ServicePackage,
    models::provider::ServiceProvider,
    models::receipt::{CreateReceipt, PaymentReceipt},
    requests::booking::{BookingRequest, MarkPaidRequest, UpdateBookingStatusRequest},
    services::notifier,
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use rand::Rng;
use tracing::{error, info};
use uuid::Uuid;

pub async fn create(
    pool: web::Data<DbPool>,
    request: web::Json<BookingRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let payment_method: PaymentMethod = match request.payment_method.parse() {
        Ok(method) => method,
        Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Unknown payment method: {}",
                request.payment_method
            ))));
        }
    };

    let package = match ServicePackage::find_by_id(&pool, request.package_id).await {
        Ok(Some(package)) if package.is_active && package.provider_id == request.provider_id => {
            package
        }
        Ok(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                "Package is not available from this provider".to_string(),
            )));
        }
        Err(e) => {
            error!("Failed to look up package: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to verify package".to_string(),
            )));
        }
    };

    let create_booking = CreateBooking {
        user_id: user.user_id,
        provider_id: request.provider_id,
        package_id: request.package_id,
        pet_name: request.pet_name.clone(),
        pet_type: request.pet_type.clone(),
        cause_of_death: request.cause_of_death.clone(),
        booking_date: request.booking_date,
        booking_time: request.booking_time,
        payment_method,
        price: package.price,
        special_requests: request.special_requests.clone(),
    };

    match Booking::create(&pool, create_booking).await {
        Ok(booking) => {
            info!("Booking {} created by {}", booking.id, user.user_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(booking)))
        }
        Err(BookingError::Database(e)) => {
            error!("Database error creating booking: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to create booking".to_string(),
            )))
        }
        Err(e) => {
            error!("Error creating booking: {}", e);
            Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())))
        }
    }
}

pub async fn get_booking(
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

    Ok(HttpResponse::Ok().json(ApiResponse::success(booking)))
}

pub async fn my_bookings(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    match Booking::find_by_user(&pool, user.user_id).await {
        Ok(bookings) => Ok(HttpResponse::Ok().json(ApiResponse::success(bookings))),
        Err(e) => {
            error!("Failed to fetch bookings: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch bookings".to_string(),
            )))
        }
    }
}

pub async fn provider_bookings(
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

    match Booking::find_by_provider(&pool, provider.id).await {
        Ok(bookings) => Ok(HttpResponse::Ok().json(ApiResponse::success(bookings))),
        Err(e) => {
            error!("Failed to fetch provider bookings: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch bookings".to_string(),
            )))
        }
    }
}

pub async fn update_status(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<UpdateBookingStatusRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();

    let status: BookingStatus = match request.status.parse() {
        Ok(status) => status,
        Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Unknown booking status: {}",
                request.status
            ))));
        }
    };

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

    if !user.is_admin() && !is_bookings_provider(&pool, &booking, &user).await {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    match Booking::update_status(&pool, booking_id, status).await {
        Ok(updated) => {
            info!(
                "Booking {} status set to {:?} by {}",
                booking_id, updated.status, user.user_id
            );
            let headline = match updated.status {
                BookingStatus::Confirmed => "Your booking has been confirmed",
                BookingStatus::InProgress => "Your booking is now in progress",
                BookingStatus::Completed => "Your booking has been completed",
                BookingStatus::Cancelled => "Your booking has been cancelled",
                BookingStatus::Pending => "Your booking is pending review",
            };
            notifier::notify_booking_status(&pool, &updated, headline).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
        }
        Err(BookingError::NotFound { id }) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("Booking {} not found", id)))),
        Err(e) => {
            error!("Failed to update booking status: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update booking".to_string(),
            )))
        }
    }
}

/// QR/manual payments: the fur parent submits a reference number which a
/// provider confirms later; the booking stays `not_paid` until then. Cash
/// payments are marked paid by the provider directly.
pub async fn mark_paid(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<MarkPaidRequest>,
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

    if booking.payment_status == PaymentStatus::Paid {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::<()>::error("Booking is already paid".to_string())));
    }

    match booking.payment_method {
        PaymentMethod::QrManual => {
            if booking.user_id != user.user_id {
                return Ok(HttpResponse::Forbidden()
                    .json(ApiResponse::<()>::error("Access denied".to_string())));
            }

            let reference_number = request
                .reference_number
                .clone()
                .unwrap_or_else(generate_reference);

            let create = CreateReceipt {
                booking_id,
                reference_number,
                receipt_path: request.receipt_path.clone(),
            };

            match PaymentReceipt::create(&pool, create).await {
                Ok(receipt) => {
                    info!("Receipt {} submitted for booking {}", receipt.id, booking_id);
                    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
                        receipt,
                        "Receipt submitted; awaiting provider confirmation".to_string(),
                    )))
                }
                Err(e) => {
                    error!("Failed to store receipt: {}", e);
                    Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                        "Failed to store receipt".to_string(),
                    )))
                }
            }
        }
        PaymentMethod::Cash | PaymentMethod::Gcash => {
            if !user.is_admin() && !is_bookings_provider(&pool, &booking, &user).await {
                return Ok(HttpResponse::Forbidden()
                    .json(ApiResponse::<()>::error("Access denied".to_string())));
            }

            match Booking::set_payment_status(&pool, booking_id, PaymentStatus::Paid).await {
                Ok(updated) => {
                    info!("Booking {} marked paid by {}", booking_id, user.user_id);
                    Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
                }
                Err(e) => {
                    error!("Failed to mark booking paid: {}", e);
                    Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                        "Failed to update payment status".to_string(),
                    )))
                }
            }
        }
    }
}

fn generate_reference() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..10)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("FR-{}", suffix)
}

pub(crate) async fn is_bookings_provider(
    pool: &DbPool,
    booking: &Booking,
    user: &AuthenticatedUser,
) -> bool {
    match ServiceProvider::find_by_user(pool, user.user_id).await {
        Ok(Some(provider)) => provider.id == booking.provider_id,
        Ok(None) => false,
        Err(e) => {
            error!("Failed to look up provider for authorization: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_references_are_prefixed_and_unique_enough() {
        let a = generate_reference();
        let b = generate_reference();
        assert!(a.starts_with("FR-"));
        assert_eq!(a.len(), 13);
        assert_ne!(a, b);
    }
}
