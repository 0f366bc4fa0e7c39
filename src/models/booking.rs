use crate::database::connection::DbPool;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Booking with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "in_progress" => Ok(BookingStatus::InProgress),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Gcash,
    QrManual,
}

impl PaymentMethod {
    /// Methods settled outside the gateway need a confirmed receipt
    /// before a refund can complete.
    pub fn is_offline(&self) -> bool {
        matches!(self, PaymentMethod::Cash | PaymentMethod::QrManual)
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "gcash" => Ok(PaymentMethod::Gcash),
            "qr_manual" => Ok(PaymentMethod::QrManual),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotPaid,
    PartiallyPaid,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub package_id: Uuid,
    pub pet_name: String,
    pub pet_type: String,
    pub cause_of_death: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub status: BookingStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub refund_id: Option<Uuid>,
    pub price: Decimal,
    pub special_requests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub user_id: Uuid,
    pub provider_id: Uuid,
    pub package_id: Uuid,
    pub pet_name: String,
    pub pet_type: String,
    pub cause_of_death: Option<String>,
    pub booking_date: NaiveDate,
    pub booking_time: NaiveTime,
    pub payment_method: PaymentMethod,
    pub price: Decimal,
    pub special_requests: Option<String>,
}

impl Booking {
    pub async fn create(pool: &DbPool, booking: CreateBooking) -> Result<Self, BookingError> {
        let now = Utc::now();

        let booking = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, user_id, provider_id, package_id, pet_name, pet_type, cause_of_death,
                                   booking_date, booking_time, status, payment_method, payment_status, price,
                                   special_requests, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(booking.user_id)
        .bind(booking.provider_id)
        .bind(booking.package_id)
        .bind(booking.pet_name)
        .bind(booking.pet_type)
        .bind(booking.cause_of_death)
        .bind(booking.booking_date)
        .bind(booking.booking_time)
        .bind(BookingStatus::Pending)
        .bind(booking.payment_method)
        .bind(PaymentStatus::NotPaid)
        .bind(booking.price)
        .bind(booking.special_requests)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(booking)
    }

    pub async fn find_by_user(pool: &DbPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    pub async fn find_by_provider(
        pool: &DbPool,
        provider_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE provider_id = $1 ORDER BY created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(pool)
        .await?;

        Ok(bookings)
    }

    pub async fn update_status(
        pool: &DbPool,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Self, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(BookingError::NotFound { id })?;

        Ok(booking)
    }

    pub async fn set_payment_status(
        pool: &DbPool,
        id: Uuid,
        payment_status: PaymentStatus,
    ) -> Result<Self, BookingError> {
        let booking = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(payment_status)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(BookingError::NotFound { id })?;

        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_methods_require_receipt_confirmation() {
        assert!(PaymentMethod::Cash.is_offline());
        assert!(PaymentMethod::QrManual.is_offline());
        assert!(!PaymentMethod::Gcash.is_offline());
    }

    #[test]
    fn booking_status_parses_from_snake_case() {
        assert_eq!("in_progress".parse(), Ok(BookingStatus::InProgress));
        assert_eq!("cancelled".parse(), Ok(BookingStatus::Cancelled));
        assert_eq!("done".parse::<BookingStatus>(), Err(()));
    }
}
