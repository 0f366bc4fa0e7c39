use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ReceiptError {
    #[error("Payment receipt with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Receipt is already {status:?}")]
    AlreadyDecided { status: ReceiptStatus },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "receipt_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Awaiting,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentReceipt {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub reference_number: String,
    pub receipt_path: Option<String>,
    pub status: ReceiptStatus,
    pub confirmed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReceipt {
    pub booking_id: Uuid,
    pub reference_number: String,
    pub receipt_path: Option<String>,
}

impl PaymentReceipt {
    pub async fn create(pool: &DbPool, receipt: CreateReceipt) -> Result<Self, ReceiptError> {
        let now = Utc::now();

        let receipt = sqlx::query_as::<_, PaymentReceipt>(
            "INSERT INTO payment_receipts (id, booking_id, reference_number, receipt_path, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(receipt.booking_id)
        .bind(receipt.reference_number)
        .bind(receipt.receipt_path)
        .bind(ReceiptStatus::Awaiting)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(receipt)
    }

    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let receipt =
            sqlx::query_as::<_, PaymentReceipt>("SELECT * FROM payment_receipts WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(receipt)
    }

    pub async fn find_by_booking(
        pool: &DbPool,
        booking_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let receipts = sqlx::query_as::<_, PaymentReceipt>(
            "SELECT * FROM payment_receipts WHERE booking_id = $1 ORDER BY created_at DESC",
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await?;

        Ok(receipts)
    }

    pub async fn find_confirmed_for_booking(
        pool: &DbPool,
        booking_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let receipt = sqlx::query_as::<_, PaymentReceipt>(
            "SELECT * FROM payment_receipts WHERE booking_id = $1 AND status = 'confirmed'
             ORDER BY updated_at DESC LIMIT 1",
        )
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;

        Ok(receipt)
    }

    pub async fn decide(
        pool: &DbPool,
        id: Uuid,
        status: ReceiptStatus,
        decided_by: Uuid,
        notes: Option<String>,
    ) -> Result<Self, ReceiptError> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(ReceiptError::NotFound { id })?;

        if existing.status != ReceiptStatus::Awaiting {
            return Err(ReceiptError::AlreadyDecided {
                status: existing.status,
            });
        }

        let receipt = sqlx::query_as::<_, PaymentReceipt>(
            "UPDATE payment_receipts
             SET status = $2, confirmed_by = $3, notes = $4, updated_at = $5
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(decided_by)
        .bind(notes.or(existing.notes))
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(ReceiptError::NotFound { id })?;

        Ok(receipt)
    }
}
