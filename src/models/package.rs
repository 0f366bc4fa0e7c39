use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Package with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("No fields provided for update")]
    NoUpdateFields,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServicePackage {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cremation_type: String,
    pub processing_time: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePackage {
    pub provider_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cremation_type: String,
    pub processing_time: Option<String>,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePackage {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub cremation_type: Option<String>,
    pub processing_time: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

impl ServicePackage {
    pub async fn create(pool: &DbPool, package: CreatePackage) -> Result<Self, PackageError> {
        let now = Utc::now();

        let package = sqlx::query_as::<_, ServicePackage>(
            "INSERT INTO service_packages (id, provider_id, name, description, category, cremation_type, processing_time, price, is_active, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(package.provider_id)
        .bind(package.name)
        .bind(package.description)
        .bind(package.category)
        .bind(package.cremation_type)
        .bind(package.processing_time)
        .bind(package.price)
        .bind(true)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(package)
    }

    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let package =
            sqlx::query_as::<_, ServicePackage>("SELECT * FROM service_packages WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(package)
    }

    pub async fn find_active(pool: &DbPool) -> Result<Vec<Self>, sqlx::Error> {
        let packages = sqlx::query_as::<_, ServicePackage>(
            "SELECT * FROM service_packages WHERE is_active = TRUE ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await?;

        Ok(packages)
    }

    pub async fn find_by_provider(
        pool: &DbPool,
        provider_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let packages = sqlx::query_as::<_, ServicePackage>(
            "SELECT * FROM service_packages WHERE provider_id = $1 ORDER BY created_at DESC",
        )
        .bind(provider_id)
        .fetch_all(pool)
        .await?;

        Ok(packages)
    }

    pub async fn update(
        pool: &DbPool,
        id: Uuid,
        update_data: UpdatePackage,
    ) -> Result<Self, PackageError> {
        if update_data.name.is_none()
            && update_data.description.is_none()
            && update_data.category.is_none()
            && update_data.cremation_type.is_none()
            && update_data.processing_time.is_none()
            && update_data.price.is_none()
            && update_data.is_active.is_none()
        {
            return Err(PackageError::NoUpdateFields);
        }

        let existing = match Self::find_by_id(pool, id).await? {
            Some(package) => package,
            None => return Err(PackageError::NotFound { id }),
        };

        let now = Utc::now();

        let updated_package = sqlx::query_as::<_, ServicePackage>(
            "UPDATE service_packages
             SET name = $2, description = $3, category = $4, cremation_type = $5,
                 processing_time = $6, price = $7, is_active = $8, updated_at = $9
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(update_data.name.unwrap_or(existing.name))
        .bind(update_data.description.or(existing.description))
        .bind(update_data.category.unwrap_or(existing.category))
        .bind(update_data.cremation_type.unwrap_or(existing.cremation_type))
        .bind(update_data.processing_time.or(existing.processing_time))
        .bind(update_data.price.unwrap_or(existing.price))
        .bind(update_data.is_active.unwrap_or(existing.is_active))
        .bind(now)
        .fetch_optional(pool)
        .await?
        .ok_or(PackageError::NotFound { id })?;

        Ok(updated_package)
    }

    pub async fn deactivate(pool: &DbPool, id: Uuid) -> Result<(), PackageError> {
        let result = sqlx::query(
            "UPDATE service_packages SET is_active = FALSE, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(PackageError::NotFound { id });
        }

        Ok(())
    }
}
