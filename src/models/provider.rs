use crate::database::connection::DbPool;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Service provider with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("User {user_id} already has a provider application")]
    AlreadyApplied { user_id: Uuid },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Declined,
    Restricted,
}

impl FromStr for ApplicationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "declined" => Ok(ApplicationStatus::Declined),
            "restricted" => Ok(ApplicationStatus::Restricted),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ServiceProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub description: Option<String>,
    pub application_status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProvider {
    pub user_id: Uuid,
    pub business_name: String,
    pub business_phone: Option<String>,
    pub business_address: Option<String>,
    pub description: Option<String>,
}

impl ServiceProvider {
    pub async fn create(pool: &DbPool, provider: CreateProvider) -> Result<Self, ProviderError> {
        let now = Utc::now();

        if Self::find_by_user(pool, provider.user_id).await?.is_some() {
            return Err(ProviderError::AlreadyApplied {
                user_id: provider.user_id,
            });
        }

        let provider = sqlx::query_as::<_, ServiceProvider>(
            "INSERT INTO service_providers (id, user_id, business_name, business_phone, business_address, description, application_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(provider.user_id)
        .bind(provider.business_name)
        .bind(provider.business_phone)
        .bind(provider.business_address)
        .bind(provider.description)
        .bind(ApplicationStatus::Pending)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(provider)
    }

    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let provider =
            sqlx::query_as::<_, ServiceProvider>("SELECT * FROM service_providers WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(provider)
    }

    pub async fn find_by_user(pool: &DbPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let provider = sqlx::query_as::<_, ServiceProvider>(
            "SELECT * FROM service_providers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        Ok(provider)
    }

    pub async fn find_by_status(
        pool: &DbPool,
        status: ApplicationStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let providers = sqlx::query_as::<_, ServiceProvider>(
            "SELECT * FROM service_providers WHERE application_status = $1 ORDER BY created_at DESC",
        )
        .bind(status)
        .fetch_all(pool)
        .await?;

        Ok(providers)
    }

    pub async fn find_approved(pool: &DbPool) -> Result<Vec<Self>, sqlx::Error> {
        Self::find_by_status(pool, ApplicationStatus::Approved).await
    }

    pub async fn set_application_status(
        pool: &DbPool,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Self, ProviderError> {
        let provider = sqlx::query_as::<_, ServiceProvider>(
            "UPDATE service_providers SET application_status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(ProviderError::NotFound { id })?;

        Ok(provider)
    }
}
