use crate::database::connection::DbPool;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User with ID {id} not found")]
    NotFound { id: Uuid },
    #[error("Email {email} is already registered")]
    EmailTaken { email: String },
    #[error("Password hashing failed")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    FurParent,
    Business,
    Admin,
}

impl FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fur_parent" => Ok(UserRole::FurParent),
            "business" => Ok(UserRole::Business),
            "admin" => Ok(UserRole::Admin),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "user_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Restricted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub user_role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub user_role: UserRole,
}

impl User {
    pub async fn create(pool: &DbPool, user: CreateUser) -> Result<Self, UserError> {
        let now = Utc::now();

        if Self::find_by_email(pool, &user.email).await?.is_some() {
            return Err(UserError::EmailTaken { email: user.email });
        }

        let hashed_password = hash(user.password.as_bytes(), DEFAULT_COST)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, phone, address, user_role, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email)
        .bind(hashed_password)
        .bind(user.phone)
        .bind(user.address)
        .bind(user.user_role)
        .bind(UserStatus::Active)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &DbPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &DbPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_all(pool: &DbPool) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

        Ok(users)
    }

    pub async fn set_status(
        pool: &DbPool,
        id: Uuid,
        status: UserStatus,
    ) -> Result<Self, UserError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET status = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?
        .ok_or(UserError::NotFound { id })?;

        Ok(user)
    }

    pub fn verify_password(&self, password: &str) -> Result<bool, bcrypt::BcryptError> {
        verify(password, &self.password_hash)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_from_snake_case() {
        assert_eq!("fur_parent".parse(), Ok(UserRole::FurParent));
        assert_eq!("business".parse(), Ok(UserRole::Business));
        assert_eq!("admin".parse(), Ok(UserRole::Admin));
        assert_eq!("superadmin".parse::<UserRole>(), Err(()));
    }
}
