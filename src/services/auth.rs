use crate::database::connection::DbPool;
use crate::models::auth::Claims;
use crate::models::user::{User, UserRole};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::env;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Auth configuration error: {0}")]
    Config(String),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Legacy token format carried over from the pre-JWT clients:
/// `"<userId>_<accountType>"`. It carries no signature, so callers
/// must verify the claimed identity against the users table.
pub fn parse_legacy_token(token: &str) -> Option<(Uuid, UserRole)> {
    let (id_part, role_part) = token.split_once('_')?;
    let user_id = Uuid::parse_str(id_part).ok()?;
    // uuids contain no underscores, so the tail is the whole account type
    let role = UserRole::from_str(role_part).ok()?;
    Some((user_id, role))
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new() -> Result<Self, AuthError> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| AuthError::Config("JWT_SECRET not set".to_string()))?;
        Ok(Self::with_secret(&secret))
    }

    pub fn with_secret(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn generate_token(&self, user: &User) -> Result<String, AuthError> {
        let claims = Claims::new(user.id, user.email.clone(), user.user_role);
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    pub async fn authenticate_user(
        &self,
        pool: &DbPool,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, AuthError> {
        if let Some(user) = User::find_by_email(pool, email).await? {
            if user.verify_password(password).unwrap_or(false) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::UserStatus;
    use chrono::Utc;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            first_name: "Maya".to_string(),
            last_name: "Santos".to_string(),
            email: "maya@example.com".to_string(),
            password_hash: String::new(),
            phone: None,
            address: None,
            user_role: UserRole::FurParent,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn jwt_round_trips_claims() {
        let service = AuthService::with_secret("test-secret");
        let user = sample_user();

        let token = service.generate_token(&user).unwrap();
        let claims = service.decode_token(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, UserRole::FurParent);
    }

    #[test]
    fn jwt_rejects_wrong_secret() {
        let service = AuthService::with_secret("test-secret");
        let other = AuthService::with_secret("other-secret");
        let token = service.generate_token(&sample_user()).unwrap();

        assert!(other.decode_token(&token).is_err());
    }

    #[test]
    fn legacy_token_parses_id_and_role() {
        let id = Uuid::new_v4();
        let token = format!("{}_admin", id);
        assert_eq!(parse_legacy_token(&token), Some((id, UserRole::Admin)));
    }

    #[test]
    fn legacy_token_handles_multi_word_roles() {
        let id = Uuid::new_v4();
        let token = format!("{}_fur_parent", id);
        assert_eq!(parse_legacy_token(&token), Some((id, UserRole::FurParent)));
    }

    #[test]
    fn legacy_token_rejects_garbage() {
        assert_eq!(parse_legacy_token("not-a-token"), None);
        assert_eq!(parse_legacy_token("123_admin"), None);
        let id = Uuid::new_v4();
        assert_eq!(parse_legacy_token(&format!("{}_wizard", id)), None);
    }
}
