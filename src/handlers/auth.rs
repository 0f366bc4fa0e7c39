use crate::{
    database::connection::DbPool,
    models::{
        auth::{AuthResponse, LoginRequest, RegisterRequest, UserInfo},
        user::{CreateUser, User, UserError, UserRole, UserStatus},
    },
    services::auth::AuthService,
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};

pub async fn register(
    pool: web::Data<DbPool>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    let auth_service = AuthService::new().map_err(|e| {
        error!("Failed to create auth service: {}", e);
        actix_web::error::ErrorInternalServerError("Authentication service error")
    })?;

    let user_role = match request.user_role.as_deref() {
        // admins are seeded, never self-registered
        Some("admin") | None => UserRole::FurParent,
        Some(role_str) => role_str.parse().unwrap_or(UserRole::FurParent),
    };

    let create_user = CreateUser {
        first_name: request.first_name.clone(),
        last_name: request.last_name.clone(),
        email: request.email.clone(),
        password: request.password.clone(),
        phone: request.phone.clone(),
        address: request.address.clone(),
        user_role,
    };

    let user = match User::create(&pool, create_user).await {
        Ok(user) => user,
        Err(UserError::EmailTaken { email }) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Email {} is already registered",
                email
            ))));
        }
        Err(e) => {
            error!("Failed to create user: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to create user".to_string())));
        }
    };

    info!("Registered user {} as {:?}", user.id, user.user_role);

    let token = auth_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to generate token")
    })?;

    let response = AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            user_role: user.user_role,
        },
    };

    Ok(HttpResponse::Created().json(ApiResponse::success(response)))
}

pub async fn login(
    pool: web::Data<DbPool>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let auth_service = AuthService::new().map_err(|e| {
        error!("Failed to create auth service: {}", e);
        actix_web::error::ErrorInternalServerError("Authentication service error")
    })?;

    let user = auth_service
        .authenticate_user(&pool, &request.email, &request.password)
        .await
        .map_err(|e| {
            error!("Authentication error: {}", e);
            actix_web::error::ErrorInternalServerError("Authentication error")
        })?
        .ok_or_else(|| {
            info!("Invalid credentials for: {}", request.email);
            actix_web::error::ErrorUnauthorized("Invalid credentials")
        })?;

    if user.status == UserStatus::Restricted {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Account is restricted".to_string())));
    }

    let token = auth_service.generate_token(&user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to generate token")
    })?;

    let response = AuthResponse {
        token,
        user: UserInfo {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            user_role: user.user_role,
        },
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}
