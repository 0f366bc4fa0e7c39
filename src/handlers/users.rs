use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::user::{User, UserError, UserStatus},
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};
use uuid::Uuid;

pub async fn index(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    let users = User::find_all(&pool).await.map_err(|e| {
        error!("Failed to fetch users: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to fetch users")
    })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(users)))
}

pub async fn get_user(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let target_id = path.into_inner();

    if target_id != user.user_id && !user.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    match User::find_by_id(&pool, target_id).await {
        Ok(Some(target)) => Ok(HttpResponse::Ok().json(ApiResponse::success(target))),
        Ok(None) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error("User not found".to_string()))),
        Err(e) => {
            error!("Failed to fetch user {}: {}", target_id, e);
            Ok(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Failed to fetch user".to_string())))
        }
    }
}

pub async fn restrict(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    set_status(pool, path.into_inner(), user, UserStatus::Restricted).await
}

pub async fn unrestrict(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    set_status(pool, path.into_inner(), user, UserStatus::Active).await
}

async fn set_status(
    pool: web::Data<DbPool>,
    target_id: Uuid,
    user: AuthenticatedUser,
    status: UserStatus,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    if target_id == user.user_id {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "You cannot change the status of your own account".to_string(),
        )));
    }

    match User::set_status(&pool, target_id, status).await {
        Ok(updated) => {
            info!(
                "User {} status set to {:?} by {}",
                target_id, updated.status, user.user_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(updated)))
        }
        Err(UserError::NotFound { id }) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("User {} not found", id)))),
        Err(e) => {
            error!("Failed to update user status: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update user status".to_string(),
            )))
        }
    }
}
