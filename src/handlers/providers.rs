use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::provider::{ApplicationStatus, CreateProvider, ProviderError, ServiceProvider},
    models::user::UserRole,
    requests::provider::{ApplicationDecisionRequest, ProviderApplicationRequest},
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};
use uuid::Uuid;

pub async fn apply(
    pool: web::Data<DbPool>,
    request: web::Json<ProviderApplicationRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if user.user_role != UserRole::Business {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::<()>::error(
            "Only business accounts can apply as providers".to_string(),
        )));
    }

    let create = CreateProvider {
        user_id: user.user_id,
        business_name: request.business_name.clone(),
        business_phone: request.business_phone.clone(),
        business_address: request.business_address.clone(),
        description: request.description.clone(),
    };

    match ServiceProvider::create(&pool, create).await {
        Ok(provider) => {
            info!("Provider application {} submitted by {}", provider.id, user.user_id);
            Ok(HttpResponse::Created().json(ApiResponse::success(provider)))
        }
        Err(ProviderError::AlreadyApplied { .. }) => {
            Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
                "A provider application already exists for this account".to_string(),
            )))
        }
        Err(e) => {
            error!("Failed to create provider application: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to submit application".to_string(),
            )))
        }
    }
}

pub async fn list_approved(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    match ServiceProvider::find_approved(&pool).await {
        Ok(providers) => Ok(HttpResponse::Ok().json(ApiResponse::success(providers))),
        Err(e) => {
            error!("Failed to fetch providers: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch providers".to_string(),
            )))
        }
    }
}

pub async fn pending_applications(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    if !user.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    match ServiceProvider::find_by_status(&pool, ApplicationStatus::Pending).await {
        Ok(providers) => Ok(HttpResponse::Ok().json(ApiResponse::success(providers))),
        Err(e) => {
            error!("Failed to fetch pending applications: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch applications".to_string(),
            )))
        }
    }
}

pub async fn decide_application(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<ApplicationDecisionRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let provider_id = path.into_inner();

    if !user.is_admin() {
        return Ok(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())));
    }

    let status: ApplicationStatus = match request.status.parse() {
        Ok(ApplicationStatus::Pending) | Err(()) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(format!(
                "Invalid application decision: {}",
                request.status
            ))));
        }
        Ok(status) => status,
    };

    match ServiceProvider::set_application_status(&pool, provider_id, status).await {
        Ok(provider) => {
            info!(
                "Provider {} application set to {:?} by {}",
                provider_id, provider.application_status, user.user_id
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(provider)))
        }
        Err(ProviderError::NotFound { id }) => Ok(HttpResponse::NotFound().json(
            ApiResponse::<()>::error(format!("Service provider {} not found", id)),
        )),
        Err(e) => {
            error!("Failed to update application status: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update application".to_string(),
            )))
        }
    }
}
