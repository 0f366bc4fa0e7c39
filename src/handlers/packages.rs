use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::package::{CreatePackage, PackageError, ServicePackage, UpdatePackage},
    models::provider::ServiceProvider,
    requests::package::{PackageRequest, UpdatePackageRequest},
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use tracing::{error, info};
use uuid::Uuid;

async fn own_provider(
    pool: &DbPool,
    user: &AuthenticatedUser,
) -> Result<Option<ServiceProvider>, sqlx::Error> {
    ServiceProvider::find_by_user(pool, user.user_id).await
}

pub async fn create(
    pool: web::Data<DbPool>,
    request: web::Json<PackageRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let provider = match own_provider(&pool, &user).await {
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

    let create_package = CreatePackage {
        provider_id: provider.id,
        name: request.name.clone(),
        description: request.description.clone(),
        category: request.category.clone(),
        cremation_type: request.cremation_type.clone(),
        processing_time: request.processing_time.clone(),
        price: request.price,
    };

    match ServicePackage::create(&pool, create_package).await {
        Ok(package) => {
            info!("Package {} created by provider {}", package.id, provider.id);
            Ok(HttpResponse::Created().json(ApiResponse::success(package)))
        }
        Err(PackageError::Database(e)) => {
            error!("Database error creating package: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to create package".to_string(),
            )))
        }
        Err(e) => {
            error!("Error creating package: {}", e);
            Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(e.to_string())))
        }
    }
}

pub async fn list_active(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    match ServicePackage::find_active(&pool).await {
        Ok(packages) => Ok(HttpResponse::Ok().json(ApiResponse::success(packages))),
        Err(e) => {
            error!("Failed to fetch packages: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch packages".to_string(),
            )))
        }
    }
}

pub async fn by_provider(pool: web::Data<DbPool>, path: web::Path<Uuid>) -> Result<HttpResponse> {
    match ServicePackage::find_by_provider(&pool, path.into_inner()).await {
        Ok(packages) => Ok(HttpResponse::Ok().json(ApiResponse::success(packages))),
        Err(e) => {
            error!("Failed to fetch provider packages: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch packages".to_string(),
            )))
        }
    }
}

pub async fn update(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePackageRequest>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let package_id = path.into_inner();

    match authorize_package(&pool, package_id, &user).await? {
        Ok(()) => {}
        Err(response) => return Ok(response),
    }

    let update_data = UpdatePackage {
        name: request.name.clone(),
        description: request.description.clone(),
        category: request.category.clone(),
        cremation_type: request.cremation_type.clone(),
        processing_time: request.processing_time.clone(),
        price: request.price,
        is_active: request.is_active,
    };

    match ServicePackage::update(&pool, package_id, update_data).await {
        Ok(package) => {
            info!("Package {} updated by {}", package_id, user.user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::success(package)))
        }
        Err(PackageError::NotFound { id }) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("Package {} not found", id)))),
        Err(PackageError::NoUpdateFields) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::<()>::error("No fields provided for update".to_string()),
        )),
        Err(PackageError::Database(e)) => {
            error!("Database error updating package: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update package".to_string(),
            )))
        }
    }
}

pub async fn deactivate(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let package_id = path.into_inner();

    match authorize_package(&pool, package_id, &user).await? {
        Ok(()) => {}
        Err(response) => return Ok(response),
    }

    match ServicePackage::deactivate(&pool, package_id).await {
        Ok(()) => {
            info!("Package {} deactivated by {}", package_id, user.user_id);
            Ok(HttpResponse::Ok().json(ApiResponse::<()>::success(())))
        }
        Err(PackageError::NotFound { id }) => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<()>::error(format!("Package {} not found", id)))),
        Err(e) => {
            error!("Failed to deactivate package: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to deactivate package".to_string(),
            )))
        }
    }
}

/// Packages may only be modified by the owning provider or an admin.
async fn authorize_package(
    pool: &DbPool,
    package_id: Uuid,
    user: &AuthenticatedUser,
) -> Result<std::result::Result<(), HttpResponse>> {
    let package = match ServicePackage::find_by_id(pool, package_id).await {
        Ok(Some(package)) => package,
        Ok(None) => {
            return Ok(Err(HttpResponse::NotFound()
                .json(ApiResponse::<()>::error("Package not found".to_string()))));
        }
        Err(e) => {
            error!("Failed to look up package: {}", e);
            return Ok(Err(HttpResponse::InternalServerError().json(
                ApiResponse::<()>::error("Failed to verify package".to_string()),
            )));
        }
    };

    if user.is_admin() {
        return Ok(Ok(()));
    }

    match own_provider(pool, user).await {
        Ok(Some(provider)) if provider.id == package.provider_id => Ok(Ok(())),
        Ok(_) => Ok(Err(HttpResponse::Forbidden()
            .json(ApiResponse::<()>::error("Access denied".to_string())))),
        Err(e) => {
            error!("Failed to look up provider: {}", e);
            Ok(Err(HttpResponse::InternalServerError().json(
                ApiResponse::<()>::error("Failed to verify provider".to_string()),
            )))
        }
    }
}
