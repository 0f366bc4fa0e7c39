use crate::{
    database::connection::DbPool,
    middleware::auth::AuthenticatedUser,
    models::notification::{Notification, NotificationError},
    services::realtime,
    utils::helpers::ApiResponse,
};
use actix_web::{web, HttpResponse, Result};
use futures_util::stream::unfold;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::error;
use uuid::Uuid;

pub async fn index(pool: web::Data<DbPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    match Notification::find_by_user(&pool, user.user_id).await {
        Ok(notifications) => Ok(HttpResponse::Ok().json(ApiResponse::success(notifications))),
        Err(e) => {
            error!("Failed to fetch notifications: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to fetch notifications".to_string(),
            )))
        }
    }
}

pub async fn mark_read(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let notification_id = path.into_inner();

    match Notification::mark_read(&pool, notification_id, user.user_id).await {
        Ok(notification) => Ok(HttpResponse::Ok().json(ApiResponse::success(notification))),
        Err(NotificationError::NotFound { id }) => Ok(HttpResponse::NotFound().json(
            ApiResponse::<()>::error(format!("Notification {} not found", id)),
        )),
        Err(e) => {
            error!("Failed to mark notification read: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update notification".to_string(),
            )))
        }
    }
}

pub async fn mark_all_read(
    pool: web::Data<DbPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    match Notification::mark_all_read(&pool, user.user_id).await {
        Ok(count) => Ok(HttpResponse::Ok().json(ApiResponse::success(json!({ "updated": count })))),
        Err(e) => {
            error!("Failed to mark notifications read: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error(
                "Failed to update notifications".to_string(),
            )))
        }
    }
}

/// Server-sent events stream of this user's notifications. Events are
/// only delivered from the instance holding the connection.
pub async fn stream(user: AuthenticatedUser) -> Result<HttpResponse> {
    let rx = realtime::subscribe(user.user_id);

    let events = unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(notification) => {
                    let payload = match serde_json::to_string(&notification) {
                        Ok(payload) => payload,
                        Err(_) => continue,
                    };
                    let chunk = web::Bytes::from(format!("data: {}\n\n", payload));
                    return Some((Ok::<_, actix_web::Error>(chunk), rx));
                }
                // Slow consumer: skip what was missed and keep streaming.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(events))
}
