use actix_web::{web, HttpResponse};

use crate::handlers;

pub fn scoped_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(web::resource("/register").route(web::post().to(handlers::auth::register)))
            .service(web::resource("/login").route(web::post().to(handlers::auth::login))),
    )
    .service(
        web::scope("/users")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::users::index))
                    .route(web::head().to(HttpResponse::MethodNotAllowed)),
            )
            .service(web::resource("/{id}").route(web::get().to(handlers::users::get_user)))
            .service(
                web::resource("/{id}/restrict").route(web::post().to(handlers::users::restrict)),
            )
            .service(
                web::resource("/{id}/unrestrict")
                    .route(web::post().to(handlers::users::unrestrict)),
            ),
    )
    .service(
        web::scope("/providers")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::providers::list_approved))
                    .route(web::post().to(handlers::providers::apply)),
            )
            .service(
                web::resource("/applications")
                    .route(web::get().to(handlers::providers::pending_applications)),
            )
            .service(
                web::resource("/{id}/application")
                    .route(web::put().to(handlers::providers::decide_application)),
            )
            .service(
                web::resource("/{id}/packages")
                    .route(web::get().to(handlers::packages::by_provider)),
            ),
    )
    .service(
        web::scope("/packages")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::packages::list_active))
                    .route(web::post().to(handlers::packages::create)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(handlers::packages::update))
                    .route(web::delete().to(handlers::packages::deactivate)),
            ),
    )
    .service(
        web::scope("/bookings")
            .service(
                web::resource("")
                    .route(web::get().to(handlers::bookings::my_bookings))
                    .route(web::post().to(handlers::bookings::create)),
            )
            .service(
                web::resource("/provider")
                    .route(web::get().to(handlers::bookings::provider_bookings)),
            )
            .service(
                web::resource("/refund-request")
                    .route(web::post().to(handlers::refunds::request_refund)),
            )
            .service(web::resource("/{id}").route(web::get().to(handlers::bookings::get_booking)))
            .service(
                web::resource("/{id}/status")
                    .route(web::put().to(handlers::bookings::update_status)),
            )
            .service(
                web::resource("/{id}/payment").route(web::post().to(handlers::bookings::mark_paid)),
            )
            .service(
                web::resource("/{id}/receipts")
                    .route(web::get().to(handlers::receipts::by_booking)),
            ),
    )
    .service(
        web::scope("/receipts")
            .service(web::resource("/{id}").route(web::put().to(handlers::receipts::decide))),
    )
    .service(
        web::scope("/refunds")
            .service(web::resource("").route(web::get().to(handlers::refunds::my_refunds)))
            .service(
                web::resource("/provider")
                    .route(web::get().to(handlers::refunds::provider_refunds)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(handlers::refunds::get_refund))
                    .route(web::put().to(handlers::refunds::decide)),
            )
            .service(web::resource("/{id}/retry").route(web::post().to(handlers::refunds::retry))),
    )
    .service(
        web::scope("/notifications")
            .service(web::resource("").route(web::get().to(handlers::notifications::index)))
            .service(
                web::resource("/stream").route(web::get().to(handlers::notifications::stream)),
            )
            .service(
                web::resource("/read-all")
                    .route(web::post().to(handlers::notifications::mark_all_read)),
            )
            .service(
                web::resource("/{id}/read")
                    .route(web::post().to(handlers::notifications::mark_read)),
            ),
    );
}
