mod config;
mod database;
mod handlers;
mod middleware;
mod models;
mod requests;
mod routes;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing::info;

use crate::config::AppConfig;
use crate::database::connection::{establish_pool, run_migrations};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let app_config = AppConfig::from_env().context("Failed to load configuration")?;

    let pool = establish_pool(&app_config.database_url)
        .await
        .context("Failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let bind_addr = (app_config.host.clone(), app_config.port);
    info!("Starting server on {}:{}", bind_addr.0, bind_addr.1);

    let cors_origin = app_config.cors_origin.clone();

    HttpServer::new(move || {
        let cors = match cors_origin.as_deref() {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .supports_credentials(),
            None => Cors::permissive(),
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(pool.clone()))
            .service(web::scope("/api").configure(routes::api::scoped_config))
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
