mod api;
mod config;
mod database;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api::AppState;
use config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();

    log::info!("🚀 Starting User Import Service...");
    log::info!("📊 Database: {}", config.database_url);
    log::info!(
        "📎 Uploads: up to {} files of {} bytes, dedup mode {}",
        config.max_upload_files,
        config.max_upload_bytes,
        config.dedup_mode
    );

    // Initialize MongoDB connection
    let db = match database::MongoDB::new(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to connect to MongoDB: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    log::info!("✅ MongoDB connected successfully");

    let host = config.host.clone();
    let port = config.port;

    let state = web::Data::new(AppState {
        store: Arc::new(db),
        config: config.clone(),
    });

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = match &config.cors_allowed_origin {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        }
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![actix_web::http::header::CONTENT_TYPE])
        .expose_headers(vec![actix_web::http::header::CONTENT_DISPOSITION])
        .supports_credentials()
        .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Metrics
            .route("/metrics", web::get().to(api::metrics::get_metrics))
            // Users: import, list, export
            .route("/importUser", web::post().to(api::users::import_users))
            .route("/users", web::get().to(api::users::list_users))
            .route("/exportToExcel", web::get().to(api::users::export_to_excel))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
