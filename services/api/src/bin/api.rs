//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, MemoryAdapter},
    config::{Config, ConfigError},
    error::ApiError,
    web::{
        build_router,
        middleware::{USER_EMAIL_HEADER, USER_ID_HEADER},
        rest::ApiDoc,
        AppState, TabRegistry,
    },
};
use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderName, HeaderValue, Method,
};
use axum::Router;
use coursebuilder_core::course::CourseOutline;
use sqlx::postgres::PgPoolOptions;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Reads the JSON course outline used to seed the in-memory catalog.
async fn load_outline_file(path: &Path) -> Result<CourseOutline, ApiError> {
    let raw = tokio::fs::read_to_string(path).await?;
    serde_json::from_str(&raw).map_err(|e| {
        ConfigError::InvalidValue("COURSE_OUTLINE_PATH".to_string(), e.to_string()).into()
    })
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the dashboard tab registry ---
    let tabs = TabRegistry::teacher_dashboard()?;

    // --- 3. Pick the storage backend & build the shared AppState ---
    let app_state = match config.database_url.as_deref() {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            AppState::with_storage(db_adapter, config.clone(), tabs)
        }
        None => {
            warn!("DATABASE_URL is not set; all data is kept in memory and lost on exit.");
            let outline = match config.course_outline_path.as_deref() {
                Some(path) => {
                    let outline = load_outline_file(path).await?;
                    info!(
                        "Loaded course outline with {} units from {}",
                        outline.units().len(),
                        path.display()
                    );
                    outline
                }
                None => {
                    warn!("COURSE_OUTLINE_PATH is not set; the course has no units.");
                    CourseOutline::default()
                }
            };
            AppState::with_storage(Arc::new(MemoryAdapter::new(outline)), config.clone(), tabs)
        }
    };

    // --- 4. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("CORS_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            CONTENT_TYPE,
            ACCEPT,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(USER_EMAIL_HEADER),
        ]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(build_router(Arc::new(app_state)))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
