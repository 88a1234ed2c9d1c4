pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use services::{booking::BookingManager, catalog::CatalogService};

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub config: config::Config,
    pub bookings: BookingManager,
    pub catalog: CatalogService,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database).await?;
        db.run_migrations().await?;
        Ok(Self::with_database(db, config))
    }

    /// Wires the services around an already connected (and migrated) database.
    pub fn with_database(db: database::Database, config: config::Config) -> Arc<Self> {
        let bookings = BookingManager::new(db.clone(), config.features);
        let catalog = CatalogService::new(db.clone());
        Arc::new(Self { db, config, bookings, catalog })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            HeaderValue::from_str(&state.config.app.frontend_origin).ok(),
        ))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/", get(|| async { "Showtime Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
