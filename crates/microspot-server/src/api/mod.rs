//! HTTP surface: router assembly and shared application state.

pub mod auth;
pub mod events;
pub mod favorites;
pub mod listings;
pub mod messages;
pub mod notifications;
pub mod uploads;
pub mod users;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use microspot_store::Database;

use crate::config::ServerConfig;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::realtime::EventHub;
use crate::upload_store::UploadStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub uploads: Arc<UploadStore>,
    pub events: EventHub,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    let uploads_dir = ServeDir::new(state.uploads.base_path().to_path_buf());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .route("/api/listings", get(listings::search).post(listings::create))
        .route(
            "/api/listings/:id",
            get(listings::detail).put(listings::update),
        )
        .route("/api/users/listings", get(users::own_listings))
        .route(
            "/api/users/profile",
            get(users::profile).patch(users::update_profile),
        )
        .route("/api/users/images/:kind", post(users::set_image))
        .route("/api/favorites", get(favorites::list))
        .route(
            "/api/favorites/:listing_id",
            post(favorites::add).delete(favorites::remove),
        )
        .route("/api/messages", post(messages::send))
        .route("/api/messages/conversations", get(messages::conversations))
        .route("/api/messages/:conversation_id", get(messages::thread))
        .route(
            "/api/notifications",
            get(notifications::list).post(notifications::create),
        )
        .route("/api/notifications/:id", patch(notifications::set_read))
        .route("/api/upload", post(uploads::upload))
        .route("/api/events", get(events::stream))
        .nest_service("/uploads", uploads_dir)
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_size + 64 * 1024,
        ))
        .layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
