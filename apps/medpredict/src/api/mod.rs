//! # HTTP Server
//!
//! axum server exposing the prediction forms and a JSON API.
//!
//! ```text
//! GET  /                        → redirect to /forms/diabetes
//! GET  /health                  → status + loaded models
//! GET  /forms/{disease}         → HTML form
//! POST /forms/{disease}         → HTML form with errors / warnings / diagnosis
//! GET  /api/schemas             → every form schema
//! GET  /api/schemas/{disease}   → one form schema
//! POST /api/predict/{disease}   → JSON prediction (422 on validation errors)
//! ```
//!
//! The `/api` routes honour the optional API key. The optional rate limit
//! applies to every route.

pub mod error;
pub mod guard;
pub mod handlers;
pub mod pages;

use crate::models;
use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use medpredict_core::ModelRegistry;
use pages::Pages;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Resolved server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub models_dir: PathBuf,
    pub api_key: Option<String>,
    /// Requests per second across all clients.
    pub rate_limit: Option<NonZeroU32>,
    pub cors: bool,
}

// =============================================================================
// STATE
// =============================================================================

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub pages: Arc<Pages>,
    pub api_key: Option<Arc<str>>,
    pub limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl AppState {
    pub fn new(registry: ModelRegistry) -> Result<Self, minijinja::Error> {
        Ok(Self {
            registry: Arc::new(registry),
            pages: Arc::new(Pages::new()?),
            api_key: None,
            limiter: None,
        })
    }

    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_rate_limit(mut self, per_second: NonZeroU32) -> Self {
        self.limiter = Some(Arc::new(RateLimiter::direct(Quota::per_second(per_second))));
        self
    }
}

// =============================================================================
// ROUTER
// =============================================================================

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/schemas", get(handlers::list_schemas))
        .route("/schemas/{disease}", get(handlers::get_schema))
        .route("/predict/{disease}", post(handlers::predict))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_api_key,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route(
            "/forms/{disease}",
            get(handlers::show_form).post(handlers::submit_form),
        )
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    guard::rate_limit,
                )),
        )
        .with_state(state)
}

/// Load the models, build the router and serve until Ctrl-C.
///
/// A model that fails to load aborts startup.
pub async fn run_server(
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = models::load_registry(&config.models_dir)?;

    let mut state = AppState::new(registry)?;
    if let Some(key) = &config.api_key {
        state = state.with_api_key(key.as_str());
    }
    if let Some(limit) = config.rate_limit {
        state = state.with_rate_limit(limit);
    }

    let mut app = create_router(state);
    if config.cors {
        app = app.layer(CorsLayer::permissive());
    }

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(
        %addr,
        auth = config.api_key.is_some(),
        rate_limit = config.rate_limit.map(NonZeroU32::get),
        "MedPredict listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
