//! Snippet Vault Backend
//!
//! REST backend for storing, tagging, favoriting and filtering code snippets,
//! persisted in SQLite.

mod api;
mod config;
mod db;
mod errors;
mod filter;
mod models;
mod slug;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::Repository;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Snippet Vault Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    tracing::info!("Acting as: {}", config.actor_id);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let state = AppState {
        repo,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Snippets
        .route("/snippets", get(api::list_snippets).post(api::create_snippet))
        .route(
            "/snippets/{id}",
            get(api::get_snippet)
                .put(api::update_snippet)
                .delete(api::delete_snippet),
        )
        .route("/snippets/{id}/tags", put(api::set_snippet_tags))
        .route(
            "/snippets/{id}/tags/{tag_id}",
            put(api::add_snippet_tag).delete(api::remove_snippet_tag),
        )
        // Favorites
        .route("/favorites", get(api::list_favorites).post(api::add_favorite))
        .route(
            "/favorites/{snippet_id}",
            get(api::get_favorite_status).delete(api::remove_favorite),
        )
        .route("/favorites/{snippet_id}/toggle", post(api::toggle_favorite))
        // Tags
        .route("/tags", get(api::list_tags).post(api::create_tag))
        .route(
            "/tags/{id}",
            get(api::get_tag)
                .put(api::update_tag)
                .delete(api::delete_tag),
        )
        // Filter sources and change detection
        .route("/facets", get(api::get_facets))
        .route("/revision", get(api::get_revision));

    // Probes
    let probe_routes = Router::new()
        .route("/health", get(health_check))
        .route("/startup", get(startup_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(probe_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

/// Startup probe: succeeds once the store answers.
async fn startup_check(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.repo.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Startup probe failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}
