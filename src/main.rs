//! Tool Finder Backend
//!
//! REST backend for the AI tool directory: catalog search with synthesized answers, and
//! saved bundles, workflows and drafts with a local mirror when the database is unavailable.

mod api;
mod auth;
mod catalog;
mod config;
mod db;
mod errors;
mod models;
mod persistence;
mod search;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use catalog::Catalog;
use config::Config;
use db::Repository;
use persistence::{FileLocalStore, LocalStore, MemoryLocalStore, UserDataService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub user_data: Arc<UserDataService>,
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

    tracing::info!("Starting Tool Finder Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Local store path: {:?}", config.local_store_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if PSK is not configured
    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (TOOLFINDER_API_PSK). Authentication is disabled!");
    }

    // Load the catalog
    let catalog = Arc::new(Catalog::load(config.catalog_path.as_deref()).await?);
    tracing::info!(
        "Catalog loaded with {} tools in {} categories",
        catalog.tools.len(),
        catalog.categories.len()
    );

    // Initialize remote store and local mirror
    let pool = db::init_database(&config.db_path, config.provision_tables).await?;
    let remote = Arc::new(Repository::new(pool));
    let local: Arc<dyn LocalStore> = if config.local_store_path.as_os_str() == ":memory:" {
        tracing::warn!("Local mirror is in memory and will not survive a restart");
        Arc::new(MemoryLocalStore::new())
    } else {
        Arc::new(FileLocalStore::open(&config.local_store_path).await?)
    };
    let user_data = Arc::new(UserDataService::new(remote, local));

    // Create application state
    let state = AppState {
        catalog,
        user_data,
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
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

    // Clone PSK for the auth layer
    let psk = state.config.api_psk.clone();

    // API routes
    let api_routes = Router::new()
        // Search
        .route("/search", get(api::search_tools))
        // Catalog
        .route("/tools", get(api::list_tools))
        .route("/tools/trending", get(api::trending_tools))
        .route("/tools/{slug}", get(api::get_tool))
        .route("/categories", get(api::list_categories))
        // Saved bundles
        .route("/bundles", get(api::list_bundles).post(api::save_bundle))
        .route("/bundles/{id}", delete(api::delete_bundle))
        // Saved workflows
        .route("/workflows", get(api::list_workflows).post(api::save_workflow))
        .route("/workflows/{id}", delete(api::delete_workflow))
        // Workflow draft
        .route(
            "/draft",
            get(api::get_draft)
                .put(api::save_draft)
                .delete(api::delete_draft),
        )
        // Apply PSK auth middleware
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
