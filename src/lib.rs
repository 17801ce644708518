pub mod collections;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod models;
pub mod services;
pub mod static_files;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::storage::StorageManager;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<StorageManager>,
}

impl AppState {
    /// Open the database, run migrations and set up the blob stores
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db = Database::new(&config.database.path, config.database.max_connections).await?;
        db.run_migrations().await?;
        tracing::info!("Database initialized");

        let storage = Arc::new(StorageManager::new(&config.storage));

        Ok(Self {
            db,
            config: Arc::new(config),
            storage,
        })
    }
}

fn files_routes() -> MethodRouter<AppState> {
    get(handlers::file::list_files)
        .post(handlers::file::upload_file)
        .put(handlers::file::rename_file)
        .delete(handlers::file::delete_file)
        .fallback(handlers::method_not_allowed)
}

fn partners_routes() -> MethodRouter<AppState> {
    get(handlers::partner::list_partners)
        .post(handlers::partner::create_partner)
        .put(handlers::partner::update_partner)
        .delete(handlers::partner::delete_partner)
        .fallback(handlers::method_not_allowed)
}

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/files", files_routes())
        // Path used by the original admin pages
        .route("/file-upload", files_routes())
        .route("/partners", partners_routes());

    // Uploads are not capped unless the operator configures a limit
    let body_limit = match state.config.server.body_limit {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .nest("/api", api)
        .nest_service(
            "/file_uploads",
            static_files::blob_service(state.storage.files()),
        )
        .nest_service(
            "/uploads",
            static_files::blob_service(state.storage.partners()),
        )
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
