use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::files::handlers;
use crate::features::files::services::FileStorageService;

/// Create routes for the files feature
pub fn routes(service: Arc<FileStorageService>) -> Router {
    Router::new()
        .route("/files/download/{id}", get(handlers::download_file))
        .with_state(service)
}
