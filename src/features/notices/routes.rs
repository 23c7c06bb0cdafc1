use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::notices::handlers;
use crate::features::notices::services::NoticeService;

/// Create routes for the notices feature
pub fn routes(service: Arc<NoticeService>) -> Router {
    Router::new()
        .route(
            "/notices",
            post(handlers::create_notice).get(handlers::list_notices),
        )
        .route("/notices/search", get(handlers::search_notices))
        .route(
            "/notices/{id}",
            get(handlers::get_notice)
                .put(handlers::update_notice)
                .delete(handlers::delete_notice),
        )
        .with_state(service)
}
