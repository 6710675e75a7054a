//! Router configuration for the file API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_folder, delete_entry, get_entry, rename_entry, upload_file, AppState,
};
use super::middleware::create_cors_layer;

fn entry_routes() -> MethodRouter<Arc<AppState>> {
    get(get_entry)
        .put(create_folder)
        .post(upload_file)
        .patch(rename_entry)
        .delete(delete_entry)
}

/// Create the main API router.
///
/// `/` addresses the storage root itself and `/*path` everything below it.
/// Request bodies above `max_body_bytes` are refused with 413.
pub fn create_router(
    app_state: Arc<AppState>,
    cors_origins: &[String],
    max_body_bytes: usize,
) -> Router {
    Router::new()
        .route("/", entry_routes())
        .route("/*path", entry_routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins)),
        )
        .with_state(app_state)
}
