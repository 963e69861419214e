mod errors;
mod export;
mod health;
mod import;
mod listings;
mod state;

pub use state::{AdminState, DatabaseHealth};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};

use super::middleware::{log_responses, set_request_context};

/// Admin routes: search listings, export download and import uploads.
///
/// `upload_body_limit` caps the multipart import endpoints only.
pub fn build_admin_router(state: AdminState, upload_body_limit: usize) -> Router {
    Router::new()
        .route("/posts", get(listings::admin_posts))
        .route("/pages", get(listings::admin_pages))
        .route("/users", get(listings::admin_users))
        .route("/export", post(export::admin_export))
        .route(
            "/import/native",
            post(import::admin_import_native).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route(
            "/import/foreign",
            post(import::admin_import_foreign).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/_health/db", get(health::admin_health))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}
