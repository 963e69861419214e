use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response};

use crate::application::error::ErrorReport;

use super::AdminState;

const SOURCE: &str = "infra::http::admin_health";

/// `204` while the database answers, `503` with the driver error attached otherwise.
pub(super) async fn admin_health(State(state): State<AdminState>) -> Response {
    match state.db.health_check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(SOURCE, StatusCode::SERVICE_UNAVAILABLE, &err)
                .attach(&mut response);
            response
        }
    }
}
