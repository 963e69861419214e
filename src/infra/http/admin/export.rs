use axum::{
    Form,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::application::admin::ExportRequest;
use crate::application::exchange::ExportArchive;
use crate::domain::types::parse_flag;

use super::AdminState;
use super::errors::admin_export_error;

const SOURCE: &str = "infra::http::admin_export";

#[derive(Debug, Default, Deserialize)]
pub(super) struct ExportForm {
    #[serde(default)]
    posts: Option<String>,
    #[serde(default)]
    pages: Option<String>,
    #[serde(default)]
    filter_posts: String,
    #[serde(default)]
    filter_pages: String,
}

impl ExportForm {
    fn into_request(self) -> ExportRequest {
        ExportRequest {
            posts: checked(self.posts.as_deref()),
            pages: checked(self.pages.as_deref()),
            posts_filter: self.filter_posts,
            pages_filter: self.filter_pages,
        }
    }
}

/// Checkbox semantics: present and not an explicit "off" value.
fn checked(value: Option<&str>) -> bool {
    match value {
        None => false,
        Some(value) if value.trim().is_empty() => true,
        Some(value) => parse_flag(value).unwrap_or(true),
    }
}

pub(super) async fn admin_export(
    State(state): State<AdminState>,
    Form(form): Form<ExportForm>,
) -> Response {
    let today = OffsetDateTime::now_utc().date();
    match state.export.export(&form.into_request(), today).await {
        Ok(archive) => download_response(archive),
        Err(err) => admin_export_error(SOURCE, err).into_response(),
    }
}

fn download_response(archive: ExportArchive) -> Response {
    let length = archive.bytes.len();
    let mut response = Response::new(Body::from(archive.bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }

    let safe_name = archive.file_name.replace('"', "'");
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{safe_name}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    response
}
