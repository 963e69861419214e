//! Mapping of admin service errors onto HTTP responses.

use axum::http::StatusCode;

use crate::application::admin::{AdminExportError, AdminImportError, AdminSearchError};
use crate::application::error::HttpError;
use crate::application::media::MediaError;
use crate::application::repos::RepoError;
use crate::application::search::SearchError;

fn bad_request(source: &'static str, err: &dyn std::error::Error) -> HttpError {
    HttpError::from_error(source, StatusCode::BAD_REQUEST, err.to_string(), err)
}

fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    let (status, public) = match &err {
        RepoError::Duplicate { constraint } => (StatusCode::CONFLICT, duplicate_message(constraint)),
        RepoError::NotFound => (StatusCode::NOT_FOUND, "Record not found"),
        RepoError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "Record was rejected by the database"),
        RepoError::Integrity { .. } => (StatusCode::CONFLICT, "Record violates a database constraint"),
        RepoError::Timeout => (StatusCode::SERVICE_UNAVAILABLE, "Database is not responding"),
        RepoError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
    };
    HttpError::from_error(source, status, public, &err)
}

fn duplicate_message(constraint: &str) -> &'static str {
    match constraint {
        "posts_url_key" => "A post with that url already exists",
        "pages_url_key" => "A page with that url already exists",
        "users_login_key" => "A user with that login already exists",
        _ => "Duplicate record",
    }
}

pub(super) fn search_error(source: &'static str, err: SearchError) -> HttpError {
    match err {
        SearchError::Lookup(repo) => repo_error_to_http(source, repo),
        other => bad_request(source, &other),
    }
}

pub(super) fn admin_search_error(source: &'static str, err: AdminSearchError) -> HttpError {
    match err {
        AdminSearchError::Search(err) => search_error(source, err),
        AdminSearchError::Domain(err) => bad_request(source, &err),
        AdminSearchError::Repo(repo) => repo_error_to_http(source, repo),
    }
}

pub(super) fn admin_export_error(source: &'static str, err: AdminExportError) -> HttpError {
    match err {
        AdminExportError::NothingSelected => bad_request(source, &err),
        AdminExportError::Search(err) => search_error(source, err),
        AdminExportError::Repo(repo) => repo_error_to_http(source, repo),
        AdminExportError::Archive(err) => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Export archive could not be built",
            &err,
        ),
    }
}

pub(super) fn admin_import_error(source: &'static str, err: AdminImportError) -> HttpError {
    match err {
        AdminImportError::Repo(repo) => repo_error_to_http(source, repo),
        AdminImportError::UnknownImporter { .. } => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Importing user is not configured",
            &err,
        ),
        AdminImportError::Media(MediaError::Store { .. }) => HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Imported media could not be stored",
            &err,
        ),
        other => bad_request(source, &other),
    }
}
