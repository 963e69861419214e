use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Multipart;
use bytes::Bytes;
use tracing::error;

use crate::application::error::HttpError;
use crate::application::exchange::ForeignOptions;

use super::AdminState;
use super::errors::admin_import_error;

const SOURCE_NATIVE: &str = "infra::http::admin_import_native";
const SOURCE_FOREIGN: &str = "infra::http::admin_import_foreign";

/// Named parts of an import upload. File parts without content count as absent.
#[derive(Debug, Default)]
struct ImportForm {
    posts_file: Option<Bytes>,
    pages_file: Option<Bytes>,
    xml_file: Option<Bytes>,
    media_url: Option<String>,
}

async fn read_import_form(
    source: &'static str,
    multipart: &mut Multipart,
) -> Result<ImportForm, HttpError> {
    let mut form = ImportForm::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                let status = err.status();
                error!(
                    target = "folio::http::admin::import",
                    status = status.as_u16(),
                    error = %err,
                    "failed to read multipart payload"
                );
                let message = match status {
                    StatusCode::PAYLOAD_TOO_LARGE => "Uploaded file is too large",
                    _ => "Upload form data was invalid",
                };
                return Err(HttpError::from_error(source, status, message, &err));
            }
        };

        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let read_error = |err: axum_extra::extract::multipart::MultipartError| {
            HttpError::from_error(
                source,
                StatusCode::BAD_REQUEST,
                "Upload form data was invalid",
                &err,
            )
        };

        match name.as_str() {
            "posts_file" | "pages_file" | "xml_file" => {
                let bytes = field.bytes().await.map_err(read_error)?;
                let slot = match name.as_str() {
                    "posts_file" => &mut form.posts_file,
                    "pages_file" => &mut form.pages_file,
                    _ => &mut form.xml_file,
                };
                *slot = Some(bytes).filter(|bytes| !bytes.is_empty());
            }
            "media_url" => {
                let value = field.text().await.map_err(read_error)?;
                let value = value.trim();
                form.media_url = (!value.is_empty()).then(|| value.to_string());
            }
            _ => {}
        }
    }
    Ok(form)
}

pub(super) async fn admin_import_native(
    State(state): State<AdminState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_import_form(SOURCE_NATIVE, &mut multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };

    let result = async {
        let importer = state.import.resolve_importer(&state.importer_login).await?;
        state
            .import
            .import_native(
                form.posts_file.as_deref(),
                form.pages_file.as_deref(),
                &importer,
            )
            .await
    }
    .await;

    match result {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => admin_import_error(SOURCE_NATIVE, err).into_response(),
    }
}

pub(super) async fn admin_import_foreign(
    State(state): State<AdminState>,
    mut multipart: Multipart,
) -> Response {
    let form = match read_import_form(SOURCE_FOREIGN, &mut multipart).await {
        Ok(form) => form,
        Err(err) => return err.into_response(),
    };
    let Some(xml) = form.xml_file else {
        return HttpError::new(
            SOURCE_FOREIGN,
            StatusCode::BAD_REQUEST,
            "Choose a WordPress export file to import",
            "xml_file part missing or empty",
        )
        .into_response();
    };
    let options = ForeignOptions {
        media_base: form.media_url,
    };

    let result = async {
        let importer = state.import.resolve_importer(&state.importer_login).await?;
        state.import.import_foreign(&xml, &options, &importer).await
    }
    .await;

    match result {
        Ok(summary) => Json(summary).into_response(),
        Err(err) => admin_import_error(SOURCE_FOREIGN, err).into_response(),
    }
}
