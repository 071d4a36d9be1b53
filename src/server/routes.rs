use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;
use crate::{DocumentRecord, Error};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type RouteError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: Error) -> RouteError {
    let status = match &err {
        Error::NotFound(_) | Error::FileMissing(_) => StatusCode::NOT_FOUND,
        Error::EmptyUpload | Error::InvalidField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn bad_request(err: impl std::fmt::Display) -> RouteError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn missing_field(name: &str) -> RouteError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse {
            error: format!("Missing form field: {}", name),
        }),
    )
}

/// Decoded multipart form for upload/update requests
#[derive(Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    file: Option<(String, Vec<u8>)>,
}

async fn read_form(multipart: &mut Multipart) -> Result<UploadForm, RouteError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => form.title = Some(field.text().await.map_err(bad_request)?),
            Some("description") => {
                form.description = Some(field.text().await.map_err(bad_request)?)
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_request)?;
                // An empty file part means "no file"; create rejects it,
                // update treats it as a metadata-only change.
                if !filename.is_empty() && !bytes.is_empty() {
                    form.file = Some((filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DocumentRecord>>, RouteError> {
    state.store.list_documents().map(Json).map_err(error_response)
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentRecord>, RouteError> {
    state.store.get_document(id).map(Json).map_err(error_response)
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentRecord>), RouteError> {
    let form = read_form(&mut multipart).await?;

    let title = form
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| missing_field("title"))?;
    let description = form
        .description
        .filter(|d| !d.is_empty())
        .ok_or_else(|| missing_field("description"))?;
    let (filename, bytes) = form.file.ok_or_else(|| error_response(Error::EmptyUpload))?;

    let id = state
        .coordinator
        .store_upload(&title, &description, &filename, &bytes)
        .map_err(error_response)?;
    let doc = state.store.get_document(id).map_err(error_response)?;

    Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<DocumentRecord>, RouteError> {
    let form = read_form(&mut multipart).await?;
    let file = form
        .file
        .as_ref()
        .map(|(name, bytes)| (name.as_str(), bytes.as_slice()));

    state
        .coordinator
        .replace_upload(id, form.title.as_deref(), form.description.as_deref(), file)
        .map(Json)
        .map_err(error_response)
}

pub async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<([(header::HeaderName, String); 2], Vec<u8>), RouteError> {
    let (doc, bytes) = state.coordinator.read_file(id).map_err(error_response)?;

    let filename = std::path::Path::new(&doc.file_path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("document-{}", doc.id));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    ))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, RouteError> {
    state.coordinator.remove(id).map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, RouteError> {
    let count = state.store.count_documents().map_err(error_response)?;
    Ok(Json(serde_json::json!({ "documents": count })))
}
