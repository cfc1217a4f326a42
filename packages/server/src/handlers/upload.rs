use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::storage::StorageError;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppPath;
use crate::models::upload::UploadResponse;
use crate::plants::images::extension_for;
use crate::state::AppState;

/// Room for multipart framing on top of the largest accepted image.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let max = usize::try_from(max_blob_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(max.saturating_add(MULTIPART_OVERHEAD))
}

#[utoipa::path(
    post,
    path = "/uploads",
    tag = "Uploads",
    operation_id = "uploadImage",
    summary = "Upload a plant photo",
    description = "Stores the `file` multipart field and returns its public URL. Only PNG, JPEG, \
        WebP and GIF images are accepted. Uploading the same bytes twice yields the same URL.",
    request_body(content_type = "multipart/form-data", description = "Image file in field `file`"),
    responses(
        (status = 201, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing file, empty file, not an image, or too large (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        // Trust the declared type first, then the file name.
        let content_type = field
            .content_type()
            .filter(|ct| extension_for(ct).is_some())
            .map(str::to_string)
            .or_else(|| {
                field
                    .file_name()
                    .and_then(|name| mime_guess::from_path(name).first())
                    .map(|mime| mime.essence_str().to_string())
                    .filter(|ct| extension_for(ct).is_some())
            })
            .ok_or_else(|| {
                AppError::Validation("Only PNG, JPEG, WebP and GIF images are accepted".into())
            })?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file: {e}")))?;
        if data.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        let url = state.images.save(&data, &content_type).await?;
        info!(size = data.len(), %url, "Image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(AppError::Validation("Missing 'file' field".into()))
}

#[utoipa::path(
    get,
    path = "/uploads/{file}",
    tag = "Uploads",
    operation_id = "serveImage",
    summary = "Fetch a stored image",
    description = "Serves an image by its content-addressed file name. The content never changes \
        for a given name, so responses are cacheable forever; supports If-None-Match.",
    params(("file" = String, Path, description = "`<sha256 hex>.<ext>`")),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 404, description = "No such image (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers))]
pub async fn serve_image(
    State(state): State<AppState>,
    AppPath(file): AppPath<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let image = state.images.load(&file).await.map_err(|e| match e {
        StorageError::NotFound(_) | StorageError::InvalidHash(_) => {
            AppError::NotFound("Image not found".into())
        }
        other => other.into(),
    })?;

    let etag_value = format!("\"{}\"", image.hash);
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, image.content_type)
        .header(header::CONTENT_LENGTH, image.data.len().to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from(image.data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
