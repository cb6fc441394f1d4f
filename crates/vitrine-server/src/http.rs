use std::io::Cursor;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};

use vitrine_theme::ThemeService;

use crate::error::ApiError;

type AppState = Arc<ThemeService>;

pub fn build_router(service: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/themes", post(install_theme).get(list_themes))
        .route("/themes/{id}", put(replace_theme))
        .route("/themes/{id}", delete(remove_theme))
        .route("/themes/{id}", get(get_theme))
        .route("/themes/{id}/preview", get(preview_theme))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// The uploaded archive plus its form fields, pulled out of the multipart
/// body before any pipeline work starts.
struct Upload {
    archive: Vec<u8>,
    id: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, ApiError> {
    let mut archive = None;
    let mut id = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                if !file_name.to_ascii_lowercase().ends_with(".zip") {
                    return Err(ApiError::bad_request(
                        "theme upload must be a .zip archive",
                    ));
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("upload truncated: {e}")))?;
                archive = Some(bytes.to_vec());
            }
            "id" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("invalid id field: {e}")))?;
                if !value.is_empty() {
                    id = Some(value);
                }
            }
            _ => {}
        }
    }

    let archive = archive
        .ok_or_else(|| ApiError::bad_request("missing 'file' field in multipart body"))?;
    Ok(Upload { archive, id })
}

/// Run blocking pipeline work off the async executor. `spawn_blocking`
/// tasks run to completion even if the request future is dropped, so a
/// disconnected upload still finishes its rollback and releases the
/// per-theme lock.
async fn run_pipeline<T, F>(task: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> vitrine_theme::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::internal(format!("pipeline task failed: {e}")))?
        .map_err(ApiError::from)
}

async fn install_theme(
    State(service): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    let record =
        run_pipeline(move || service.install(upload.id, Cursor::new(upload.archive))).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn replace_theme(
    State(service): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let upload = read_upload(multipart).await?;
    let record =
        run_pipeline(move || service.replace(&id, Cursor::new(upload.archive))).await?;
    Ok(Json(record))
}

async fn remove_theme(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    run_pipeline(move || service.remove(&id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_theme(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = run_pipeline(move || service.get(&id)).await?;
    Ok(Json(record))
}

async fn list_themes(
    State(service): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let themes = run_pipeline(move || service.list()).await?;
    Ok(Json(themes))
}

async fn preview_theme(
    State(service): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let html = run_pipeline(move || service.render_preview(&id)).await?;
    Ok(Html(html))
}
