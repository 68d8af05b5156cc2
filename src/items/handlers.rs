use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{error, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ItemListQuery, ItemView, UploadedItem, UploadedOutfitPhoto},
    repo, services,
};
use crate::{
    auth::jwt::AuthUser,
    error::AppError,
    images::services::{self as images, UploadItem},
    state::AppState,
};

const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

pub fn read_router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items/:id", get(get_item).delete(delete_item))
        .route("/items/:id/image", get(get_item_image))
}

pub fn write_router() -> Router<AppState> {
    Router::new()
        .route("/items", post(upload_item))
        .route("/items/outfit", post(upload_outfit_photo))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
}

fn upload_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("Upload exceeds {} MiB", UPLOAD_LIMIT / (1024 * 1024)))
    } else {
        AppError::Validation(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Reads the `file` field of a multipart body.
async fn read_file(mut mp: Multipart) -> Result<UploadItem, AppError> {
    while let Some(field) = mp.next_field().await.map_err(upload_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let body = field.bytes().await.map_err(upload_error)?;
        if body.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }
        return Ok(UploadItem { body, file_name });
    }
    Err(AppError::Validation("file is required".into()))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ItemListQuery>,
) -> Result<Json<Vec<ItemView>>, AppError> {
    let slot = q.slot.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let items = repo::list_by_user(&state.db, user_id, slot).await?;
    Ok(Json(services::views(&state, items).await?))
}

#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemView>, AppError> {
    let item = repo::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("Item"))?;
    Ok(Json(services::view(&state, item).await?))
}

/// 302 to a presigned URL of the stored image.
#[instrument(skip(state))]
pub async fn get_item_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let item = repo::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("Item"))?;
    if !state.storage.object_exists(&item.image_key).await? {
        warn!(item_id = %id, key = %item.image_key, "item image missing from storage");
        return Err(AppError::NotFound("Image"));
    }
    let url = images::presign(&state, &item.image_key).await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

#[instrument(skip(state, mp))]
pub async fn upload_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<UploadedItem>), AppError> {
    let upload = read_file(mp).await?;
    let mut rng = StdRng::from_entropy();
    match services::upload_single(&state, user_id, upload, &mut rng).await {
        Ok(item) => Ok((StatusCode::CREATED, Json(item))),
        Err(e) => {
            error!(error = %e, %user_id, "upload_item failed");
            Err(e)
        }
    }
}

#[instrument(skip(state, mp))]
pub async fn upload_outfit_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mp: Multipart,
) -> Result<(StatusCode, Json<UploadedOutfitPhoto>), AppError> {
    let upload = read_file(mp).await?;
    let mut rng = StdRng::from_entropy();
    let stored = services::upload_outfit_photo(&state, user_id, upload, &mut rng).await?;
    if stored.failed > 0 {
        warn!(%user_id, stored = stored.total, failed = stored.failed, "outfit photo partially stored");
    }
    Ok((StatusCode::CREATED, Json(stored)))
}

#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    services::delete_item(&state, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
