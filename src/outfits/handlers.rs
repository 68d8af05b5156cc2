use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    assembler::OutfitFilters,
    dto::{GenerateQuery, GeneratedOutfitView, OutfitView, RenameOutfitRequest, SaveOutfitRequest},
    repo, services,
};
use crate::{auth::jwt::AuthUser, error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/outfits", get(list_outfits).post(save_outfit))
        .route("/outfits/generate", get(generate_outfit))
        .route(
            "/outfits/:id",
            get(get_outfit).patch(rename_outfit).delete(delete_outfit),
        )
}

#[instrument(skip(state))]
pub async fn generate_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<GenerateQuery>,
) -> Result<Json<GeneratedOutfitView>, AppError> {
    let filters = OutfitFilters::new(q.formality, q.color, q.season);
    let mut rng = StdRng::from_entropy();
    match services::generate_for_user(&state, user_id, &filters, &mut rng).await {
        Ok(view) => Ok(Json(view)),
        Err(e @ AppError::NoMatchingItems { .. }) => {
            warn!(%user_id, ?filters, "no items match outfit filters");
            Err(e)
        }
        Err(e) => Err(e),
    }
}

#[instrument(skip(state, payload))]
pub async fn save_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SaveOutfitRequest>,
) -> Result<(StatusCode, Json<OutfitView>), AppError> {
    let view = services::save(&state, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[instrument(skip(state))]
pub async fn list_outfits(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<OutfitView>>, AppError> {
    Ok(Json(services::list_views(&state, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OutfitView>, AppError> {
    let outfit = repo::get_by_id(&state.db, user_id, id)
        .await?
        .ok_or(AppError::NotFound("Outfit"))?;
    Ok(Json(services::view_one(&state, user_id, outfit).await?))
}

#[instrument(skip(state, payload))]
pub async fn rename_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RenameOutfitRequest>,
) -> Result<Json<OutfitView>, AppError> {
    Ok(Json(services::rename(&state, user_id, id, payload.name).await?))
}

#[instrument(skip(state))]
pub async fn delete_outfit(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::delete_outfit(&state.db, user_id, id).await? {
        return Err(AppError::NotFound("Outfit"));
    }
    info!(outfit_id = %id, "outfit deleted");
    Ok(StatusCode::NO_CONTENT)
}
