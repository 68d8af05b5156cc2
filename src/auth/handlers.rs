use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, SignupRequest},
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        repo_types::{NewUser, User},
        services::{auth_response, public_user, store_profile_photo, validate_signup},
    },
    error::AppError,
    images::services as images,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let valid = match validate_signup(&payload) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "invalid signup");
            return Err(e);
        }
    };

    if let Some(field) = User::find_conflict(
        &state.db,
        &valid.username,
        valid.email.as_deref(),
        valid.phone.as_deref(),
    )
    .await?
    {
        warn!(username = %valid.username, field, "signup conflict");
        return Err(AppError::Conflict(format!("{} already registered", field)));
    }

    let password_hash = hash_password(&payload.password)?;
    let user_id = Uuid::new_v4();
    let profile_photo_key = match payload.profile_photo.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(encoded) => Some(store_profile_photo(&state, user_id, encoded).await?),
        None => None,
    };

    let new_user = NewUser {
        id: user_id,
        email: valid.email,
        phone: valid.phone,
        name: valid.name,
        username: valid.username,
        password_hash,
        profile_photo_key,
    };

    let user = match User::create(&state.db, &new_user).await {
        Ok(u) => u,
        Err(e) => {
            if let Some(key) = &new_user.profile_photo_key {
                images::discard(state.storage.as_ref(), key).await;
            }
            if e
                .as_database_error()
                .map(|d| d.is_unique_violation())
                .unwrap_or(false)
            {
                warn!(username = %new_user.username, "signup lost a uniqueness race");
                return Err(AppError::Conflict("Account already registered".into()));
            }
            error!(error = %e, "create user failed");
            return Err(AppError::Internal(e.into()));
        }
    };

    info!(user_id = %user.id, username = %user.username, "user signed up");
    Ok((StatusCode::CREATED, Json(auth_response(&state, user).await?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let username = payload.username.trim().to_lowercase();

    let user = match User::find_by_username(&state.db, &username).await? {
        Some(u) => u,
        None => {
            warn!(username = %username, "login unknown username");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(username = %username, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(auth_response(&state, user).await?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(auth_response(&state, user).await?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = match User::find_by_id(&state.db, user_id).await? {
        Some(u) => u,
        None => {
            error!(user_id = %user_id, "user not found");
            return Err(AppError::Unauthorized("User not found".into()));
        }
    };

    Ok(Json(public_user(&state, user).await?))
}
