use axum::extract::FromRef;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::{
    auth::{
        dto::{AuthResponse, PublicUser, SignupRequest},
        jwt::JwtKeys,
        repo_types::User,
    },
    error::AppError,
    images::services as images,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const PROFILE_PHOTO_MAX_DIMENSION: u32 = 512;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

/// Signup fields after trimming and validation.
#[derive(Debug, PartialEq)]
pub struct ValidSignup {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub username: String,
}

fn blank_to_none(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn validate_signup(req: &SignupRequest) -> Result<ValidSignup, AppError> {
    let email = blank_to_none(req.email.clone()).map(|e| e.to_lowercase());
    let phone = blank_to_none(req.phone.clone());
    let name = req.name.trim().to_string();
    let username = req.username.trim().to_lowercase();

    if email.is_none() && phone.is_none() {
        return Err(AppError::Validation("Email or phone is required".into()));
    }
    if let Some(e) = &email {
        if !is_valid_email(e) {
            return Err(AppError::Validation("Invalid email".into()));
        }
    }
    if let Some(p) = &phone {
        if !is_valid_phone(p) {
            return Err(AppError::Validation("Invalid phone number".into()));
        }
    }
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation("Password too short".into()));
    }

    Ok(ValidSignup {
        email,
        phone,
        name,
        username,
    })
}

/// Decodes, normalizes and stores a base64 profile photo; returns its blob key.
pub async fn store_profile_photo(
    st: &AppState,
    user_id: Uuid,
    encoded: &str,
) -> Result<String, AppError> {
    // tolerate data-URL prefixes from browsers
    let payload = encoded
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(encoded)
        .trim();
    let raw = STANDARD
        .decode(payload)
        .map_err(|_| AppError::Validation("Profile photo is not valid base64".into()))?;
    let img = images::decode_normalized(&raw, PROFILE_PHOTO_MAX_DIMENSION)
        .map_err(|e| AppError::Validation(format!("Unreadable profile photo: {e}")))?;
    let jpeg = images::encode_jpeg(&img)?;
    let key = images::image_key("profiles", user_id, Uuid::new_v4());
    images::store_jpeg(st, &key, jpeg).await?;
    Ok(key)
}

pub async fn public_user(st: &AppState, user: User) -> anyhow::Result<PublicUser> {
    let profile_photo_url = match &user.profile_photo_key {
        Some(key) => Some(images::presign(st, key).await?),
        None => None,
    };
    Ok(PublicUser {
        id: user.id,
        email: user.email,
        phone: user.phone,
        name: user.name,
        username: user.username,
        profile_photo_url,
    })
}

pub async fn auth_response(st: &AppState, user: User) -> anyhow::Result<AuthResponse> {
    let keys = JwtKeys::from_ref(st);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        user: public_user(st, user).await?,
    })
}
