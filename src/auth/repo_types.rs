use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                          // unique user ID
    pub email: Option<String>,             // email or phone is required
    pub phone: Option<String>,
    pub name: String,                      // display name
    pub username: String,                  // unique login name
    #[serde(skip_serializing)]
    pub password_hash: String,             // Argon2 hash, not exposed in JSON
    pub profile_photo_key: Option<String>, // blob key of the profile photo
    pub created_at: OffsetDateTime,        // creation timestamp
}

/// Validated signup data ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub profile_photo_key: Option<String>,
}
