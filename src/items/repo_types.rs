use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tagging::TagRecord;

/// Garment record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_key: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tags: TagRecord,
    pub created_at: OffsetDateTime,
}
