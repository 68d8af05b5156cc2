use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Saved outfit. Items are referenced by id and resolved at read time.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Outfit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: Option<String>,
    pub item_ids: Vec<Uuid>,
    pub filters: Option<Value>,
    pub created_at: OffsetDateTime,
}
