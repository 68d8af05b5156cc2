use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::items::dto::ItemView;

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    pub formality: Option<String>,
    pub color: Option<String>,
    pub season: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedOutfitView {
    pub outfit: BTreeMap<String, ItemView>,
    pub slots_used: Vec<String>,
    pub total_items: usize,
    pub items_by_slot: BTreeMap<String, usize>,
}

#[derive(Debug, Deserialize)]
pub struct SaveOutfitRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub items: Vec<Uuid>,
    /// Stored as given.
    #[serde(default)]
    pub filters: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RenameOutfitRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutfitView {
    pub id: Uuid,
    pub name: Option<String>,
    pub items: Vec<ItemView>,
    pub filters: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
