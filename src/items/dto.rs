use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::tagging::{TagRecord, TagSource};

/// Item as returned to clients, with a short-lived image URL.
#[derive(Debug, Clone, Serialize)]
pub struct ItemView {
    pub id: Uuid,
    pub image_url: String,
    #[serde(flatten)]
    pub tags: TagRecord,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct UploadedItem {
    #[serde(flatten)]
    pub item: ItemView,
    pub tag_source: TagSource,
    pub synthesized: bool,
}

#[derive(Debug, Serialize)]
pub struct UploadedOutfitPhoto {
    pub items: Vec<UploadedItem>,
    pub total: usize,
    /// Detected garments that could not be stored.
    pub failed: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemListQuery {
    pub slot: Option<String>,
}
