use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Structured attributes describing one garment image.
///
/// Every field is always populated; gaps in the tagging source are filled with the
/// defaults from [`RawTags::into_record`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TagRecord {
    pub slot: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub color_primary: String,
    pub colors_secondary: Vec<String>,
    pub pattern: String,
    pub material: String,
    pub fit: String,
    pub formality: String,
    pub season: Vec<String>,
    pub features: Vec<String>,
    pub brand_or_logo_visible: bool,
    pub notes: String,
}

impl TagRecord {
    /// Fully defaulted record, used when the vision model could not be consulted.
    pub fn fallback(item_type: &str, notes: String) -> Self {
        RawTags::default().into_record(item_type).with_notes(notes)
    }

    fn with_notes(mut self, notes: String) -> Self {
        self.notes = notes;
        self
    }
}

/// How a [`TagRecord`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagSource {
    /// Parsed from the vision model's answer.
    Model,
    /// Synthesized because no vision credential is configured.
    Mock,
    /// Synthesized because the vision call or its parsing failed.
    Fallback,
}

/// Tagging result. Always carries a valid record.
#[derive(Debug, Clone)]
pub struct Tagged {
    pub record: TagRecord,
    pub source: TagSource,
}

impl Tagged {
    pub fn synthesized(&self) -> bool {
        self.source != TagSource::Model
    }
}

/// Tag object as the model returns it; any key may be missing or null.
#[derive(Debug, Default, Deserialize)]
pub struct RawTags {
    pub slot: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub color_primary: Option<String>,
    pub colors_secondary: Option<Vec<String>>,
    pub pattern: Option<String>,
    pub material: Option<String>,
    pub fit: Option<String>,
    pub formality: Option<String>,
    pub season: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub brand_or_logo_visible: Option<bool>,
    pub notes: Option<String>,
}

impl RawTags {
    pub fn into_record(self, default_type: &str) -> TagRecord {
        TagRecord {
            slot: self
                .slot
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "other".into()),
            item_type: self.item_type.unwrap_or_else(|| default_type.into()),
            color_primary: self.color_primary.unwrap_or_else(|| "unknown".into()),
            colors_secondary: self.colors_secondary.unwrap_or_default(),
            pattern: self.pattern.unwrap_or_else(|| "solid".into()),
            material: self.material.unwrap_or_else(|| "unknown".into()),
            fit: self.fit.unwrap_or_else(|| "regular".into()),
            formality: self.formality.unwrap_or_else(|| "casual".into()),
            season: self.season.unwrap_or_default(),
            features: self.features.unwrap_or_default(),
            brand_or_logo_visible: self.brand_or_logo_visible.unwrap_or(false),
            notes: self.notes.unwrap_or_default(),
        }
    }
}

/// Removes the markdown code fence a model may wrap its JSON answer in.
pub fn strip_code_fences(content: &str) -> &str {
    let mut s = content.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

pub fn parse_tag_response(content: &str, default_type: &str) -> serde_json::Result<TagRecord> {
    let raw: RawTags = serde_json::from_str(strip_code_fences(content))?;
    Ok(raw.into_record(default_type))
}
