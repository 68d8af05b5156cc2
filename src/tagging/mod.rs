//! Garment tagging: turns an image into a [`TagRecord`].
//!
//! Tagging never fails from the caller's point of view. Without a vision credential
//! the records are synthesized by [`mock`]; when the model call or its parsing fails
//! a defaulted record is returned with the error text in `notes`.

pub mod mock;
pub mod record;
pub mod vision;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub use record::{TagRecord, TagSource, Tagged};

use crate::config::VisionConfig;
use record::{parse_tag_response, strip_code_fences};
use vision::{VisionClient, VisionError};

const TAG_MAX_TOKENS: u32 = 1000;
const DETECT_MAX_TOKENS: u32 = 2000;

const TAG_SCHEMA: &str = r#"{
  "slot": "one of: top, bottom, shoes, outerwear, accessory, dress, other",
  "type": "specific garment type, e.g. 't-shirt', 'jeans', 'sneakers', 'jacket', 'sunglasses'",
  "color_primary": "dominant color, e.g. 'black', 'white', 'blue'",
  "colors_secondary": ["other visible colors, may be empty"],
  "pattern": "e.g. 'solid', 'striped', 'plaid', 'polka dot', 'floral'",
  "material": "e.g. 'cotton', 'denim', 'leather', 'polyester', 'wool'",
  "fit": "e.g. 'slim', 'regular', 'loose', 'oversized', 'fitted'",
  "formality": "e.g. 'casual', 'business casual', 'formal', 'sporty'",
  "season": ["any of 'spring', 'summer', 'fall', 'winter'"],
  "features": ["notable details such as 'long sleeve', 'hood', 'pockets'"],
  "brand_or_logo_visible": true,
  "notes": "anything else worth knowing about the garment"
}"#;

const DETECT_PROMPT: &str = r#"The image shows a person wearing an outfit or several garments laid out together.
List every distinct piece of clothing you can see (tops, bottoms, shoes, outerwear, accessories).

Answer with a JSON array where each element looks like:
{
  "description": "short description of the garment and where it is in the image",
  "item_type": "garment type, e.g. 'shirt', 'pants', 'shoes', 'jacket'",
  "bbox_estimate": { "x_min": 0, "y_min": 0, "x_max": 100, "y_max": 100 }
}
Bounding box values are percentages of the image width and height (0-100).

Answer with the JSON array only, without markdown."#;

fn single_item_prompt() -> String {
    format!(
        "Describe the clothing item in this image as a JSON object with exactly these keys:\n\
         {TAG_SCHEMA}\n\nAnswer with the JSON object only, without markdown or extra text."
    )
}

fn contextual_prompt(hint: &ItemHint) -> String {
    format!(
        "The image may show several garments or a person wearing an outfit. \
         Describe only this garment: {} (it looks like: {}).\n\
         Answer with a JSON object with exactly these keys:\n\
         {TAG_SCHEMA}\n\nAnswer with the JSON object only, without markdown or extra text.",
        hint.description, hint.item_type
    )
}

/// Image handed to the tagger: the stored, normalized JPEG plus the name it was
/// uploaded under.
#[derive(Debug, Clone, Copy)]
pub struct TagImage<'a> {
    pub file_name: &'a str,
    pub jpeg: &'a [u8],
}

/// Which garment to focus on when a photo contains several.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemHint {
    pub description: String,
    pub item_type: String,
}

fn unknown_type() -> String {
    "unknown".into()
}

/// Bounding box in percent of image width/height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BoundingBox {
    pub const FULL: BoundingBox = BoundingBox {
        x_min: 0.0,
        y_min: 0.0,
        x_max: 100.0,
        y_max: 100.0,
    };

    pub fn clamped(self) -> Self {
        let c = |v: f64| if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 };
        let (x0, x1) = (c(self.x_min), c(self.x_max));
        let (y0, y1) = (c(self.y_min), c(self.y_max));
        Self {
            x_min: x0.min(x1),
            y_min: y0.min(y1),
            x_max: x0.max(x1),
            y_max: y0.max(y1),
        }
    }
}

/// One garment found in a multi-item photo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectedItem {
    #[serde(flatten)]
    pub hint: ItemHint,
    pub bbox_estimate: BoundingBox,
}

/// Detection entry as the model returns it; any key may be missing or null.
#[derive(Debug, Deserialize)]
struct RawDetection {
    description: Option<String>,
    item_type: Option<String>,
    bbox_estimate: Option<serde_json::Value>,
}

impl RawDetection {
    fn into_detected(self) -> DetectedItem {
        let bbox = self
            .bbox_estimate
            .and_then(|v| serde_json::from_value::<BoundingBox>(v).ok())
            .unwrap_or(BoundingBox::FULL);
        DetectedItem {
            hint: ItemHint {
                description: self.description.unwrap_or_default(),
                item_type: self
                    .item_type
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(unknown_type),
            },
            bbox_estimate: bbox.clamped(),
        }
    }
}

impl DetectedItem {
    pub fn full_image() -> Self {
        Self {
            hint: ItemHint {
                description: "full image".into(),
                item_type: unknown_type(),
            },
            bbox_estimate: BoundingBox::FULL,
        }
    }
}

pub struct Tagger {
    vision: Option<VisionClient>,
}

impl Tagger {
    pub fn from_config(cfg: &VisionConfig) -> Self {
        let vision = match (&cfg.api_key, cfg.force_mock) {
            (Some(key), false) => Some(VisionClient::new(cfg, key.clone())),
            _ => None,
        };
        if vision.is_none() {
            info!("vision tagging disabled, items will receive mock tags");
        }
        Self { vision }
    }

    #[cfg(test)]
    pub fn mock() -> Self {
        Self { vision: None }
    }

    pub fn is_mock(&self) -> bool {
        self.vision.is_none()
    }

    pub async fn tag<R: Rng + Send>(&self, image: &TagImage<'_>, rng: &mut R) -> Tagged {
        self.tag_inner(image, None, rng).await
    }

    pub async fn tag_with_context<R: Rng + Send>(
        &self,
        image: &TagImage<'_>,
        hint: &ItemHint,
        rng: &mut R,
    ) -> Tagged {
        self.tag_inner(image, Some(hint), rng).await
    }

    async fn tag_inner<R: Rng + Send>(
        &self,
        image: &TagImage<'_>,
        hint: Option<&ItemHint>,
        rng: &mut R,
    ) -> Tagged {
        let Some(vision) = &self.vision else {
            return Tagged {
                record: mock::mock_tags(image.file_name, hint, rng),
                source: TagSource::Mock,
            };
        };

        let default_type = hint.map(|h| h.item_type.as_str()).unwrap_or("unknown");
        let prompt = match hint {
            Some(h) => contextual_prompt(h),
            None => single_item_prompt(),
        };

        match request_tags(vision, &prompt, image.jpeg, default_type).await {
            Ok(record) => Tagged {
                record,
                source: TagSource::Model,
            },
            Err(e) => {
                warn!(error = %e, file = %image.file_name, "vision tagging failed, using defaults");
                Tagged {
                    record: TagRecord::fallback(default_type, format!("Error: {e}")),
                    source: TagSource::Fallback,
                }
            }
        }
    }

    /// Lists the garments in a whole-outfit photo. Falls back to a single entry
    /// covering the full image.
    pub async fn detect_items(&self, image: &TagImage<'_>) -> Vec<DetectedItem> {
        let Some(vision) = &self.vision else {
            return vec![DetectedItem::full_image()];
        };

        match request_detections(vision, image.jpeg).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, file = %image.file_name, "garment detection failed, using full image");
                vec![DetectedItem::full_image()]
            }
        }
    }
}

async fn request_tags(
    vision: &VisionClient,
    prompt: &str,
    jpeg: &[u8],
    default_type: &str,
) -> Result<TagRecord, VisionError> {
    let content = vision.complete(prompt, jpeg, TAG_MAX_TOKENS).await?;
    Ok(parse_tag_response(&content, default_type)?)
}

async fn request_detections(
    vision: &VisionClient,
    jpeg: &[u8],
) -> Result<Vec<DetectedItem>, VisionError> {
    let content = vision.complete(DETECT_PROMPT, jpeg, DETECT_MAX_TOKENS).await?;
    parse_detections(&content)
}

/// Parses the model's garment list. Entries that are not usable objects are
/// skipped; the answer fails only when nothing usable remains.
pub fn parse_detections(content: &str) -> Result<Vec<DetectedItem>, VisionError> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(content))?;
    let serde_json::Value::Array(entries) = value else {
        return Err(VisionError::UnexpectedShape("expected a JSON array"));
    };
    let total = entries.len();
    let items: Vec<DetectedItem> = entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<RawDetection>(entry).ok())
        .map(RawDetection::into_detected)
        .collect();
    if items.is_empty() {
        return Err(VisionError::UnexpectedShape("no garments detected"));
    }
    if items.len() < total {
        warn!(skipped = total - items.len(), "ignoring unusable detection entries");
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn image() -> TagImage<'static> {
        TagImage {
            file_name: "black_jacket.jpg",
            jpeg: b"not really a jpeg",
        }
    }

    /// Points at a port nothing listens on, so every call fails fast.
    fn unreachable_tagger() -> Tagger {
        let cfg = VisionConfig {
            api_key: Some("sk-test".into()),
            base_url: "http://127.0.0.1:9".into(),
            model: "gpt-4o".into(),
            force_mock: false,
        };
        Tagger::from_config(&cfg)
    }

    #[test]
    fn missing_key_or_forced_mock_selects_mock_mode() {
        let mut cfg = VisionConfig {
            api_key: None,
            base_url: "http://localhost".into(),
            model: "gpt-4o".into(),
            force_mock: false,
        };
        assert!(Tagger::from_config(&cfg).is_mock());
        cfg.api_key = Some("sk-test".into());
        assert!(!Tagger::from_config(&cfg).is_mock());
        cfg.force_mock = true;
        assert!(Tagger::from_config(&cfg).is_mock());
    }

    #[tokio::test]
    async fn mock_mode_tags_are_synthesized() {
        let mut rng = StdRng::seed_from_u64(11);
        let tagged = Tagger::mock().tag(&image(), &mut rng).await;
        assert_eq!(tagged.source, TagSource::Mock);
        assert!(tagged.synthesized());
        assert_eq!(tagged.record.slot, "outerwear");
        assert_eq!(tagged.record.notes, mock::MOCK_NOTES);
    }

    #[tokio::test]
    async fn mock_mode_uses_context_hint() {
        let mut rng = StdRng::seed_from_u64(12);
        let hint = ItemHint {
            description: "bottom half".into(),
            item_type: "skirt".into(),
        };
        let tagged = Tagger::mock()
            .tag_with_context(&image(), &hint, &mut rng)
            .await;
        assert_eq!(tagged.record.slot, "bottom");
    }

    #[tokio::test]
    async fn transport_failure_yields_defaulted_record() {
        let mut rng = StdRng::seed_from_u64(13);
        let tagged = unreachable_tagger().tag(&image(), &mut rng).await;
        assert_eq!(tagged.source, TagSource::Fallback);
        assert!(tagged.synthesized());
        assert_eq!(tagged.record.slot, "other");
        assert_eq!(tagged.record.item_type, "unknown");
        assert!(tagged.record.notes.starts_with("Error: "));
    }

    #[tokio::test]
    async fn contextual_failure_keeps_hint_type() {
        let mut rng = StdRng::seed_from_u64(14);
        let hint = ItemHint {
            description: "feet".into(),
            item_type: "sneakers".into(),
        };
        let tagged = unreachable_tagger()
            .tag_with_context(&image(), &hint, &mut rng)
            .await;
        assert_eq!(tagged.source, TagSource::Fallback);
        assert_eq!(tagged.record.item_type, "sneakers");
    }

    #[tokio::test]
    async fn detection_falls_back_to_full_image() {
        assert_eq!(
            Tagger::mock().detect_items(&image()).await,
            vec![DetectedItem::full_image()]
        );
        assert_eq!(
            unreachable_tagger().detect_items(&image()).await,
            vec![DetectedItem::full_image()]
        );
    }

    #[test]
    fn detections_parse_and_clamp() {
        let content = r#"```json
        [
          {"description": "white shirt, upper body", "item_type": "shirt",
           "bbox_estimate": {"x_min": 20, "y_min": 10, "x_max": 80, "y_max": 50}},
          {"description": "shoes", "item_type": "shoes",
           "bbox_estimate": {"x_min": 110, "y_min": 90, "x_max": -5, "y_max": 100}}
        ]
        ```"#;
        let items = parse_detections(content).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].hint.item_type, "shirt");
        assert_eq!(items[0].bbox_estimate.x_min, 20.0);
        assert_eq!(
            items[1].bbox_estimate,
            BoundingBox {
                x_min: 0.0,
                y_min: 90.0,
                x_max: 100.0,
                y_max: 100.0
            }
        );
    }

    #[test]
    fn detections_reject_objects_and_empty_lists() {
        assert!(parse_detections(r#"{"items": []}"#).is_err());
        assert!(parse_detections("[]").is_err());
        assert!(parse_detections("no json here").is_err());
    }

    #[test]
    fn null_fields_keep_the_rest_of_the_detections() {
        let content = r#"[
          {"description": "denim jacket", "item_type": "jacket",
           "bbox_estimate": {"x_min": 10, "y_min": 5, "x_max": 90, "y_max": 60}},
          {"description": null, "item_type": null, "bbox_estimate": null},
          "a stray string",
          {"description": "boots", "item_type": "boots",
           "bbox_estimate": {"x_min": null, "y_min": 80, "x_max": 100, "y_max": 100}}
        ]"#;
        let items = parse_detections(content).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].hint.item_type, "jacket");
        assert_eq!(items[0].bbox_estimate.y_max, 60.0);
        assert_eq!(items[1].hint.item_type, "unknown");
        assert_eq!(items[1].hint.description, "");
        assert_eq!(items[1].bbox_estimate, BoundingBox::FULL);
        assert_eq!(items[2].hint.item_type, "boots");
        assert_eq!(items[2].bbox_estimate, BoundingBox::FULL);
    }

    #[test]
    fn only_unusable_entries_is_a_failure() {
        assert!(parse_detections(r#"["shirt", 3, null]"#).is_err());
    }

    #[test]
    fn detection_without_bbox_covers_full_image() {
        let items = parse_detections(r#"[{"description": "hat", "item_type": "hat"}]"#).unwrap();
        assert_eq!(items[0].bbox_estimate, BoundingBox::FULL);
    }

    #[test]
    fn contextual_prompt_mentions_the_garment() {
        let hint = ItemHint {
            description: "red scarf around the neck".into(),
            item_type: "scarf".into(),
        };
        let prompt = contextual_prompt(&hint);
        assert!(prompt.contains("red scarf around the neck"));
        assert!(prompt.contains("scarf"));
        assert!(single_item_prompt().contains("\"slot\""));
    }
}
