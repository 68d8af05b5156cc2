use std::io::Cursor;

use anyhow::{anyhow, Context};
use bytes::Bytes;
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageOutputFormat};
use tracing::warn;
use uuid::Uuid;

use crate::{state::AppState, storage::StorageClient, tagging::BoundingBox};

const JPEG_QUALITY: u8 = 85;
const PRESIGN_TTL_SECS: u64 = 30 * 60;

/// One uploaded file as received from the client.
pub struct UploadItem {
    pub body: Bytes,
    pub file_name: String,
}

/// Decodes an upload and scales it down so neither edge exceeds `max_dimension`.
pub fn decode_normalized(body: &[u8], max_dimension: u32) -> anyhow::Result<DynamicImage> {
    let img = image::load_from_memory(body).map_err(|e| anyhow!("failed to decode image: {}", e))?;
    let (w, h) = img.dimensions();
    if w > max_dimension || h > max_dimension {
        Ok(img.resize(max_dimension, max_dimension, FilterType::Triangle))
    } else {
        Ok(img)
    }
}

pub fn encode_jpeg(img: &DynamicImage) -> anyhow::Result<Bytes> {
    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut out = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|e| anyhow!("failed to encode jpeg: {}", e))?;
    Ok(Bytes::from(out))
}

/// Crops to a percentage bounding box. Degenerate boxes yield the whole image.
pub fn crop_to_box(img: &DynamicImage, bbox: BoundingBox) -> DynamicImage {
    let bbox = bbox.clamped();
    let (w, h) = img.dimensions();
    let x0 = (w as f64 * bbox.x_min / 100.0).floor() as u32;
    let y0 = (h as f64 * bbox.y_min / 100.0).floor() as u32;
    let x1 = ((w as f64 * bbox.x_max / 100.0).ceil() as u32).min(w);
    let y1 = ((h as f64 * bbox.y_max / 100.0).ceil() as u32).min(h);
    if x1 <= x0 || y1 <= y0 {
        return img.clone();
    }
    img.crop_imm(x0, y0, x1 - x0, y1 - y0)
}

pub fn image_key(kind: &str, owner: Uuid, id: Uuid) -> String {
    format!("{}/{}/{}.jpg", kind, owner, id)
}

pub async fn store_jpeg(st: &AppState, key: &str, jpeg: Bytes) -> anyhow::Result<()> {
    st.storage
        .put_object(key, jpeg, "image/jpeg")
        .await
        .with_context(|| format!("put_object {}", key))
}

/// Deletes a blob, logging instead of failing.
pub async fn discard(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = %e, key = %key, "blob delete failed, leaving orphan");
    }
}

pub async fn presign(st: &AppState, key: &str) -> anyhow::Result<String> {
    st.storage
        .presign_get(key, PRESIGN_TTL_SECS)
        .await
        .with_context(|| format!("presign url for key {}", key))
}
