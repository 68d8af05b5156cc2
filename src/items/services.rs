use image::DynamicImage;
use rand::Rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ItemView, UploadedItem, UploadedOutfitPhoto},
    repo,
    repo_types::Item,
};
use crate::{
    error::AppError,
    images::services::{self as images, UploadItem},
    state::AppState,
    tagging::{DetectedItem, ItemHint, TagImage, Tagged},
};

pub async fn view(st: &AppState, item: Item) -> anyhow::Result<ItemView> {
    let image_url = images::presign(st, &item.image_key).await?;
    Ok(ItemView {
        id: item.id,
        image_url,
        tags: item.tags,
        created_at: item.created_at,
    })
}

pub async fn views(st: &AppState, items: Vec<Item>) -> anyhow::Result<Vec<ItemView>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(view(st, item).await?);
    }
    Ok(out)
}

fn decode_upload(st: &AppState, upload: &UploadItem) -> Result<DynamicImage, AppError> {
    images::decode_normalized(&upload.body, st.config.image_max_dimension)
        .map_err(|e| AppError::Validation(format!("Uploaded file is not a readable image: {e}")))
}

/// Stores one normalized image, tags it and persists the item. The blob is removed
/// again when the insert fails.
async fn store_and_tag<R: Rng + Send>(
    st: &AppState,
    user_id: Uuid,
    img: &DynamicImage,
    file_name: &str,
    hint: Option<&ItemHint>,
    rng: &mut R,
) -> Result<(Item, Tagged), AppError> {
    let jpeg = images::encode_jpeg(img)?;
    let item_id = Uuid::new_v4();
    let key = images::image_key("items", user_id, item_id);
    images::store_jpeg(st, &key, jpeg.clone()).await?;

    let image = TagImage {
        file_name,
        jpeg: &jpeg,
    };
    let tagged = match hint {
        Some(h) => st.tagger.tag_with_context(&image, h, rng).await,
        None => st.tagger.tag(&image, rng).await,
    };

    let item = match repo::insert_item(&st.db, item_id, user_id, &key, &tagged.record).await {
        Ok(item) => item,
        Err(e) => {
            images::discard(st.storage.as_ref(), &key).await;
            return Err(e.into());
        }
    };
    Ok((item, tagged))
}

async fn uploaded(st: &AppState, item: Item, tagged: Tagged) -> anyhow::Result<UploadedItem> {
    Ok(UploadedItem {
        item: view(st, item).await?,
        tag_source: tagged.source,
        synthesized: tagged.synthesized(),
    })
}

#[instrument(skip(st, upload, rng), fields(file = %upload.file_name))]
pub async fn upload_single<R: Rng + Send>(
    st: &AppState,
    user_id: Uuid,
    upload: UploadItem,
    rng: &mut R,
) -> Result<UploadedItem, AppError> {
    let img = decode_upload(st, &upload)?;
    let (item, tagged) = store_and_tag(st, user_id, &img, &upload.file_name, None, rng).await?;
    info!(item_id = %item.id, slot = %item.tags.slot, source = ?tagged.source, "item added");
    Ok(uploaded(st, item, tagged).await?)
}

/// Splits a whole-outfit photo into one item per detected garment.
#[instrument(skip(st, upload, rng), fields(file = %upload.file_name))]
pub async fn upload_outfit_photo<R: Rng + Send>(
    st: &AppState,
    user_id: Uuid,
    upload: UploadItem,
    rng: &mut R,
) -> Result<UploadedOutfitPhoto, AppError> {
    let img = decode_upload(st, &upload)?;
    let full = images::encode_jpeg(&img)?;
    let detected = st
        .tagger
        .detect_items(&TagImage {
            file_name: &upload.file_name,
            jpeg: &full,
        })
        .await;
    info!(count = detected.len(), "garments detected");
    store_detected(st, user_id, &img, &upload.file_name, &detected, rng).await
}

/// Stores every detected garment on its own. Garments that fail are counted and
/// skipped; the call fails only when none could be stored.
async fn store_detected<R: Rng + Send>(
    st: &AppState,
    user_id: Uuid,
    img: &DynamicImage,
    file_name: &str,
    detected: &[DetectedItem],
    rng: &mut R,
) -> Result<UploadedOutfitPhoto, AppError> {
    let mut items = Vec::with_capacity(detected.len());
    let mut first_error = None;
    let mut failed = 0;
    for d in detected {
        let crop = images::crop_to_box(img, d.bbox_estimate);
        let stored = match store_and_tag(st, user_id, &crop, file_name, Some(&d.hint), rng).await {
            Ok((item, tagged)) => uploaded(st, item, tagged).await.map_err(AppError::from),
            Err(e) => Err(e),
        };
        match stored {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(error = %e, item_type = %d.hint.item_type, "garment could not be stored");
                failed += 1;
                first_error.get_or_insert(e);
            }
        }
    }
    if let (true, Some(e)) = (items.is_empty(), first_error) {
        return Err(e);
    }
    Ok(UploadedOutfitPhoto {
        total: items.len(),
        items,
        failed,
    })
}

/// Deletes the record, then its blob. Blob failures are logged only.
pub async fn delete_item(st: &AppState, user_id: Uuid, item_id: Uuid) -> Result<(), AppError> {
    let key = repo::delete_item(&st.db, user_id, item_id)
        .await?
        .ok_or(AppError::NotFound("Item"))?;
    images::discard(st.storage.as_ref(), &key).await;
    info!(%item_id, "item deleted");
    Ok(())
}
