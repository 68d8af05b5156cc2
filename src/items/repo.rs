use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Item;
use crate::tagging::TagRecord;

const ITEM_COLUMNS: &str = "id, user_id, image_key, slot, item_type, color_primary, \
     colors_secondary, pattern, material, fit, formality, season, features, \
     brand_or_logo_visible, notes, created_at";

pub async fn insert_item(
    db: &PgPool,
    id: Uuid,
    user_id: Uuid,
    image_key: &str,
    tags: &TagRecord,
) -> anyhow::Result<Item> {
    let item = sqlx::query_as::<_, Item>(&format!(
        r#"
        INSERT INTO items (id, user_id, image_key, slot, item_type, color_primary,
                           colors_secondary, pattern, material, fit, formality, season,
                           features, brand_or_logo_visible, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {ITEM_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .bind(image_key)
    .bind(&tags.slot)
    .bind(&tags.item_type)
    .bind(&tags.color_primary)
    .bind(&tags.colors_secondary)
    .bind(&tags.pattern)
    .bind(&tags.material)
    .bind(&tags.fit)
    .bind(&tags.formality)
    .bind(&tags.season)
    .bind(&tags.features)
    .bind(tags.brand_or_logo_visible)
    .bind(&tags.notes)
    .fetch_one(db)
    .await
    .context("insert item")?;
    Ok(item)
}

/// Items of one user, newest first, optionally restricted to a slot.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    slot: Option<&str>,
) -> anyhow::Result<Vec<Item>> {
    let rows = sqlx::query_as::<_, Item>(&format!(
        r#"
        SELECT {ITEM_COLUMNS}
          FROM items
         WHERE user_id = $1
           AND ($2::text IS NULL OR lower(slot) = lower($2))
         ORDER BY created_at DESC
        "#
    ))
    .bind(user_id)
    .bind(slot)
    .fetch_all(db)
    .await
    .context("list items by user")?;
    Ok(rows)
}

pub async fn get_by_id(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<Option<Item>> {
    let row = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE id = $1 AND user_id = $2"
    ))
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get item")?;
    Ok(row)
}

/// Resolves ids owned by `user_id`; unknown or foreign ids are skipped.
pub async fn find_many(db: &PgPool, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<Vec<Item>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, Item>(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE user_id = $1 AND id = ANY($2)"
    ))
    .bind(user_id)
    .bind(ids)
    .fetch_all(db)
    .await
    .context("find items by ids")?;
    Ok(rows)
}

/// Deletes the record and returns the blob key it referenced.
pub async fn delete_item(db: &PgPool, user_id: Uuid, item_id: Uuid) -> anyhow::Result<Option<String>> {
    let key = sqlx::query_scalar::<_, String>(
        "DELETE FROM items WHERE id = $1 AND user_id = $2 RETURNING image_key",
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("delete item")?;
    Ok(key)
}
