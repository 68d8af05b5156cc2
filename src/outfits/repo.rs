use anyhow::Context;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::Outfit;

const OUTFIT_COLUMNS: &str = "id, user_id, name, item_ids, filters, created_at";

pub async fn insert_outfit(
    db: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    item_ids: &[Uuid],
    filters: Option<&Value>,
) -> anyhow::Result<Outfit> {
    let outfit = sqlx::query_as::<_, Outfit>(&format!(
        r#"
        INSERT INTO outfits (id, user_id, name, item_ids, filters)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {OUTFIT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(name)
    .bind(item_ids)
    .bind(filters)
    .fetch_one(db)
    .await
    .context("insert outfit")?;
    Ok(outfit)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Outfit>> {
    let rows = sqlx::query_as::<_, Outfit>(&format!(
        "SELECT {OUTFIT_COLUMNS} FROM outfits WHERE user_id = $1 ORDER BY created_at DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list outfits by user")?;
    Ok(rows)
}

pub async fn get_by_id(db: &PgPool, user_id: Uuid, outfit_id: Uuid) -> anyhow::Result<Option<Outfit>> {
    let row = sqlx::query_as::<_, Outfit>(&format!(
        "SELECT {OUTFIT_COLUMNS} FROM outfits WHERE id = $1 AND user_id = $2"
    ))
    .bind(outfit_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get outfit")?;
    Ok(row)
}

pub async fn rename(
    db: &PgPool,
    user_id: Uuid,
    outfit_id: Uuid,
    name: Option<&str>,
) -> anyhow::Result<Option<Outfit>> {
    let row = sqlx::query_as::<_, Outfit>(&format!(
        "UPDATE outfits SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING {OUTFIT_COLUMNS}"
    ))
    .bind(outfit_id)
    .bind(user_id)
    .bind(name)
    .fetch_optional(db)
    .await
    .context("rename outfit")?;
    Ok(row)
}

/// Returns false when nothing was deleted.
pub async fn delete_outfit(db: &PgPool, user_id: Uuid, outfit_id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM outfits WHERE id = $1 AND user_id = $2")
        .bind(outfit_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete outfit")?;
    Ok(res.rows_affected() > 0)
}
