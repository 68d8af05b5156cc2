use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    assembler::{self, OutfitFilters},
    dto::{GeneratedOutfitView, OutfitView, SaveOutfitRequest},
    repo,
    repo_types::Outfit,
};
use crate::{
    error::AppError,
    items::{repo as items_repo, repo_types::Item, services as item_services},
    state::AppState,
};

/// Resolves `ids` in order against `known`, skipping ids that no longer exist.
pub fn hydrate(ids: &[Uuid], known: &HashMap<Uuid, Item>) -> Vec<Item> {
    ids.iter().filter_map(|id| known.get(id).cloned()).collect()
}

fn normalize_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

async fn load_items(st: &AppState, user_id: Uuid, ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, Item>> {
    let items = items_repo::find_many(&st.db, user_id, ids).await?;
    Ok(items.into_iter().map(|i| (i.id, i)).collect())
}

async fn outfit_view(
    st: &AppState,
    outfit: Outfit,
    known: &HashMap<Uuid, Item>,
) -> anyhow::Result<OutfitView> {
    let items = hydrate(&outfit.item_ids, known);
    if items.len() < outfit.item_ids.len() {
        debug!(
            outfit_id = %outfit.id,
            missing = outfit.item_ids.len() - items.len(),
            "outfit references deleted items"
        );
    }
    Ok(OutfitView {
        id: outfit.id,
        name: outfit.name,
        items: item_services::views(st, items).await?,
        filters: outfit.filters,
        created_at: outfit.created_at,
    })
}

pub async fn view_one(st: &AppState, user_id: Uuid, outfit: Outfit) -> anyhow::Result<OutfitView> {
    let known = load_items(st, user_id, &outfit.item_ids).await?;
    outfit_view(st, outfit, &known).await
}

/// Lists outfits newest first, hydrating all of them with a single item lookup.
pub async fn list_views(st: &AppState, user_id: Uuid) -> anyhow::Result<Vec<OutfitView>> {
    let outfits = repo::list_by_user(&st.db, user_id).await?;
    let mut ids: Vec<Uuid> = outfits.iter().flat_map(|o| o.item_ids.iter().copied()).collect();
    ids.sort_unstable();
    ids.dedup();
    let known = load_items(st, user_id, &ids).await?;

    let mut out = Vec::with_capacity(outfits.len());
    for outfit in outfits {
        out.push(outfit_view(st, outfit, &known).await?);
    }
    Ok(out)
}

pub async fn save(st: &AppState, user_id: Uuid, req: SaveOutfitRequest) -> Result<OutfitView, AppError> {
    if req.items.is_empty() {
        return Err(AppError::Validation("items must not be empty".into()));
    }
    let name = normalize_name(req.name);
    let outfit = repo::insert_outfit(
        &st.db,
        user_id,
        name.as_deref(),
        &req.items,
        req.filters.as_ref(),
    )
    .await?;
    info!(outfit_id = %outfit.id, items = outfit.item_ids.len(), "outfit saved");
    Ok(view_one(st, user_id, outfit).await?)
}

pub async fn rename(
    st: &AppState,
    user_id: Uuid,
    outfit_id: Uuid,
    name: Option<String>,
) -> Result<OutfitView, AppError> {
    let name = normalize_name(name);
    let outfit = repo::rename(&st.db, user_id, outfit_id, name.as_deref())
        .await?
        .ok_or(AppError::NotFound("Outfit"))?;
    Ok(view_one(st, user_id, outfit).await?)
}

/// Assembles a random outfit from the caller's closet. Nothing is stored.
pub async fn generate_for_user<R: Rng + ?Sized>(
    st: &AppState,
    user_id: Uuid,
    filters: &OutfitFilters,
    rng: &mut R,
) -> Result<GeneratedOutfitView, AppError> {
    let items = items_repo::list_by_user(&st.db, user_id, None).await?;
    debug!(closet = items.len(), filtered = !filters.is_empty(), "assembling outfit");
    let generated = assembler::generate(&items, filters, rng)?;

    let mut outfit = BTreeMap::new();
    for (slot, item) in generated.outfit {
        outfit.insert(slot, item_services::view(st, item).await?);
    }
    Ok(GeneratedOutfitView {
        outfit,
        slots_used: generated.slots_used,
        total_items: generated.total_items,
        items_by_slot: generated.items_by_slot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::repo::seed_user, tagging::TagRecord};
    use serde_json::json;
    use sqlx::PgPool;
    use time::OffsetDateTime;

    fn item() -> Item {
        Item {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            image_key: "items/x.jpg".into(),
            tags: TagRecord::fallback("shirt", String::new()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn hydrate_keeps_order_and_skips_deleted() {
        let a = item();
        let b = item();
        let c = item();
        let deleted = Uuid::new_v4();
        let known: HashMap<Uuid, Item> = [&a, &b, &c].iter().map(|i| (i.id, (*i).clone())).collect();

        let out = hydrate(&[c.id, deleted, a.id], &known);
        assert_eq!(out.iter().map(|i| i.id).collect::<Vec<_>>(), vec![c.id, a.id]);
    }

    #[test]
    fn hydrate_of_only_deleted_items_is_empty() {
        let out = hydrate(&[Uuid::new_v4(), Uuid::new_v4()], &HashMap::new());
        assert!(out.is_empty());
    }

    #[test]
    fn names_are_trimmed_and_blank_cleared() {
        assert_eq!(normalize_name(Some("  Friday ".into())), Some("Friday".into()));
        assert_eq!(normalize_name(Some("   ".into())), None);
        assert_eq!(normalize_name(None), None);
    }

    #[tokio::test]
    async fn outfit_view_hydrates_and_keeps_filters_verbatim() {
        let state = AppState::fake();
        let a = item();
        let b = item();
        let known: HashMap<Uuid, Item> = [(a.id, a.clone()), (b.id, b.clone())].into_iter().collect();
        let filters = json!({ "formality": "casual", "anything": [1, 2, 3] });
        let outfit = Outfit {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: Some("Friday".into()),
            item_ids: vec![a.id, Uuid::new_v4(), b.id],
            filters: Some(filters.clone()),
            created_at: OffsetDateTime::now_utc(),
        };

        let view = outfit_view(&state, outfit, &known).await.unwrap();
        assert_eq!(view.name.as_deref(), Some("Friday"));
        assert_eq!(view.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![a.id, b.id]);
        assert_eq!(view.filters, Some(filters));
    }

    #[tokio::test]
    async fn saving_without_items_is_rejected() {
        let state = AppState::fake();
        let req = SaveOutfitRequest {
            name: Some("Empty".into()),
            items: vec![],
            filters: None,
        };
        let err = save(&state, Uuid::new_v4(), req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    async fn closet_item(db: &PgPool, user_id: Uuid, item_type: &str) -> Uuid {
        let id = Uuid::new_v4();
        let key = format!("items/{user_id}/{id}.jpg");
        items_repo::insert_item(db, id, user_id, &key, &TagRecord::fallback(item_type, String::new()))
            .await
            .unwrap();
        id
    }

    fn request(name: &str, items: Vec<Uuid>) -> SaveOutfitRequest {
        SaveOutfitRequest {
            name: Some(name.into()),
            items,
            filters: Some(json!({ "season": "fall" })),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn saved_outfit_drops_deleted_items_on_read(pool: PgPool) {
        let state = AppState::with_pool(pool);
        let user = seed_user(&state.db, "ada").await;
        let shirt = closet_item(&state.db, user, "shirt").await;
        let jeans = closet_item(&state.db, user, "jeans").await;

        let saved = save(&state, user, request("Friday", vec![shirt, jeans])).await.unwrap();
        assert_eq!(saved.items.len(), 2);

        item_services::delete_item(&state, user, jeans).await.unwrap();

        let outfits = list_views(&state, user).await.unwrap();
        assert_eq!(outfits.len(), 1);
        assert_eq!(outfits[0].name.as_deref(), Some("Friday"));
        assert_eq!(outfits[0].items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![shirt]);
        assert_eq!(outfits[0].filters, Some(json!({ "season": "fall" })));

        let stored = repo::get_by_id(&state.db, user, saved.id).await.unwrap().unwrap();
        assert_eq!(stored.item_ids, vec![shirt, jeans]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn foreign_items_are_not_hydrated(pool: PgPool) {
        let state = AppState::with_pool(pool);
        let ada = seed_user(&state.db, "ada").await;
        let bob = seed_user(&state.db, "bob").await;
        let mine = closet_item(&state.db, ada, "shirt").await;
        let theirs = closet_item(&state.db, bob, "boots").await;

        let saved = save(&state, ada, request("Mixed", vec![theirs, mine])).await.unwrap();
        assert_eq!(saved.items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![mine]);

        let outfits = list_views(&state, ada).await.unwrap();
        assert_eq!(outfits[0].items.len(), 1);
        assert!(list_views(&state, bob).await.unwrap().is_empty());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn outfits_are_listed_newest_first(pool: PgPool) {
        let state = AppState::with_pool(pool);
        let user = seed_user(&state.db, "ada").await;
        let shirt = closet_item(&state.db, user, "shirt").await;

        let older = save(&state, user, request("Monday", vec![shirt])).await.unwrap();
        sqlx::query("UPDATE outfits SET created_at = now() - interval '1 day' WHERE id = $1")
            .bind(older.id)
            .execute(&state.db)
            .await
            .unwrap();
        let newer = save(&state, user, request("Tuesday", vec![shirt])).await.unwrap();

        let ids: Vec<Uuid> = list_views(&state, user).await.unwrap().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn rename_and_delete_are_owner_scoped(pool: PgPool) {
        let state = AppState::with_pool(pool);
        let ada = seed_user(&state.db, "ada").await;
        let bob = seed_user(&state.db, "bob").await;
        let shirt = closet_item(&state.db, ada, "shirt").await;
        let saved = save(&state, ada, request("Friday", vec![shirt])).await.unwrap();

        let renamed = rename(&state, ada, saved.id, Some(" Date night ".into())).await.unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Date night"));
        let cleared = rename(&state, ada, saved.id, Some("  ".into())).await.unwrap();
        assert_eq!(cleared.name, None);

        let err = rename(&state, bob, saved.id, Some("Mine now".into())).await;
        assert!(matches!(err, Err(AppError::NotFound("Outfit"))));
        assert!(!repo::delete_outfit(&state.db, bob, saved.id).await.unwrap());

        assert!(repo::delete_outfit(&state.db, ada, saved.id).await.unwrap());
        assert!(list_views(&state, ada).await.unwrap().is_empty());
    }
}
