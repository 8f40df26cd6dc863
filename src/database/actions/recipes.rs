use std::collections::BTreeSet;

use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use crate::media::store::MediaStore;

use super::super::error::StoreError;
use super::super::schema::{
    Id, NewRecipe, Recipe, RecipeDetail, RecipePatch, TaxonomyEntity, TaxonomyKind,
};

fn validate_scalars(title: &str, time_minutes: i64, price: f64) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::empty_name("title"));
    }
    if time_minutes < 0 {
        return Err(StoreError::negative_number("time_minutes"));
    }
    if price < 0.0 {
        return Err(StoreError::negative_number("price"));
    }
    Ok(())
}

/// Every id must resolve to an entity of `kind` owned by `owner`.
/// Cross-owner ids are rejected, not silently excluded.
async fn ensure_owned(
    conn: &mut SqliteConnection,
    kind: TaxonomyKind,
    owner: Id,
    ids: &BTreeSet<Id>,
) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT COUNT(*) FROM {} WHERE user_id = ",
        kind.table()
    ));
    query.push_bind(owner);
    query.push(" AND id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    query.push(")");

    let (count,): (i64,) = query.build_query_as().fetch_one(&mut *conn).await?;
    if count != ids.len() as i64 {
        return Err(StoreError::InvalidAssociation(kind.label()));
    }

    Ok(())
}

async fn replace_links(
    conn: &mut SqliteConnection,
    kind: TaxonomyKind,
    recipe_id: Id,
    ids: &BTreeSet<Id>,
) -> Result<(), StoreError> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = ?",
        kind.link_table()
    ))
    .bind(recipe_id)
    .execute(&mut *conn)
    .await?;

    for id in ids {
        sqlx::query(&format!(
            "INSERT INTO {} (recipe_id, {}) VALUES (?, ?)",
            kind.link_table(),
            kind.link_column()
        ))
        .bind(recipe_id)
        .bind(*id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

async fn linked_entities(
    pool: &Pool<Sqlite>,
    kind: TaxonomyKind,
    recipe_id: Id,
) -> Result<Vec<TaxonomyEntity>, StoreError> {
    let rows = sqlx::query_as(&format!(
        "
        SELECT t.* FROM {table} t
        INNER JOIN {link} l ON l.{column} = t.id
        WHERE l.recipe_id = ?
        ORDER BY t.name DESC
        ",
        table = kind.table(),
        link = kind.link_table(),
        column = kind.link_column(),
    ))
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Owner scoping sits in the lookup predicate itself: another account's
/// recipe and a missing one are the same `NotFound`.
async fn fetch_owned(
    pool: &Pool<Sqlite>,
    owner: Id,
    recipe_id: Id,
) -> Result<Recipe, StoreError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE user_id = ? AND id = ?")
        .bind(owner)
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    row.ok_or(StoreError::NotFound)
}

/// Creates the recipe row and its association rows in one transaction,
/// so a rejected id leaves nothing behind.
pub async fn create_recipe(
    pool: &Pool<Sqlite>,
    owner: Id,
    recipe: NewRecipe,
) -> Result<RecipeDetail, StoreError> {
    validate_scalars(&recipe.title, recipe.time_minutes, recipe.price)?;
    let tag_ids: BTreeSet<Id> = recipe.tag_ids.iter().copied().collect();
    let ingredient_ids: BTreeSet<Id> = recipe.ingredient_ids.iter().copied().collect();

    let mut tx = pool.begin().await?;

    let row: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (user_id, title, time_minutes, price, link)
        VALUES (?, ?, ?, ?, ?)
        RETURNING *
    ",
    )
    .bind(owner)
    .bind(recipe.title.trim())
    .bind(recipe.time_minutes)
    .bind(recipe.price)
    .bind(&recipe.link)
    .fetch_one(&mut *tx)
    .await?;

    ensure_owned(&mut tx, TaxonomyKind::Tag, owner, &tag_ids).await?;
    ensure_owned(&mut tx, TaxonomyKind::Ingredient, owner, &ingredient_ids).await?;
    replace_links(&mut tx, TaxonomyKind::Tag, row.id, &tag_ids).await?;
    replace_links(&mut tx, TaxonomyKind::Ingredient, row.id, &ingredient_ids).await?;

    tx.commit().await?;

    log::info!("created recipe {} for account {owner}", row.id);

    get_recipe(pool, owner, row.id).await
}

pub async fn get_recipe(
    pool: &Pool<Sqlite>,
    owner: Id,
    recipe_id: Id,
) -> Result<RecipeDetail, StoreError> {
    let recipe = fetch_owned(pool, owner, recipe_id).await?;
    let tags = linked_entities(pool, TaxonomyKind::Tag, recipe.id).await?;
    let ingredients = linked_entities(pool, TaxonomyKind::Ingredient, recipe.id).await?;

    Ok(RecipeDetail {
        recipe,
        tags,
        ingredients,
    })
}

/// Most-recently-created first.
pub async fn list_recipes(pool: &Pool<Sqlite>, owner: Id) -> Result<Vec<Recipe>, StoreError> {
    let rows: Vec<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE user_id = ? ORDER BY id DESC")
        .bind(owner)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Partial update: unspecified fields keep their value; a present id
/// list replaces the full association set, never merges into it.
pub async fn update_recipe(
    pool: &Pool<Sqlite>,
    owner: Id,
    recipe_id: Id,
    patch: RecipePatch,
) -> Result<RecipeDetail, StoreError> {
    let current = fetch_owned(pool, owner, recipe_id).await?;

    let title = patch.title.unwrap_or(current.title);
    let time_minutes = patch.time_minutes.unwrap_or(current.time_minutes);
    let price = patch.price.unwrap_or(current.price);
    let link = patch.link.or(current.link);
    validate_scalars(&title, time_minutes, price)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE recipes SET title = ?, time_minutes = ?, price = ?, link = ? WHERE id = ?",
    )
    .bind(title.trim())
    .bind(time_minutes)
    .bind(price)
    .bind(&link)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await?;

    if let Some(ids) = &patch.tag_ids {
        let ids: BTreeSet<Id> = ids.iter().copied().collect();
        ensure_owned(&mut tx, TaxonomyKind::Tag, owner, &ids).await?;
        replace_links(&mut tx, TaxonomyKind::Tag, recipe_id, &ids).await?;
    }
    if let Some(ids) = &patch.ingredient_ids {
        let ids: BTreeSet<Id> = ids.iter().copied().collect();
        ensure_owned(&mut tx, TaxonomyKind::Ingredient, owner, &ids).await?;
        replace_links(&mut tx, TaxonomyKind::Ingredient, recipe_id, &ids).await?;
    }

    tx.commit().await?;

    get_recipe(pool, owner, recipe_id).await
}

/// Full update: every scalar comes from the payload, an omitted link is
/// cleared and both association sets are replaced outright. The image
/// reference is untouched; it has its own surface below.
pub async fn replace_recipe(
    pool: &Pool<Sqlite>,
    owner: Id,
    recipe_id: Id,
    recipe: NewRecipe,
) -> Result<RecipeDetail, StoreError> {
    fetch_owned(pool, owner, recipe_id).await?;
    validate_scalars(&recipe.title, recipe.time_minutes, recipe.price)?;
    let tag_ids: BTreeSet<Id> = recipe.tag_ids.iter().copied().collect();
    let ingredient_ids: BTreeSet<Id> = recipe.ingredient_ids.iter().copied().collect();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE recipes SET title = ?, time_minutes = ?, price = ?, link = ? WHERE id = ?",
    )
    .bind(recipe.title.trim())
    .bind(recipe.time_minutes)
    .bind(recipe.price)
    .bind(&recipe.link)
    .bind(recipe_id)
    .execute(&mut *tx)
    .await?;

    ensure_owned(&mut tx, TaxonomyKind::Tag, owner, &tag_ids).await?;
    ensure_owned(&mut tx, TaxonomyKind::Ingredient, owner, &ingredient_ids).await?;
    replace_links(&mut tx, TaxonomyKind::Tag, recipe_id, &tag_ids).await?;
    replace_links(&mut tx, TaxonomyKind::Ingredient, recipe_id, &ingredient_ids).await?;

    tx.commit().await?;

    get_recipe(pool, owner, recipe_id).await
}

/// Stores the payload under a fresh generated name, points the recipe at
/// it and only then discards the previous file. A payload that fails
/// image validation leaves the prior image untouched.
pub async fn attach_image(
    pool: &Pool<Sqlite>,
    media: &MediaStore,
    owner: Id,
    recipe_id: Id,
    data: &[u8],
) -> Result<Recipe, StoreError> {
    let current = fetch_owned(pool, owner, recipe_id).await?;

    let filename = media.save_image(data).await?;

    let update = sqlx::query("UPDATE recipes SET image = ? WHERE id = ?")
        .bind(&filename)
        .bind(recipe_id)
        .execute(pool)
        .await;
    if let Err(e) = update {
        // The row was not touched; do not leave the fresh file orphaned.
        let _ = media.delete(&filename).await;
        return Err(e.into());
    }

    if let Some(previous) = &current.image {
        if let Err(e) = media.delete(previous).await {
            log::warn!("failed to discard superseded image {previous}: {e}");
        }
    }

    fetch_owned(pool, owner, recipe_id).await
}

/// Clears the image reference and removes the stored file.
pub async fn delete_image(
    pool: &Pool<Sqlite>,
    media: &MediaStore,
    owner: Id,
    recipe_id: Id,
) -> Result<Recipe, StoreError> {
    let current = fetch_owned(pool, owner, recipe_id).await?;

    if let Some(previous) = &current.image {
        sqlx::query("UPDATE recipes SET image = NULL WHERE id = ?")
            .bind(recipe_id)
            .execute(pool)
            .await?;

        if let Err(e) = media.delete(previous).await {
            log::warn!("failed to remove image {previous}: {e}");
        }
    }

    fetch_owned(pool, owner, recipe_id).await
}

#[cfg(test)]
mod tests {
    use super::super::taxonomy::create_entity;
    use super::super::testing::{memory_pool, sample_account};
    use super::*;
    use crate::media::store::testing::{sample_jpeg, temp_store};

    fn pancakes() -> NewRecipe {
        NewRecipe {
            title: "Pancakes".to_string(),
            time_minutes: 5,
            price: 5.0,
            link: None,
            tag_ids: vec![],
            ingredient_ids: vec![],
        }
    }

    #[tokio::test]
    async fn create_then_get_expands_associations() {
        let pool = memory_pool().await;
        let owner = sample_account(&pool, "a@x.com").await;
        let vegan = create_entity(&pool, TaxonomyKind::Tag, owner.id, "vegan")
            .await
            .unwrap();

        let recipe = NewRecipe {
            tag_ids: vec![vegan.id],
            ..pancakes()
        };
        let created = create_recipe(&pool, owner.id, recipe).await.unwrap();

        let detail = get_recipe(&pool, owner.id, created.recipe.id).await.unwrap();
        assert_eq!(detail.recipe.title, "Pancakes");
        assert_eq!(detail.recipe.time_minutes, 5);
        assert_eq!(detail.tags, vec![vegan]);
        assert!(detail.ingredients.is_empty());
    }

    #[tokio::test]
    async fn cross_owner_tag_id_is_rejected_and_nothing_is_written() {
        let pool = memory_pool().await;
        let alice = sample_account(&pool, "alice@x.com").await;
        let bob = sample_account(&pool, "bob@x.com").await;
        let bobs_tag = create_entity(&pool, TaxonomyKind::Tag, bob.id, "vegan")
            .await
            .unwrap();

        let recipe = NewRecipe {
            tag_ids: vec![bobs_tag.id],
            ..pancakes()
        };
        let err = create_recipe(&pool, alice.id, recipe).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidAssociation("tag")));

        // The transaction rolled back; no half-created recipe remains.
        assert!(list_recipes(&pool, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_newest_first() {
        let pool = memory_pool().await;
        let alice = sample_account(&pool, "alice@x.com").await;
        let bob = sample_account(&pool, "bob@x.com").await;

        let first = create_recipe(&pool, alice.id, pancakes()).await.unwrap();
        let second = create_recipe(
            &pool,
            alice.id,
            NewRecipe {
                title: "Waffles".to_string(),
                ..pancakes()
            },
        )
        .await
        .unwrap();
        create_recipe(&pool, bob.id, pancakes()).await.unwrap();

        let listed = list_recipes(&pool, alice.id).await.unwrap();
        let ids: Vec<Id> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.recipe.id, first.recipe.id]);
    }

    #[tokio::test]
    async fn another_owners_recipe_is_not_found() {
        let pool = memory_pool().await;
        let alice = sample_account(&pool, "alice@x.com").await;
        let bob = sample_account(&pool, "bob@x.com").await;
        let created = create_recipe(&pool, alice.id, pancakes()).await.unwrap();

        assert!(matches!(
            get_recipe(&pool, bob.id, created.recipe.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            update_recipe(&pool, bob.id, created.recipe.id, RecipePatch::default()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn patch_with_only_tags_replaces_the_set_and_keeps_scalars() {
        let pool = memory_pool().await;
        let owner = sample_account(&pool, "a@x.com").await;
        let old_tag = create_entity(&pool, TaxonomyKind::Tag, owner.id, "old")
            .await
            .unwrap();
        let new_tag = create_entity(&pool, TaxonomyKind::Tag, owner.id, "new")
            .await
            .unwrap();

        let created = create_recipe(
            &pool,
            owner.id,
            NewRecipe {
                tag_ids: vec![old_tag.id],
                ..pancakes()
            },
        )
        .await
        .unwrap();

        let patched = update_recipe(
            &pool,
            owner.id,
            created.recipe.id,
            RecipePatch {
                tag_ids: Some(vec![new_tag.id]),
                ..RecipePatch::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(patched.tags, vec![new_tag]);
        assert_eq!(patched.recipe.title, "Pancakes");
        assert_eq!(patched.recipe.time_minutes, 5);
        assert_eq!(patched.recipe.price, 5.0);
    }

    #[tokio::test]
    async fn full_replace_clears_omitted_link_and_associations() {
        let pool = memory_pool().await;
        let owner = sample_account(&pool, "a@x.com").await;
        let tag = create_entity(&pool, TaxonomyKind::Tag, owner.id, "vegan")
            .await
            .unwrap();

        let created = create_recipe(
            &pool,
            owner.id,
            NewRecipe {
                link: Some("https://example.com/pancakes".to_string()),
                tag_ids: vec![tag.id],
                ..pancakes()
            },
        )
        .await
        .unwrap();

        let replaced = replace_recipe(
            &pool,
            owner.id,
            created.recipe.id,
            NewRecipe {
                title: "Plain pancakes".to_string(),
                time_minutes: 7,
                price: 3.5,
                link: None,
                tag_ids: vec![],
                ingredient_ids: vec![],
            },
        )
        .await
        .unwrap();

        assert_eq!(replaced.recipe.title, "Plain pancakes");
        assert_eq!(replaced.recipe.link, None);
        assert!(replaced.tags.is_empty());
    }

    #[tokio::test]
    async fn patch_validation_matches_create() {
        let pool = memory_pool().await;
        let owner = sample_account(&pool, "a@x.com").await;
        let created = create_recipe(&pool, owner.id, pancakes()).await.unwrap();

        let err = update_recipe(
            &pool,
            owner.id,
            created.recipe.id,
            RecipePatch {
                price: Some(-1.0),
                ..RecipePatch::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn attach_image_names_by_sniffed_format_and_replaces_prior() {
        let pool = memory_pool().await;
        let media = temp_store("attach");
        let owner = sample_account(&pool, "a@x.com").await;
        let created = create_recipe(&pool, owner.id, pancakes()).await.unwrap();

        let first = attach_image(&pool, &media, owner.id, created.recipe.id, &sample_jpeg())
            .await
            .unwrap();
        let first_name = first.image.clone().unwrap();
        let (stem, ext) = first_name.rsplit_once('.').unwrap();
        assert_eq!(ext, "jpg");
        assert!(uuid::Uuid::parse_str(stem).is_ok());
        assert!(media.path_for(&first_name).exists());

        let second = attach_image(&pool, &media, owner.id, created.recipe.id, &sample_jpeg())
            .await
            .unwrap();
        let second_name = second.image.unwrap();
        assert_ne!(first_name, second_name);
        assert!(!media.path_for(&first_name).exists());
        assert!(media.path_for(&second_name).exists());
    }

    #[tokio::test]
    async fn invalid_image_leaves_the_prior_one_untouched() {
        let pool = memory_pool().await;
        let media = temp_store("invalid");
        let owner = sample_account(&pool, "a@x.com").await;
        let created = create_recipe(&pool, owner.id, pancakes()).await.unwrap();

        attach_image(&pool, &media, owner.id, created.recipe.id, &sample_jpeg())
            .await
            .unwrap();
        let before = fetch_owned(&pool, owner.id, created.recipe.id).await.unwrap();

        let err = attach_image(&pool, &media, owner.id, created.recipe.id, b"not an image")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidImage));

        let after = fetch_owned(&pool, owner.id, created.recipe.id).await.unwrap();
        assert_eq!(after.image, before.image);
        assert!(media.path_for(&after.image.unwrap()).exists());
    }

    #[tokio::test]
    async fn delete_image_clears_reference_and_file() {
        let pool = memory_pool().await;
        let media = temp_store("clear");
        let owner = sample_account(&pool, "a@x.com").await;
        let created = create_recipe(&pool, owner.id, pancakes()).await.unwrap();

        let attached = attach_image(&pool, &media, owner.id, created.recipe.id, &sample_jpeg())
            .await
            .unwrap();
        let filename = attached.image.unwrap();

        let cleared = delete_image(&pool, &media, owner.id, created.recipe.id)
            .await
            .unwrap();
        assert_eq!(cleared.image, None);
        assert!(!media.path_for(&filename).exists());

        // Deleting again is a no-op, not an error.
        delete_image(&pool, &media, owner.id, created.recipe.id)
            .await
            .unwrap();
    }
}
