//! One contract for both owned-named namespaces (tags and ingredients);
//! the kind only selects the tables involved.

use sqlx::{Pool, Sqlite};

use super::super::error::StoreError;
use super::super::schema::{Id, TaxonomyEntity, TaxonomyKind};

/// Creates an entity owned by `owner`. Names are stored trimmed; blank
/// names are rejected. Uniqueness is not enforced, only owner scoping.
pub async fn create_entity(
    pool: &Pool<Sqlite>,
    kind: TaxonomyKind,
    owner: Id,
    name: &str,
) -> Result<TaxonomyEntity, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::empty_name("name"));
    }

    let row: TaxonomyEntity = sqlx::query_as(&format!(
        "INSERT INTO {} (user_id, name) VALUES (?, ?) RETURNING *",
        kind.table()
    ))
    .bind(owner)
    .bind(name)
    .fetch_one(pool)
    .await?;

    log::debug!("created {} {} for account {owner}", kind.label(), row.id);

    Ok(row)
}

/// Lists the caller's entities, name-descending. With `assigned_only`,
/// keeps only entities referenced by at least one of the caller's own
/// recipes, deduplicated across recipes.
pub async fn list_entities(
    pool: &Pool<Sqlite>,
    kind: TaxonomyKind,
    owner: Id,
    assigned_only: bool,
) -> Result<Vec<TaxonomyEntity>, StoreError> {
    let rows: Vec<TaxonomyEntity> = if assigned_only {
        sqlx::query_as(&format!(
            "
            SELECT t.* FROM {table} t
            WHERE t.user_id = ?
              AND EXISTS (
                SELECT 1 FROM {link} l
                INNER JOIN recipes r ON r.id = l.recipe_id
                WHERE l.{column} = t.id AND r.user_id = t.user_id
              )
            ORDER BY t.name DESC
            ",
            table = kind.table(),
            link = kind.link_table(),
            column = kind.link_column(),
        ))
        .bind(owner)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as(&format!(
            "SELECT * FROM {} WHERE user_id = ? ORDER BY name DESC",
            kind.table()
        ))
        .bind(owner)
        .fetch_all(pool)
        .await?
    };

    Ok(rows)
}
