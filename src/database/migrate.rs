use sqlx::{Pool, Sqlite};

use super::error::StoreError;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS accounts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        name TEXT,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        is_staff BOOLEAN NOT NULL DEFAULT 0,
        is_superuser BOOLEAN NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS tokens (
        account_id INTEGER PRIMARY KEY REFERENCES accounts(id),
        token TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES accounts(id),
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS ingredients (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES accounts(id),
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS recipes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES accounts(id),
        title TEXT NOT NULL,
        time_minutes INTEGER NOT NULL,
        price REAL NOT NULL,
        link TEXT,
        image TEXT
    )",
    "CREATE TABLE IF NOT EXISTS recipe_tags (
        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (recipe_id, tag_id)
    )",
    "CREATE TABLE IF NOT EXISTS recipe_ingredients (
        recipe_id INTEGER NOT NULL REFERENCES recipes(id),
        ingredient_id INTEGER NOT NULL REFERENCES ingredients(id),
        PRIMARY KEY (recipe_id, ingredient_id)
    )",
];

/// Bootstraps the schema on a fresh database. Idempotent.
pub async fn run(pool: &Pool<Sqlite>) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }

    log::debug!("schema bootstrap complete ({} tables)", SCHEMA.len());
    Ok(())
}
