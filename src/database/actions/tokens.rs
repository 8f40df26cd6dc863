use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::authentication::cryptography::generate_access_token;

use super::super::error::StoreError;
use super::super::schema::{Account, Id, Token};

/// Issues a fresh opaque token for the account, replacing any prior one.
/// A single live token exists per account; this is not a session list.
/// Issuance time is recorded but no expiry is enforced.
pub async fn issue_token(pool: &Pool<Sqlite>, account_id: Id) -> Result<Token, StoreError> {
    let token = generate_access_token();
    let created_at = Utc::now();

    sqlx::query(
        "
        INSERT INTO tokens (account_id, token, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT (account_id) DO UPDATE
        SET token = excluded.token, created_at = excluded.created_at;
    ",
    )
    .bind(account_id)
    .bind(&token)
    .bind(created_at)
    .execute(pool)
    .await?;

    log::debug!("issued token for account {account_id}");

    Ok(Token {
        account_id,
        token,
        created_at,
    })
}

/// Resolves a bearer token to its account. The account must still be
/// active; deactivation revokes access without touching the token row.
pub async fn resolve_token(pool: &Pool<Sqlite>, token: &str) -> Result<Account, StoreError> {
    let row: Option<Account> = sqlx::query_as(
        "
        SELECT a.* FROM accounts a
        INNER JOIN tokens t ON t.account_id = a.id
        WHERE t.token = ?
    ",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    let account = row.ok_or(StoreError::InvalidToken)?;
    if !account.is_active {
        return Err(StoreError::InactiveAccount);
    }

    Ok(account)
}
