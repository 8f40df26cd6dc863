use sqlx::{Pool, Sqlite};

use crate::authentication::cryptography::{hash_password, verify_password};
use crate::constants::MIN_PASSWORD_LENGTH;

use super::super::error::StoreError;
use super::super::schema::{Account, AccountPatch, Id, NewAccount};

/// Full lower-casing, applied before every lookup and uniqueness check.
/// Idempotent: normalizing an already-normalized address is a no-op.
pub fn normalize_email(email: &str) -> Result<String, StoreError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(email.to_lowercase())
        }
        _ => Err(StoreError::invalid_email()),
    }
}

pub async fn get_account(pool: &Pool<Sqlite>, id: Id) -> Result<Option<Account>, StoreError> {
    let row: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

pub async fn get_account_by_email(
    pool: &Pool<Sqlite>,
    email: &str,
) -> Result<Option<Account>, StoreError> {
    let email = normalize_email(email)?;
    let row: Option<Account> = sqlx::query_as("SELECT * FROM accounts WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Registers an account, storing only a one-way hash of the password.
pub async fn create_account(
    pool: &Pool<Sqlite>,
    account: NewAccount,
) -> Result<Account, StoreError> {
    let email = normalize_email(&account.email)?;
    if account.password.len() < MIN_PASSWORD_LENGTH {
        return Err(StoreError::password_too_short());
    }
    if matches!(&account.name, Some(name) if name.trim().is_empty()) {
        return Err(StoreError::empty_name("name"));
    }

    let hash = hash_password(&account.password)?;

    let inserted = sqlx::query(
        "
        INSERT INTO accounts (email, password, name, is_active, is_staff, is_superuser)
        VALUES (?, ?, ?, 1, ?, ?)
        ON CONFLICT (email) DO NOTHING;
    ",
    )
    .bind(&email)
    .bind(hash)
    .bind(&account.name)
    .bind(account.is_staff)
    .bind(account.is_superuser)
    .execute(pool)
    .await?;

    if inserted.rows_affected() == 0 {
        return Err(StoreError::duplicate_email());
    }

    log::info!("registered account {email}");

    let row: Account = sqlx::query_as("SELECT * FROM accounts WHERE email = ?")
        .bind(&email)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns the matching account only when the hash comparison succeeds.
/// No side effects on failure, and no hint about which factor failed.
pub async fn verify_credentials(
    pool: &Pool<Sqlite>,
    email: &str,
    password: &str,
) -> Result<Option<Account>, StoreError> {
    let account = match get_account_by_email(pool, email).await {
        Ok(account) => account,
        Err(StoreError::Validation(_)) => None,
        Err(e) => return Err(e),
    };

    let Some(account) = account else {
        return Ok(None);
    };

    if verify_password(password, &account.password)? {
        Ok(Some(account))
    } else {
        Ok(None)
    }
}

/// Partial profile update. A supplied password is re-hashed; a supplied
/// name must be non-blank.
pub async fn update_account(
    pool: &Pool<Sqlite>,
    id: Id,
    patch: AccountPatch,
) -> Result<Account, StoreError> {
    let current = get_account(pool, id).await?.ok_or(StoreError::NotFound)?;

    let name = match patch.name {
        Some(name) if name.trim().is_empty() => return Err(StoreError::empty_name("name")),
        Some(name) => Some(name),
        None => current.name,
    };

    let password = match patch.password {
        Some(password) if password.len() < MIN_PASSWORD_LENGTH => {
            return Err(StoreError::password_too_short())
        }
        Some(password) => hash_password(&password)?,
        None => current.password,
    };

    sqlx::query("UPDATE accounts SET name = ?, password = ? WHERE id = ?")
        .bind(&name)
        .bind(&password)
        .bind(id)
        .execute(pool)
        .await?;

    let row: Account = sqlx::query_as("SELECT * FROM accounts WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;

    Ok(row)
}
