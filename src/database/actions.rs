pub mod accounts;
pub mod recipes;
pub mod taxonomy;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing {
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::{Pool, Sqlite};

    use crate::database::migrate;
    use crate::database::schema::Account;

    /// Single-connection in-memory database. One connection is load-bearing:
    /// every pooled connection would otherwise see its own empty `:memory:`.
    pub async fn memory_pool() -> Pool<Sqlite> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrate::run(&pool).await.unwrap();
        pool
    }

    pub async fn sample_account(pool: &Pool<Sqlite>, email: &str) -> Account {
        use crate::database::schema::NewAccount;

        super::accounts::create_account(
            pool,
            NewAccount {
                email: email.to_string(),
                password: "pass123".to_string(),
                name: None,
                is_staff: false,
                is_superuser: false,
            },
        )
        .await
        .unwrap()
    }
}
