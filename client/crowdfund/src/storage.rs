//! Durable client storage: a SQLite-backed key/value table.
//!
//! Holds the persisted session (`user`, `token`) so that it survives
//! restarts of the client.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "token";

#[derive(Clone, Debug)]
pub struct ClientStorage {
    pool: SqlitePool,
}

impl ClientStorage {
    /// Open (creating if needed) the storage database and run pending migrations.
    pub async fn open(storage_url: &str) -> Result<Self> {
        let url = if storage_url.starts_with("sqlite:") {
            storage_url.to_string()
        } else {
            format!("sqlite:{storage_url}")
        };
        let in_memory = url.contains(":memory:");

        let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

        // An in-memory database lives exactly as long as its connection.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Client storage ready at {url}");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> Result<Self> {
        Self::open("sqlite::memory:").await
    }

    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM client_storage WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v))
    }

    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO client_storage (key, value, updated_at)
            VALUES (?1, ?2, strftime('%s', 'now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                           updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn remove_item(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM client_storage WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
