//! Store handle: connection pool and schema bootstrap.
//!
//! `Database` is passed explicitly to every repository. There is no
//! process-wide connection; whoever creates the handle owns its lifecycle and
//! calls [`Database::close`] when done.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::instrument;

use crate::config::DatabaseConfig;
use crate::error::{RepositoryError, map_sqlx_error};

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id            TEXT PRIMARY KEY,
        name          TEXT NOT NULL,
        street        TEXT NULL,
        number        INTEGER NULL,
        zipcode       TEXT NULL,
        city          TEXT NULL,
        active        INTEGER NOT NULL,
        reward_points INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id    TEXT PRIMARY KEY,
        name  TEXT NOT NULL,
        price INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id          TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL REFERENCES customers (id),
        total       INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id         TEXT PRIMARY KEY,
        order_id   TEXT NOT NULL REFERENCES orders (id),
        product_id TEXT NOT NULL REFERENCES products (id),
        name       TEXT NOT NULL,
        price      INTEGER NOT NULL,
        quantity   INTEGER NOT NULL
    )
    "#,
];

/// Shared SQLite handle.
///
/// Cheap to clone: clones share the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a pool for the configured URL with foreign keys enforced.
    ///
    /// In-memory stores keep their connections open for the lifetime of the
    /// pool, otherwise the data would vanish with the last idle connection.
    #[instrument(skip(config), fields(url = %config.url, max_connections = config.max_connections), err)]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .foreign_keys(true)
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1);
        if config.is_in_memory() {
            pool_options = pool_options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self { pool })
    }

    /// Fresh, migrated in-memory store. Each call yields an isolated database.
    pub async fn in_memory() -> Result<Self, RepositoryError> {
        let db = Self::connect(&DatabaseConfig::in_memory()).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Create the customer, product, order and order item tables if missing.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every connection. Further repository calls fail with a
    /// persistence error.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn migrate_creates_all_tables() {
        let db = Database::in_memory().await.unwrap();

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

        assert_eq!(names, ["customers", "order_items", "orders", "products"]);
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn foreign_keys_are_enforced() {
        let db = Database::in_memory().await.unwrap();
        let row = sqlx::query("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let enabled: i64 = row.get(0);
        assert_eq!(enabled, 1);
    }

    #[tokio::test]
    async fn in_memory_databases_are_isolated() {
        let a = Database::in_memory().await.unwrap();
        let b = Database::in_memory().await.unwrap();

        sqlx::query("INSERT INTO products (id, name, price) VALUES ('1', 'P', 1)")
            .execute(a.pool())
            .await
            .unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS n FROM products")
            .fetch_one(b.pool())
            .await
            .unwrap();
        let count: i64 = row.get("n");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn closed_database_rejects_queries() {
        let db = Database::in_memory().await.unwrap();
        let handle = db.clone();
        db.close().await;

        let err = handle.migrate().await.unwrap_err();
        assert!(err.persistence_cause().is_some());
    }
}
