//! Database adapter: connection pool, schema bootstrap, transaction scopes.
//!
//! Every engine operation runs against a `&mut SqliteConnection` handed in by
//! the caller, normally the connection inside a [`Transaction`] obtained from
//! [`InventoryStore::begin`]. The caller commits; dropping an uncommitted
//! transaction rolls it back.

use std::str::FromStr;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::instrument;

use crate::config::InventoryConfig;
use crate::error::{InventoryResult, map_sqlx_error};

/// Schema, applied in order. Every statement is idempotent.
///
/// `movements` deliberately carries no foreign keys: references are checked
/// at append time and may dangle after a deletion.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id                   INTEGER PRIMARY KEY AUTOINCREMENT,
        name                 TEXT    NOT NULL UNIQUE,
        total_quantity       INTEGER NOT NULL CHECK (total_quantity >= 0),
        unallocated_quantity INTEGER NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id   INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT    NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS movements (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id       INTEGER NOT NULL,
        from_location_id INTEGER NULL,
        to_location_id   INTEGER NULL,
        quantity         INTEGER NOT NULL CHECK (quantity > 0),
        recorded_at      TEXT    NOT NULL,
        CHECK (from_location_id IS NOT NULL OR to_location_id IS NOT NULL)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_movements_inbound ON movements(product_id, to_location_id)",
    "CREATE INDEX IF NOT EXISTS idx_movements_outbound ON movements(product_id, from_location_id)",
    "CREATE INDEX IF NOT EXISTS idx_movements_to ON movements(to_location_id)",
    "CREATE INDEX IF NOT EXISTS idx_movements_from ON movements(from_location_id)",
];

/// Handle to the durable store.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    pool: SqlitePool,
}

impl InventoryStore {
    /// Open a pool according to `config`. Does not touch the schema.
    #[instrument(skip(config), fields(in_memory = config.is_in_memory()), err)]
    pub async fn connect(config: &InventoryConfig) -> InventoryResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url)
            .map_err(|e| map_sqlx_error("parse_database_url", e))?
            .create_if_missing(true)
            .busy_timeout(config.busy_timeout);

        let pool_options = if config.is_in_memory() {
            // One connection, never recycled: closing it would drop the database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        Ok(Self { pool })
    }

    /// Connect and bootstrap the schema in one go.
    pub async fn open(config: &InventoryConfig) -> InventoryResult<Self> {
        let store = Self::connect(config).await?;
        store.migrate().await?;
        Ok(store)
    }

    /// Fresh in-memory store with the schema applied.
    pub async fn in_memory() -> InventoryResult<Self> {
        Self::open(&InventoryConfig::in_memory()).await
    }

    /// Create tables and indexes if they do not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> InventoryResult<()> {
        let mut tx = self.begin().await?;
        for statement in SCHEMA {
            sqlx::query(*statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("migrate", e))?;
        }
        tx.commit().await.map_err(|e| map_sqlx_error("migrate_commit", e))?;
        tracing::debug!(statements = SCHEMA.len(), "schema bootstrapped");
        Ok(())
    }

    /// Open a transaction scope.
    pub async fn begin(&self) -> InventoryResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    /// Check out a plain connection, for snapshot reads that need no transaction.
    pub async fn acquire(&self) -> InventoryResult<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Commit a transaction scope, mapping the failure into the engine's error model.
pub async fn commit(tx: Transaction<'static, Sqlite>) -> InventoryResult<()> {
    tx.commit()
        .await
        .map_err(|e| map_sqlx_error("commit_transaction", e))
}
