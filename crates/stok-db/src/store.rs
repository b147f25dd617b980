//! # Store Handle Lifecycle
//!
//! The process-wide SQLite store handle with an explicit
//! open / close / reopen lifecycle.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Store Lifecycle                            │
//! │                                                                 │
//! │  Store::open(options)                                           │
//! │       │  create data dirs, connect (WAL, FK on), migrate        │
//! │       ▼                                                         │
//! │  ┌─────────┐   close()    ┌──────────┐                          │
//! │  │  OPEN   │ ───────────► │  CLOSED  │                          │
//! │  │         │ ◄─────────── │          │                          │
//! │  └─────────┘   reopen()   └──────────┘                          │
//! │       │                        │                                │
//! │       │ pool() → Ok(pool)      │ pool() → Err(Closed)           │
//! │       ▼                        ▼                                │
//! │  repositories work        callers must reopen explicitly        │
//! │                                                                 │
//! │  close() happens on shutdown and immediately before a restore.  │
//! │  There is NO silent re-open-on-null: a closed store surfaces    │
//! │  a clear error until someone calls reopen().                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! Reads may overlap freely through the pool. Stock mutations serialize
//! through a single async mutex (the "stock gate") shared with
//! [`StockLedger`], so check-then-mutate can never race stock negative.
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled: readers don't
//! block the writer and crash recovery is stronger than rollback mode.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::backup::BackupManager;
use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::article::ArticleRepository;
use crate::repository::config::ConfigRepository;
use crate::repository::lookup::LookupRepository;
use crate::repository::stock::StockLedger;

/// File name of the live database inside the data directory.
pub const DB_FILE_NAME: &str = "stok.db";

// =============================================================================
// Configuration
// =============================================================================

/// Store configuration: file locations and pool settings.
///
/// ## Example
/// ```rust,ignore
/// let options = StoreOptions::new("./data").max_connections(5);
/// let store = Store::open(options).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Directory holding image assets; copied into snapshots.
    pub images_dir: PathBuf,

    /// Directory under which `backup_<timestamp>` snapshots live.
    pub backups_dir: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (sufficient for a local single-store app)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    pub min_connections: u32,

    /// Connection acquire timeout.
    pub acquire_timeout: Duration,

    /// Whether to run migrations on connect. Default: true
    pub run_migrations: bool,
}

impl StoreOptions {
    /// Creates options rooted at a data directory: the database file,
    /// image assets and backups all live under it.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        StoreOptions {
            database_path: data_dir.join(DB_FILE_NAME),
            images_dir: data_dir.join("images"),
            backups_dir: data_dir.join("backups"),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        }
    }

    /// Creates an in-memory store configuration (for tests).
    ///
    /// An in-memory database lives and dies with its single connection,
    /// so the pool is pinned to exactly one.
    pub fn in_memory() -> Self {
        let scratch = std::env::temp_dir().join("stok-mem");
        StoreOptions {
            database_path: PathBuf::from(":memory:"),
            images_dir: scratch.join("images"),
            backups_dir: scratch.join("backups"),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Whether this configuration points at an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// Store
// =============================================================================

/// Owning handle over the SQLite store.
///
/// ## Design
/// One `Store` per process. Repositories are cheap accessors that fail
/// fast with [`DbError::Closed`] when the handle was closed, instead of
/// silently reconnecting. Only [`BackupManager`] (via
/// [`Store::backup`]) is available while closed, because restore works
/// on the raw files.
#[derive(Debug)]
pub struct Store {
    options: StoreOptions,
    /// The pool slot. `None` after `close()` until `reopen()`.
    pool: Mutex<Option<SqlitePool>>,
    /// Serializes stock mutations; shared with every [`StockLedger`].
    stock_gate: Arc<tokio::sync::Mutex<()>>,
}

impl Store {
    /// Opens the store: creates the data directories, connects and runs
    /// pending migrations.
    ///
    /// ## Errors
    /// [`DbError::ConnectionFailed`] or [`DbError::MigrationFailed`];
    /// the hosting process treats an open failure at startup as fatal.
    pub async fn open(options: StoreOptions) -> DbResult<Self> {
        info!(
            path = %options.database_path.display(),
            "opening store"
        );

        if !options.is_in_memory() {
            if let Some(parent) = options.database_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::create_dir_all(&options.images_dir)?;
        }

        let pool = Self::connect(&options).await?;

        Ok(Store {
            options,
            pool: Mutex::new(Some(pool)),
            stock_gate: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Builds the pool and applies migrations per the options.
    async fn connect(options: &StoreOptions) -> DbResult<SqlitePool> {
        let connect_options = if options.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&options.database_path)
                .create_if_missing(true)
        }
        // WAL mode: readers don't block the writer
        .journal_mode(SqliteJournalMode::Wal)
        // NORMAL synchronous: safe from corruption, may lose the last
        // transaction on a power cut
        .synchronous(SqliteSynchronous::Normal)
        // SQLite ships with foreign keys off; the schema relies on
        // ON DELETE SET NULL
        .foreign_keys(true);

        debug!("connection options configured");

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .min_connections(options.min_connections)
            .acquire_timeout(options.acquire_timeout);

        if options.is_in_memory() {
            // The sole connection IS the database; never recycle it.
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = options.max_connections,
            "store pool created"
        );

        if options.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(pool)
    }

    fn slot(&self) -> MutexGuard<'_, Option<SqlitePool>> {
        // The lock only guards a clone/take of the pool handle; a
        // poisoned lock still holds a usable slot.
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a handle to the connection pool.
    ///
    /// ## Errors
    /// [`DbError::Closed`] when the store was closed and not reopened.
    pub fn pool(&self) -> DbResult<SqlitePool> {
        self.slot().clone().ok_or(DbError::Closed)
    }

    /// Whether the store currently holds an open pool.
    pub fn is_open(&self) -> bool {
        self.slot().is_some()
    }

    /// The configuration this store was opened with.
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Closes the store.
    ///
    /// ## When To Call
    /// - On process shutdown
    /// - Immediately before a restore (file locks on some platforms)
    ///
    /// Idempotent; further repository access fails with
    /// [`DbError::Closed`] until [`Store::reopen`].
    pub async fn close(&self) {
        let pool = self.slot().take();
        if let Some(pool) = pool {
            info!("closing store pool");
            pool.close().await;
        }
    }

    /// Reconnects a previously closed store. No-op when already open.
    pub async fn reopen(&self) -> DbResult<()> {
        if self.is_open() {
            return Ok(());
        }
        info!("reopening store");
        let pool = Self::connect(&self.options).await?;
        *self.slot() = Some(pool);
        Ok(())
    }

    /// Checks that the store can execute queries.
    pub async fn health_check(&self) -> bool {
        match self.pool() {
            Ok(pool) => sqlx::query("SELECT 1").execute(&pool).await.is_ok(),
            Err(_) => false,
        }
    }

    // -------------------------------------------------------------------------
    // Repository accessors
    // -------------------------------------------------------------------------

    /// Returns the article repository.
    pub fn articles(&self) -> DbResult<ArticleRepository> {
        Ok(ArticleRepository::new(self.pool()?))
    }

    /// Returns the brand/supplier/category repository.
    pub fn lookups(&self) -> DbResult<LookupRepository> {
        Ok(LookupRepository::new(self.pool()?))
    }

    /// Returns the configuration repository.
    pub fn config(&self) -> DbResult<ConfigRepository> {
        Ok(ConfigRepository::new(self.pool()?))
    }

    /// Returns the stock ledger, sharing this store's mutation gate.
    pub fn stock(&self) -> DbResult<StockLedger> {
        Ok(StockLedger::new(self.pool()?, Arc::clone(&self.stock_gate)))
    }

    /// Returns the backup manager. Available even while closed, since
    /// restore operates on the raw files.
    pub fn backup(&self) -> BackupManager<'_> {
        BackupManager::new(self)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store_opens_and_answers() {
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        assert!(store.is_open());
        assert!(store.health_check().await);
    }

    #[tokio::test]
    async fn test_closed_store_surfaces_clear_error() {
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        store.close().await;

        assert!(!store.is_open());
        assert!(matches!(store.pool(), Err(DbError::Closed)));
        assert!(matches!(store.articles(), Err(DbError::Closed)));
        assert!(!store.health_check().await);
    }

    #[tokio::test]
    async fn test_reopen_after_close() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreOptions::new(dir.path())).await.unwrap();

        store.close().await;
        assert!(matches!(store.pool(), Err(DbError::Closed)));

        store.reopen().await.unwrap();
        assert!(store.health_check().await);

        // reopen on an open store is a no-op
        store.reopen().await.unwrap();
        assert!(store.is_open());
    }

    #[test]
    fn test_options_builder() {
        let options = StoreOptions::new("/tmp/stok-data").max_connections(10);
        assert_eq!(options.max_connections, 10);
        assert!(options.database_path.ends_with(DB_FILE_NAME));
        assert!(options.backups_dir.ends_with("backups"));
        assert!(!options.is_in_memory());
        assert!(StoreOptions::in_memory().is_in_memory());
    }
}
