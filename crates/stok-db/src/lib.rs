//! # stok-db: Storage Layer for Stok
//!
//! This crate provides database access for the Stok system. It uses
//! SQLite for local storage with sqlx for async operations, and owns
//! the filesystem concerns around it: backup snapshots, restore and
//! CSV export.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Stok Data Flow                           │
//! │                                                                 │
//! │  Bridge request (stock_exit, ranking, create_backup, ...)       │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                   stok-db (THIS CRATE)                    │  │
//! │  │                                                           │  │
//! │  │  ┌──────────┐  ┌──────────────┐  ┌──────────────────┐     │  │
//! │  │  │  Store   │  │ Repositories │  │    Migrations    │     │  │
//! │  │  │(store.rs)│  │ articles     │  │ versioned, run   │     │  │
//! │  │  │ open /   │◄─│ lookups      │  │ exactly once     │     │  │
//! │  │  │ close /  │  │ config       │  └──────────────────┘     │  │
//! │  │  │ reopen   │  │ stock ledger │  ┌──────────────────┐     │  │
//! │  │  └──────────┘  └──────────────┘  │ Backup / Restore │     │  │
//! │  │                                  └──────────────────┘     │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │  <data dir>/stok.db   <data dir>/images/   .../backups/   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Store handle with explicit open/close/reopen lifecycle
//! - [`migrations`] - Versioned schema migrations
//! - [`error`] - Storage error types
//! - [`repository`] - Repositories (articles, lookups, config, stock)
//! - [`backup`] - Snapshot creation, retention pruning, restore
//! - [`export`] - CSV export of articles and movement history
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stok_db::{Store, StoreOptions};
//!
//! let store = Store::open(StoreOptions::new("./data")).await?;
//! let articles = store.articles()?.low_stock().await?;
//! store.stock()?.exit("A-001", 2).await?;
//! let snapshot = store.backup().create_snapshot().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod error;
pub mod export;
pub mod migrations;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use backup::BackupManager;
pub use error::{DbError, DbResult};
pub use store::{Store, StoreOptions};

// Repository re-exports for convenience
pub use repository::article::ArticleRepository;
pub use repository::config::ConfigRepository;
pub use repository::lookup::LookupRepository;
pub use repository::stock::StockLedger;
