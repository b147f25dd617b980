//! # stok-core: Pure Business Logic for Stok
//!
//! Stok is a single-store inventory / point-of-sale backend: articles
//! (SKUs), brands, suppliers, categories, stock movements, pricing and
//! store-wide configuration. This crate is the pure heart of it - every
//! function here is deterministic and free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Stok Architecture                         │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                apps/bridge (JSON lines)                   │  │
//! │  │   save_article, stock_exit, ranking, create_backup, ...   │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │              ★ stok-core (THIS CRATE) ★                   │  │
//! │  │                                                           │  │
//! │  │   ┌──────────┐  ┌──────────┐  ┌────────────┐              │  │
//! │  │   │  types   │  │ pricing  │  │ validation │              │  │
//! │  │   │ Article  │  │  quote   │  │   rules    │              │  │
//! │  │   │ Movement │  │          │  │            │              │  │
//! │  │   └──────────┘  └──────────┘  └────────────┘              │  │
//! │  │                                                           │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS      │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │                 stok-db (Storage Layer)                   │  │
//! │  │        SQLite queries, stock ledger, backup/restore       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Article, StockMovement, StoreSettings, ...)
//! - [`pricing`] - The one shared sell-price computation
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use pricing::{quote, quote_parts, PriceQuote};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax rate (percent) applied when no usable global rate is configured.
///
/// The pricing calculator falls back to this whenever the configured
/// global tax percent is missing, zero or not a finite number.
pub const DEFAULT_TAX_PCT: f64 = 21.0;

/// Default USD exchange rate used until a real quote is stored.
pub const DEFAULT_USD_RATE: f64 = 1000.0;

/// Number of backup snapshots the retention pass keeps.
pub const BACKUP_RETENTION: usize = 10;
