//! # Domain Types
//!
//! Core domain types used throughout Stok.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                            │
//! │                                                                 │
//! │  ┌────────────────┐  ┌────────────────┐  ┌─────────────────┐    │
//! │  │    Article     │  │ StockMovement  │  │  StoreSettings  │    │
//! │  │  ────────────  │  │  ────────────  │  │  ─────────────  │    │
//! │  │  code (PK)     │  │  id (autoinc)  │  │  global_tax_pct │    │
//! │  │  cost, margin  │  │  kind          │  │  currency       │    │
//! │  │  stock         │  │  quantity      │  │  usd_rate       │    │
//! │  │  protected     │  │  at            │  │  theme colors   │    │
//! │  └────────────────┘  └────────────────┘  └─────────────────┘    │
//! │                                                                 │
//! │  ┌────────────────┐  ┌────────────────┐  ┌─────────────────┐    │
//! │  │ Brand/Category │  │    Supplier    │  │  RankingEntry   │    │
//! │  │  id, name      │  │  id, name,     │  │  code, desc,    │    │
//! │  │                │  │  contact       │  │  sold           │    │
//! │  └────────────────┘  └────────────────┘  └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Layout
//! The SQLite schema keeps the legacy Spanish column names (`codigo`,
//! `descripcion`, `stock_minimo`, ...). Queries in stok-db alias them to
//! the English field names below, so the domain layer never sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

// =============================================================================
// Article
// =============================================================================

/// A stock-keeping unit, identified by its unique textual code.
///
/// ## Invariants
/// - `protected == true` means this article's own `tax_pct` is used in
///   pricing instead of the store-wide global rate.
/// - `stock` is a denormalized running total; it is mutated only through
///   the stock ledger, never written directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Article {
    /// Unique business identifier (primary key).
    pub code: String,

    /// Display description. Required, non-empty.
    pub description: String,

    /// Purchase cost. Must be > 0 for the article to be valid.
    pub cost: f64,

    /// Margin percent applied on top of cost (>= 0).
    pub margin_pct: f64,

    /// This article's own tax percent. Only meaningful when `protected`.
    pub tax_pct: f64,

    /// Current quantity on hand (>= 0).
    pub stock: i64,

    /// Low-stock threshold; the article is "faltante" when
    /// `stock <= min_stock`.
    pub min_stock: i64,

    /// Optional brand reference (nulled when the brand is deleted).
    pub brand_id: Option<i64>,

    /// Optional supplier reference.
    pub supplier_id: Option<i64>,

    /// Optional category reference.
    pub category_id: Option<i64>,

    /// Optional path to an image asset.
    pub image: Option<String>,

    /// When true, `tax_pct` overrides the global tax rate and mass
    /// tax/margin updates skip this article.
    pub protected: bool,
}

impl Article {
    /// Validates the article against the upsert contract.
    ///
    /// ## Rules
    /// - code and description must be non-empty
    /// - cost must be > 0
    /// - margin, tax, stock and min_stock must not be negative
    ///
    /// Negative-looking prices produced by the calculator are not this
    /// function's concern; it guards what gets persisted.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::Required { field: "code" });
        }
        if self.description.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "description",
            });
        }
        if !self.cost.is_finite() {
            return Err(ValidationError::InvalidNumber { field: "cost" });
        }
        if self.cost <= 0.0 {
            return Err(ValidationError::MustBePositive { field: "cost" });
        }
        if !self.margin_pct.is_finite() {
            return Err(ValidationError::InvalidNumber { field: "margin_pct" });
        }
        if self.margin_pct < 0.0 {
            return Err(ValidationError::MustBeNonNegative { field: "margin_pct" });
        }
        if !self.tax_pct.is_finite() {
            return Err(ValidationError::InvalidNumber { field: "tax_pct" });
        }
        if self.tax_pct < 0.0 {
            return Err(ValidationError::MustBeNonNegative { field: "tax_pct" });
        }
        if self.stock < 0 {
            return Err(ValidationError::MustBeNonNegative { field: "stock" });
        }
        if self.min_stock < 0 {
            return Err(ValidationError::MustBeNonNegative { field: "min_stock" });
        }
        Ok(())
    }

    /// Whether the quantity on hand is at or below the minimum threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

// =============================================================================
// Stock Movements
// =============================================================================

/// Direction of a stock movement.
///
/// Persisted as the legacy TEXT values `ENTRADA` / `SALIDA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum MovementKind {
    /// Stock received into the store.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "ENTRADA"))]
    Entry,
    /// Stock sold or otherwise removed.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SALIDA"))]
    Exit,
}

impl MovementKind {
    /// The stored TEXT representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entry => "ENTRADA",
            MovementKind::Exit => "SALIDA",
        }
    }
}

/// An immutable, append-only stock movement record.
///
/// Movements are never updated or deleted; they are the sole source of
/// truth for "quantity sold" aggregates. `code` intentionally is not a
/// strict foreign key - it may reference an article that was deleted
/// later, and the history survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    /// Auto-increment id; also the history sort key (newest first).
    pub id: i64,

    /// Article code at the time of the movement.
    pub code: String,

    /// Moved quantity, always > 0.
    pub quantity: i64,

    /// ENTRADA or SALIDA.
    pub kind: MovementKind,

    /// When the movement was recorded.
    pub at: DateTime<Utc>,
}

// =============================================================================
// Lookup Entities
// =============================================================================

/// A brand articles may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Brand {
    pub id: i64,
    pub name: String,
}

/// A supplier articles may reference. Suppliers additionally carry a
/// free-form contact string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: String,
}

/// A category articles may reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// =============================================================================
// Aggregates
// =============================================================================

/// One row of the "most sold" ranking.
///
/// `sold` sums the SALIDA quantities for the article; articles with no
/// exits (or no movements at all) appear with `sold == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RankingEntry {
    pub code: String,
    pub description: String,
    pub sold: i64,
}

// =============================================================================
// Store Settings
// =============================================================================

/// Store-wide configuration, loaded from the key-value `config` table.
///
/// ## Design
/// This is a plain struct passed by reference into the pricing
/// calculator and the DTO layer. There is no ambient global: tests
/// construct arbitrary settings without touching a shared table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    /// Global tax percent (IVA_GLOBAL). Used for unprotected articles.
    pub global_tax_pct: f64,

    /// Global margin percent (GANANCIA_GLOBAL).
    pub global_margin_pct: f64,

    /// Display currency code (MONEDA).
    pub currency: String,

    /// Whether low-stock alerts are shown (ALERT_ENABLED).
    pub alerts_enabled: bool,

    /// Theme background color (BACKGROUND_COLOR).
    pub background_color: String,

    /// Theme primary color (PRIMARY_COLOR).
    pub primary_color: String,

    /// Theme foreground/text color (FOREGROUND_COLOR).
    pub foreground_color: String,

    /// USD exchange rate (COTIZACION_USD): local price divided by this
    /// yields the foreign price.
    pub usd_rate: f64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            global_tax_pct: crate::DEFAULT_TAX_PCT,
            global_margin_pct: 0.0,
            currency: "ARS".to_string(),
            alerts_enabled: true,
            background_color: "#F5F5F5".to_string(),
            primary_color: "#0078D4".to_string(),
            foreground_color: "#2C3E50".to_string(),
            usd_rate: crate::DEFAULT_USD_RATE,
        }
    }
}

// =============================================================================
// Bulk Update Filter
// =============================================================================

/// Optional scope for mass tax/margin updates.
///
/// Mass updates always skip protected articles; a filter additionally
/// restricts them to articles referencing one brand, supplier or
/// category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "by", content = "id")]
pub enum ArticleFilter {
    Brand(i64),
    Supplier(i64),
    Category(i64),
}

// =============================================================================
// Unit Tests
// =============================================================================
