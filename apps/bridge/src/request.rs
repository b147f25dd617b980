//! # Request Protocol
//!
//! The closed set of operations the bridge accepts, one JSON object per
//! line on stdin.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  stdin  → {"op":"stock_exit","code":"A-001","quantity":2}\n     │
//! │  stdout → {"ok":true,"data":3}\n                                │
//! │                                                                 │
//! │  stdin  → {"op":"stock_exit","code":"A-001","quantity":99}\n    │
//! │  stdout → {"ok":false,"error":{"code":"INSUFFICIENT_STOCK",     │
//! │            "message":"insufficient stock for 'A-001': ..."}}\n  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `op` tag selects the variant; unknown tags or malformed bodies
//! fail deserialization and come back as a `BAD_REQUEST` envelope.
//! Being an enum, the operation set is closed at compile time: adding
//! an operation means adding a variant, and the dispatcher's exhaustive
//! match forces a handler for it.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use stok_core::{Article, ArticleFilter, StoreSettings};

fn default_reopen() -> bool {
    true
}

/// A single bridge operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    // ---- articles -------------------------------------------------------
    SaveArticle { article: Article },
    GetArticle { code: String },
    DeleteArticle { code: String },
    ListArticles,
    SearchArticles { query: String },
    ListLowStock,
    Ranking,

    // ---- stock ----------------------------------------------------------
    StockEntry { code: String, quantity: i64 },
    StockExit { code: String, quantity: i64 },
    History { code: Option<String> },

    // ---- lookups --------------------------------------------------------
    ListBrands,
    AddBrand { name: String },
    RenameBrand { id: i64, name: String },
    DeleteBrand { id: i64 },
    ListSuppliers,
    AddSupplier {
        name: String,
        #[serde(default)]
        contact: String,
    },
    UpdateSupplier { id: i64, name: String, contact: String },
    DeleteSupplier { id: i64 },
    ListCategories,
    AddCategory { name: String },
    DeleteCategory { id: i64 },

    // ---- settings & pricing ---------------------------------------------
    GetSettings,
    SaveSettings { settings: StoreSettings },
    RefreshUsdRate,
    SetTaxBulk {
        value: f64,
        #[serde(default)]
        filter: Option<ArticleFilter>,
    },
    SetMarginBulk {
        value: f64,
        #[serde(default)]
        filter: Option<ArticleFilter>,
    },

    // ---- maintenance ----------------------------------------------------
    CreateBackup,
    RestoreBackup {
        #[serde(default = "default_reopen")]
        reopen: bool,
    },
    ExportArticlesCsv { path: String },
    ExportHistoryCsv {
        path: String,
        #[serde(default)]
        code: Option<String>,
    },
}

/// The response envelope written for every request line.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl Envelope {
    pub fn success(data: serde_json::Value) -> Self {
        Envelope {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Envelope {
            ok: false,
            data: None,
            error: Some(error),
        }
    }
}
