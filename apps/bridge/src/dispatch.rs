//! # Request Dispatcher
//!
//! Maps each [`Request`] variant onto the store, producing the JSON
//! value for the response envelope.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Request (closed enum)                                          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  dispatch() ── exhaustive match, one handler per operation      │
//! │       │                                                         │
//! │       ├── articles  → ArticleRepository (+ pricing via DTO)     │
//! │       ├── stock     → StockLedger                               │
//! │       ├── lookups   → LookupRepository                          │
//! │       ├── settings  → ConfigRepository / rate refresh           │
//! │       └── backup    → BackupManager / CSV export                │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ApiResult<serde_json::Value>                                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Article reads load the settings once and price every row under that
//! snapshot, so one response never mixes two exchange rates.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::dto::ArticleDto;
use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::rates;
use crate::request::Request;
use stok_db::{export, Store};

fn to_json<T: Serialize>(value: &T) -> ApiResult<Value> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

/// Executes one request against the store.
pub async fn dispatch(store: &Store, request: Request) -> ApiResult<Value> {
    debug!(?request, "dispatching");

    match request {
        // ---- articles ---------------------------------------------------
        Request::SaveArticle { article } => {
            let articles = store.articles()?;
            articles.upsert(&article).await?;
            let settings = store.config()?.load().await?;
            to_json(&ArticleDto::from_article(article, &settings))
        }
        Request::GetArticle { code } => {
            let article = store
                .articles()?
                .get(&code)
                .await?
                .ok_or_else(|| {
                    ApiError::new(ErrorCode::NotFound, format!("article not found: {code}"))
                })?;
            let settings = store.config()?.load().await?;
            to_json(&ArticleDto::from_article(article, &settings))
        }
        Request::DeleteArticle { code } => {
            let deleted = store.articles()?.delete(&code).await?;
            if !deleted {
                return Err(ApiError::new(
                    ErrorCode::NotFound,
                    format!("article not found: {code}"),
                ));
            }
            Ok(json!(true))
        }
        Request::ListArticles => {
            let articles = store.articles()?.list().await?;
            let settings = store.config()?.load().await?;
            to_json(&ArticleDto::from_articles(articles, &settings))
        }
        Request::SearchArticles { query } => {
            let articles = store.articles()?.search(&query).await?;
            let settings = store.config()?.load().await?;
            to_json(&ArticleDto::from_articles(articles, &settings))
        }
        Request::ListLowStock => {
            let articles = store.articles()?.low_stock().await?;
            let settings = store.config()?.load().await?;
            to_json(&ArticleDto::from_articles(articles, &settings))
        }
        Request::Ranking => to_json(&store.articles()?.ranking().await?),

        // ---- stock ------------------------------------------------------
        Request::StockEntry { code, quantity } => {
            let new_stock = store.stock()?.entry(&code, quantity).await?;
            Ok(json!(new_stock))
        }
        Request::StockExit { code, quantity } => {
            let new_stock = store.stock()?.exit(&code, quantity).await?;
            Ok(json!(new_stock))
        }
        Request::History { code } => {
            let ledger = store.stock()?;
            let movements = match code {
                Some(code) => ledger.history(&code).await?,
                None => ledger.full_history().await?,
            };
            to_json(&movements)
        }

        // ---- lookups ----------------------------------------------------
        Request::ListBrands => to_json(&store.lookups()?.list_brands().await?),
        Request::AddBrand { name } => Ok(json!(store.lookups()?.add_brand(&name).await?)),
        Request::RenameBrand { id, name } => {
            store.lookups()?.rename_brand(id, &name).await?;
            Ok(json!(true))
        }
        Request::DeleteBrand { id } => {
            store.lookups()?.delete_brand(id).await?;
            Ok(json!(true))
        }
        Request::ListSuppliers => to_json(&store.lookups()?.list_suppliers().await?),
        Request::AddSupplier { name, contact } => {
            Ok(json!(store.lookups()?.add_supplier(&name, &contact).await?))
        }
        Request::UpdateSupplier { id, name, contact } => {
            store.lookups()?.update_supplier(id, &name, &contact).await?;
            Ok(json!(true))
        }
        Request::DeleteSupplier { id } => {
            store.lookups()?.delete_supplier(id).await?;
            Ok(json!(true))
        }
        Request::ListCategories => to_json(&store.lookups()?.list_categories().await?),
        Request::AddCategory { name } => Ok(json!(store.lookups()?.add_category(&name).await?)),
        Request::DeleteCategory { id } => {
            store.lookups()?.delete_category(id).await?;
            Ok(json!(true))
        }

        // ---- settings & pricing -----------------------------------------
        Request::GetSettings => to_json(&store.config()?.load().await?),
        Request::SaveSettings { settings } => {
            store.config()?.save(&settings).await?;
            to_json(&settings)
        }
        Request::RefreshUsdRate => {
            let rate = rates::refresh_usd_rate(&store.config()?).await?;
            Ok(json!(rate))
        }
        Request::SetTaxBulk { value, filter } => {
            let affected = store.articles()?.set_tax_bulk(value, filter).await?;
            Ok(json!(affected))
        }
        Request::SetMarginBulk { value, filter } => {
            let affected = store.articles()?.set_margin_bulk(value, filter).await?;
            Ok(json!(affected))
        }

        // ---- maintenance ------------------------------------------------
        Request::CreateBackup => {
            let path = store.backup().create_snapshot().await?;
            Ok(json!(path.display().to_string()))
        }
        Request::RestoreBackup { reopen } => {
            let path = store.backup().restore_latest(reopen).await?;
            Ok(json!(path.display().to_string()))
        }
        Request::ExportArticlesCsv { path } => {
            let rows = export::export_articles(&store.articles()?, Path::new(&path)).await?;
            Ok(json!(rows))
        }
        Request::ExportHistoryCsv { path, code } => {
            let rows =
                export::export_history(&store.stock()?, Path::new(&path), code.as_deref()).await?;
            Ok(json!(rows))
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stok_core::Article;
    use stok_db::StoreOptions;

    fn article(code: &str, stock: i64) -> Article {
        Article {
            code: code.to_string(),
            description: format!("article {code}"),
            cost: 100.0,
            margin_pct: 10.0,
            tax_pct: 0.0,
            stock,
            min_stock: 1,
            brand_id: None,
            supplier_id: None,
            category_id: None,
            image: None,
            protected: false,
        }
    }

    async fn open() -> Store {
        Store::open(StoreOptions::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_save_then_get_article_with_prices() {
        let store = open().await;

        let saved = dispatch(
            &store,
            Request::SaveArticle {
                article: article("A-1", 5),
            },
        )
        .await
        .unwrap();
        // unprotected: global tax 21% applies over 100 * 1.10
        let price = saved["priceLocal"].as_f64().unwrap();
        assert!((price - 133.1).abs() < 1e-9);

        let got = dispatch(
            &store,
            Request::GetArticle {
                code: "A-1".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(got["code"], "A-1");
        let price = got["priceLocal"].as_f64().unwrap();
        assert!((price - 133.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_get_missing_article_is_not_found() {
        let store = open().await;
        let err = dispatch(
            &store,
            Request::GetArticle {
                code: "ghost".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_stock_flow_through_dispatch() {
        let store = open().await;
        dispatch(
            &store,
            Request::SaveArticle {
                article: article("A-1", 5),
            },
        )
        .await
        .unwrap();

        let after_entry = dispatch(
            &store,
            Request::StockEntry {
                code: "A-1".to_string(),
                quantity: 3,
            },
        )
        .await
        .unwrap();
        assert_eq!(after_entry, json!(8));

        let err = dispatch(
            &store,
            Request::StockExit {
                code: "A-1".to_string(),
                quantity: 99,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let history = dispatch(&store, Request::History { code: None })
            .await
            .unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_flow_through_dispatch() {
        let store = open().await;

        let id = dispatch(
            &store,
            Request::AddBrand {
                name: "Acme".to_string(),
            },
        )
        .await
        .unwrap();

        let brands = dispatch(&store, Request::ListBrands).await.unwrap();
        assert_eq!(brands.as_array().unwrap().len(), 1);

        dispatch(
            &store,
            Request::DeleteBrand {
                id: id.as_i64().unwrap(),
            },
        )
        .await
        .unwrap();
        let brands = dispatch(&store, Request::ListBrands).await.unwrap();
        assert!(brands.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settings_round_trip_and_bulk_update() {
        let store = open().await;
        dispatch(
            &store,
            Request::SaveArticle {
                article: article("A-1", 5),
            },
        )
        .await
        .unwrap();

        let mut settings: stok_core::StoreSettings =
            serde_json::from_value(dispatch(&store, Request::GetSettings).await.unwrap()).unwrap();
        settings.global_tax_pct = 10.0;
        dispatch(&store, Request::SaveSettings { settings }).await.unwrap();

        let affected = dispatch(
            &store,
            Request::SetMarginBulk {
                value: 50.0,
                filter: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(affected, json!(1));

        let got = dispatch(
            &store,
            Request::GetArticle {
                code: "A-1".to_string(),
            },
        )
        .await
        .unwrap();
        // 100 * 1.50 * 1.10 under the new margin and global tax
        let price = got["priceLocal"].as_f64().unwrap();
        assert!((price - 165.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_backup_and_export_through_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreOptions::new(dir.path())).await.unwrap();
        dispatch(
            &store,
            Request::SaveArticle {
                article: article("A-1", 5),
            },
        )
        .await
        .unwrap();

        let snapshot = dispatch(&store, Request::CreateBackup).await.unwrap();
        assert!(snapshot.as_str().unwrap().contains("backup_"));

        dispatch(
            &store,
            Request::DeleteArticle {
                code: "A-1".to_string(),
            },
        )
        .await
        .unwrap();
        dispatch(&store, Request::RestoreBackup { reopen: true })
            .await
            .unwrap();

        let restored = dispatch(&store, Request::ListArticles).await.unwrap();
        assert_eq!(restored.as_array().unwrap().len(), 1);

        let csv_path = dir.path().join("catalog.csv");
        let rows = dispatch(
            &store,
            Request::ExportArticlesCsv {
                path: csv_path.display().to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(rows, json!(1));
        assert!(csv_path.exists());
    }

    #[tokio::test]
    async fn test_closed_store_surfaces_store_closed() {
        let store = open().await;
        store.close().await;

        let err = dispatch(&store, Request::ListArticles).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreClosed);
    }
}
