//! # Stock Ledger
//!
//! The stock transaction manager: entry/exit mutations and the
//! movement history.
//!
//! ## Transaction Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   entry / exit (one unit of work)               │
//! │                                                                 │
//! │  validate quantity > 0            (no effect on failure)        │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  acquire stock gate  ◄── serializes ALL stock mutations         │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  BEGIN                                                          │
//! │    SELECT stock WHERE codigo      → NotFound if missing         │
//! │    exit: stock >= qty?            → InsufficientStock if not    │
//! │    UPDATE articulos SET stock ± qty                             │
//! │    INSERT INTO stock_historial (ENTRADA | SALIDA)               │
//! │  COMMIT                                                         │
//! │                                                                 │
//! │  Both effects commit together or not at all: a failed append    │
//! │  rolls the counter update back, and vice versa.                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gate makes check-then-mutate race-free: two concurrent exits
//! cannot both observe the same stock level and drive it negative.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stok_core::validation::validate_quantity;
use stok_core::{CoreError, MovementKind, StockMovement};

const HISTORY_SELECT: &str = r#"
SELECT
    id,
    codigo   AS code,
    cantidad AS quantity,
    tipo     AS kind,
    fecha    AS "at"
FROM stock_historial
"#;

/// The stock transaction manager.
///
/// Obtained through [`crate::Store::stock`]; every ledger handed out by
/// one store shares the same mutation gate.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    /// Shared with the owning store; serializes entry/exit.
    gate: Arc<Mutex<()>>,
}

impl StockLedger {
    /// Creates a new StockLedger over a pool and a shared gate.
    pub fn new(pool: SqlitePool, gate: Arc<Mutex<()>>) -> Self {
        StockLedger { pool, gate }
    }

    /// Records a stock entry. Returns the new quantity on hand.
    ///
    /// ## Errors
    /// - `Validation` when `quantity <= 0`
    /// - `ArticleNotFound` when no article has that code
    pub async fn entry(&self, code: &str, quantity: i64) -> DbResult<i64> {
        self.apply(code, quantity, MovementKind::Entry).await
    }

    /// Records a stock exit. Returns the new quantity on hand.
    ///
    /// ## Errors
    /// - `Validation` when `quantity <= 0`
    /// - `ArticleNotFound` when no article has that code
    /// - `InsufficientStock` when quantity on hand < requested; the
    ///   stock level is left unchanged (no overdraft mode)
    pub async fn exit(&self, code: &str, quantity: i64) -> DbResult<i64> {
        self.apply(code, quantity, MovementKind::Exit).await
    }

    async fn apply(&self, code: &str, quantity: i64, kind: MovementKind) -> DbResult<i64> {
        validate_quantity(quantity)?;

        let _gate = self.gate.lock().await;

        let mut tx = self.pool.begin().await?;

        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM articulos WHERE codigo = ?1")
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?;
        let stock = stock.ok_or_else(|| CoreError::ArticleNotFound(code.to_string()))?;

        let new_stock = match kind {
            MovementKind::Entry => stock + quantity,
            MovementKind::Exit => {
                if stock < quantity {
                    return Err(DbError::Domain(CoreError::InsufficientStock {
                        code: code.to_string(),
                        available: stock,
                        requested: quantity,
                    }));
                }
                stock - quantity
            }
        };

        sqlx::query("UPDATE articulos SET stock = ?1 WHERE codigo = ?2")
            .bind(new_stock)
            .bind(code)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO stock_historial (codigo, cantidad, tipo, fecha) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(code)
        .bind(quantity)
        .bind(kind)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(code, quantity, kind = kind.as_str(), new_stock, "stock movement recorded");
        Ok(new_stock)
    }

    /// Movement history for one article, newest first.
    ///
    /// Ordered by id (insertion order), not by timestamp: two movements
    /// within the same clock tick still order deterministically.
    pub async fn history(&self, code: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!("{HISTORY_SELECT} WHERE codigo = ?1 ORDER BY id DESC");
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(code)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    /// Full movement history across all articles, newest first.
    pub async fn full_history(&self) -> DbResult<Vec<StockMovement>> {
        let sql = format!("{HISTORY_SELECT} ORDER BY id DESC");
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::error::DbError;
    use crate::store::{Store, StoreOptions};
    use stok_core::{Article, CoreError, MovementKind};

    fn article(code: &str, stock: i64) -> Article {
        Article {
            code: code.to_string(),
            description: format!("article {code}"),
            cost: 10.0,
            margin_pct: 0.0,
            tax_pct: 0.0,
            stock,
            min_stock: 0,
            brand_id: None,
            supplier_id: None,
            category_id: None,
            image: None,
            protected: false,
        }
    }

    async fn open_with(code: &str, stock: i64) -> Store {
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        store
            .articles()
            .unwrap()
            .upsert(&article(code, stock))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_entry_and_exit_keep_the_running_total() {
        let store = open_with("A", 10).await;
        let ledger = store.stock().unwrap();

        // Q0=10; +5 -3 +2 -4 => 10
        assert_eq!(ledger.entry("A", 5).await.unwrap(), 15);
        assert_eq!(ledger.exit("A", 3).await.unwrap(), 12);
        assert_eq!(ledger.entry("A", 2).await.unwrap(), 14);
        assert_eq!(ledger.exit("A", 4).await.unwrap(), 10);

        let a = store.articles().unwrap().get("A").await.unwrap().unwrap();
        assert_eq!(a.stock, 10);
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let store = open_with("A", 10).await;
        let ledger = store.stock().unwrap();

        for qty in [0, -1] {
            assert!(matches!(
                ledger.entry("A", qty).await.unwrap_err(),
                DbError::Domain(CoreError::Validation(_))
            ));
            assert!(matches!(
                ledger.exit("A", qty).await.unwrap_err(),
                DbError::Domain(CoreError::Validation(_))
            ));
        }

        // no movements were written
        assert!(ledger.history("A").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_article_rejected() {
        let store = open_with("A", 10).await;
        let ledger = store.stock().unwrap();

        assert!(matches!(
            ledger.entry("ghost", 1).await.unwrap_err(),
            DbError::Domain(CoreError::ArticleNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overdraft_rejected_with_no_partial_effect() {
        let store = open_with("A", 3).await;
        let ledger = store.stock().unwrap();

        let err = ledger.exit("A", 5).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // neither the counter nor the log changed
        let a = store.articles().unwrap().get("A").await.unwrap().unwrap();
        assert_eq!(a.stock, 3);
        assert!(ledger.history("A").await.unwrap().is_empty());

        // draining to exactly zero is fine
        assert_eq!(ledger.exit("A", 3).await.unwrap(), 0);
        assert!(ledger.exit("A", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_history_is_newest_first_by_id() {
        let store = open_with("A", 10).await;
        let ledger = store.stock().unwrap();

        ledger.entry("A", 1).await.unwrap();
        ledger.exit("A", 2).await.unwrap();
        ledger.entry("A", 3).await.unwrap();

        let history = ledger.history("A").await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history[0].id > history[1].id && history[1].id > history[2].id);
        assert_eq!(history[0].kind, MovementKind::Entry);
        assert_eq!(history[0].quantity, 3);
        assert_eq!(history[2].quantity, 1);
    }

    #[tokio::test]
    async fn test_full_history_spans_articles() {
        let store = open_with("A", 10).await;
        store
            .articles()
            .unwrap()
            .upsert(&article("B", 10))
            .await
            .unwrap();
        let ledger = store.stock().unwrap();

        ledger.exit("A", 1).await.unwrap();
        ledger.exit("B", 2).await.unwrap();

        let all = ledger.full_history().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].code, "B"); // newest first
        assert_eq!(ledger.history("A").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_history_append_rolls_back_the_counter() {
        let store = open_with("A", 10).await;
        let ledger = store.stock().unwrap();
        let pool = store.pool().unwrap();

        // make the history append itself fail
        sqlx::query(
            r#"
            CREATE TRIGGER reject_history BEFORE INSERT ON stock_historial
            BEGIN SELECT RAISE(ABORT, 'history append rejected'); END
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(matches!(
            ledger.entry("A", 5).await.unwrap_err(),
            DbError::QueryFailed(_)
        ));
        assert!(matches!(
            ledger.exit("A", 2).await.unwrap_err(),
            DbError::QueryFailed(_)
        ));

        // the counter update rolled back with the append
        let a = store.articles().unwrap().get("A").await.unwrap().unwrap();
        assert_eq!(a.stock, 10);
        assert!(ledger.history("A").await.unwrap().is_empty());

        // with the fault removed the ledger works again
        sqlx::query("DROP TRIGGER reject_history")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(ledger.entry("A", 5).await.unwrap(), 15);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_exits_never_go_negative() {
        // file-backed store so tasks get separate pooled connections
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(Store::open(StoreOptions::new(dir.path())).await.unwrap());
        store
            .articles()
            .unwrap()
            .upsert(&article("A", 5))
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                store.stock().unwrap().exit("A", 1).await.is_ok()
            }));
        }

        let mut succeeded = 0;
        for task in tasks {
            if task.await.unwrap() {
                succeeded += 1;
            }
        }

        // exactly the available 5 exits may win
        assert_eq!(succeeded, 5);
        let a = store.articles().unwrap().get("A").await.unwrap().unwrap();
        assert_eq!(a.stock, 0);
        assert_eq!(store.stock().unwrap().history("A").await.unwrap().len(), 5);
    }
}
