//! # Article Repository
//!
//! Database operations for articles: CRUD by code, search, and the
//! derived read-only views (low stock, ranking, totals).
//!
//! ## Upsert Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  INSERT OR REPLACE by codigo                    │
//! │                                                                 │
//! │  save { codigo: "A-1", descripcion: "v1" }  → 1 row             │
//! │  save { codigo: "A-1", descripcion: "v2" }  → still 1 row,      │
//! │                                               latest wins       │
//! │                                                                 │
//! │  The code is the identity; saving twice never duplicates.       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quantity-on-hand is part of the row but is only ever mutated through
//! the stock ledger; this repository persists whatever the caller
//! validated, and callers do not hand-edit `stock` on existing rows.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use stok_core::validation::validate_percent;
use stok_core::{Article, ArticleFilter, RankingEntry};

/// Shared SELECT aliasing the legacy Spanish columns to the domain
/// field names.
const BASE_SELECT: &str = r#"
SELECT
    codigo       AS code,
    descripcion  AS description,
    costo        AS cost,
    ganancia     AS margin_pct,
    iva          AS tax_pct,
    stock        AS stock,
    stock_minimo AS min_stock,
    marcaId      AS brand_id,
    proveedorId  AS supplier_id,
    categoriaId  AS category_id,
    imagen       AS image,
    protegido    AS protected
FROM articulos
"#;

/// Repository for article database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = store.articles()?;
/// repo.upsert(&article).await?;
/// let low = repo.low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ArticleRepository {
    pool: SqlitePool,
}

impl ArticleRepository {
    /// Creates a new ArticleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ArticleRepository { pool }
    }

    /// Lists all articles, ordered by code.
    pub async fn list(&self) -> DbResult<Vec<Article>> {
        let sql = format!("{BASE_SELECT} ORDER BY codigo");
        let articles = sqlx::query_as::<_, Article>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// Searches articles by code or description (case-insensitive
    /// substring). An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Article>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list().await;
        }

        debug!(term = %term, "searching articles");

        let sql = format!("{BASE_SELECT} WHERE codigo LIKE ?1 OR descripcion LIKE ?1 ORDER BY codigo");
        let pattern = format!("%{term}%");
        let articles = sqlx::query_as::<_, Article>(&sql)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// Gets an article by code.
    pub async fn get(&self, code: &str) -> DbResult<Option<Article>> {
        let sql = format!("{BASE_SELECT} WHERE codigo = ?1");
        let article = sqlx::query_as::<_, Article>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    /// Gets several articles by code in one round trip.
    pub async fn get_many(&self, codes: &[String]) -> DbResult<Vec<Article>> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=codes.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("{BASE_SELECT} WHERE codigo IN ({placeholders}) ORDER BY codigo");

        let mut query = sqlx::query_as::<_, Article>(&sql);
        for code in codes {
            query = query.bind(code);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Saves an article: insert-or-replace keyed by code.
    ///
    /// ## Errors
    /// `DbError::Domain(Validation)` when the article fails
    /// [`Article::validate`]; the store is untouched in that case.
    pub async fn upsert(&self, article: &Article) -> DbResult<()> {
        article.validate()?;

        debug!(code = %article.code, "saving article");

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articulos
                (codigo, descripcion, costo, ganancia, iva, stock, stock_minimo,
                 marcaId, proveedorId, categoriaId, imagen, protegido)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&article.code)
        .bind(&article.description)
        .bind(article.cost)
        .bind(article.margin_pct)
        .bind(article.tax_pct)
        .bind(article.stock)
        .bind(article.min_stock)
        .bind(article.brand_id)
        .bind(article.supplier_id)
        .bind(article.category_id)
        .bind(&article.image)
        .bind(article.protected)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes an article by code. Movement history for the code is
    /// kept. Returns whether a row was actually removed.
    pub async fn delete(&self, code: &str) -> DbResult<bool> {
        debug!(code = %code, "deleting article");

        let result = sqlx::query("DELETE FROM articulos WHERE codigo = ?1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Aggregation queries
    // -------------------------------------------------------------------------

    /// Lists "faltantes": articles whose quantity on hand is at or
    /// below their minimum threshold, ordered by code.
    pub async fn low_stock(&self) -> DbResult<Vec<Article>> {
        let sql = format!("{BASE_SELECT} WHERE stock <= stock_minimo ORDER BY codigo");
        let articles = sqlx::query_as::<_, Article>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    /// Ranking by total sold, descending.
    ///
    /// Left-joins articles against the movement log so articles with no
    /// exits - or no movements at all - still appear, with `sold = 0`.
    /// Ties break by code for stable output.
    pub async fn ranking(&self) -> DbResult<Vec<RankingEntry>> {
        let entries = sqlx::query_as::<_, RankingEntry>(
            r#"
            SELECT
                a.codigo      AS code,
                a.descripcion AS description,
                IFNULL(SUM(CASE WHEN sh.tipo = 'SALIDA' THEN sh.cantidad ELSE 0 END), 0) AS sold
            FROM articulos a
            LEFT JOIN stock_historial sh ON a.codigo = sh.codigo
            GROUP BY a.codigo, a.descripcion
            ORDER BY sold DESC, a.codigo ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Total quantity sold (sum of SALIDA movements) for one article.
    pub async fn total_sold(&self, code: &str) -> DbResult<i64> {
        let sold: i64 = sqlx::query_scalar(
            r#"
            SELECT IFNULL(SUM(CASE WHEN tipo = 'SALIDA' THEN cantidad ELSE 0 END), 0)
            FROM stock_historial
            WHERE codigo = ?1
            "#,
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await?;
        Ok(sold)
    }

    // -------------------------------------------------------------------------
    // Mass updates
    // -------------------------------------------------------------------------

    /// Sets the tax percent across all unprotected articles, optionally
    /// restricted to one brand/supplier/category. Returns the number of
    /// articles changed. Writes no movement rows.
    pub async fn set_tax_bulk(&self, new_tax: f64, filter: Option<ArticleFilter>) -> DbResult<u64> {
        self.bulk_update("iva", new_tax, filter).await
    }

    /// Sets the margin percent across all unprotected articles; same
    /// scoping rules as [`Self::set_tax_bulk`].
    pub async fn set_margin_bulk(
        &self,
        new_margin: f64,
        filter: Option<ArticleFilter>,
    ) -> DbResult<u64> {
        self.bulk_update("ganancia", new_margin, filter).await
    }

    async fn bulk_update(
        &self,
        column: &'static str,
        value: f64,
        filter: Option<ArticleFilter>,
    ) -> DbResult<u64> {
        validate_percent(value)?;

        // Protected articles keep their individual values, always.
        let (sql, filter_id) = match filter {
            None => (
                format!("UPDATE articulos SET {column} = ?1 WHERE protegido = 0"),
                None,
            ),
            Some(ArticleFilter::Brand(id)) => (
                format!("UPDATE articulos SET {column} = ?1 WHERE protegido = 0 AND marcaId = ?2"),
                Some(id),
            ),
            Some(ArticleFilter::Supplier(id)) => (
                format!(
                    "UPDATE articulos SET {column} = ?1 WHERE protegido = 0 AND proveedorId = ?2"
                ),
                Some(id),
            ),
            Some(ArticleFilter::Category(id)) => (
                format!(
                    "UPDATE articulos SET {column} = ?1 WHERE protegido = 0 AND categoriaId = ?2"
                ),
                Some(id),
            ),
        };

        let mut query = sqlx::query(&sql).bind(value);
        if let Some(id) = filter_id {
            query = query.bind(id);
        }
        let result = query.execute(&self.pool).await?;

        debug!(column, value, affected = result.rows_affected(), "bulk update");
        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
