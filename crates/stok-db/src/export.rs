//! # CSV Export
//!
//! Flat-file exports of the article catalog and the movement history,
//! for spreadsheets and ad-hoc reporting.
//!
//! The writers take already-fetched rows, so callers control the query
//! (full catalog, one article's history, a search result). The
//! file-path helpers pair a fetch with a write for the common cases.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::DbResult;
use crate::repository::article::ArticleRepository;
use crate::repository::stock::StockLedger;
use stok_core::{Article, StockMovement};

/// Column headers for the article catalog export.
const ARTICLE_HEADERS: [&str; 9] = [
    "code",
    "description",
    "cost",
    "margin %",
    "tax %",
    "stock",
    "min stock",
    "brand id",
    "supplier id",
];

/// Column headers for the movement history export.
const HISTORY_HEADERS: [&str; 5] = ["id", "code", "quantity", "kind", "date"];

/// Writes the article catalog as CSV.
pub fn write_articles_csv<W: Write>(writer: W, articles: &[Article]) -> DbResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(ARTICLE_HEADERS)?;

    for a in articles {
        csv.write_record([
            a.code.as_str(),
            a.description.as_str(),
            &a.cost.to_string(),
            &a.margin_pct.to_string(),
            &a.tax_pct.to_string(),
            &a.stock.to_string(),
            &a.min_stock.to_string(),
            &a.brand_id.map(|v| v.to_string()).unwrap_or_default(),
            &a.supplier_id.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Writes a movement history as CSV, in the order given.
pub fn write_history_csv<W: Write>(writer: W, movements: &[StockMovement]) -> DbResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(HISTORY_HEADERS)?;

    for m in movements {
        csv.write_record([
            m.id.to_string().as_str(),
            m.code.as_str(),
            &m.quantity.to_string(),
            m.kind.as_str(),
            &m.at.to_rfc3339(),
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Exports the full article catalog to a file. Returns the row count.
pub async fn export_articles(repo: &ArticleRepository, path: &Path) -> DbResult<usize> {
    let articles = repo.list().await?;
    write_articles_csv(File::create(path)?, &articles)?;
    info!(path = %path.display(), rows = articles.len(), "article catalog exported");
    Ok(articles.len())
}

/// Exports the movement history to a file, the full ledger or one
/// article's slice. Returns the row count.
pub async fn export_history(
    ledger: &StockLedger,
    path: &Path,
    code: Option<&str>,
) -> DbResult<usize> {
    let movements = match code {
        Some(code) => ledger.history(code).await?,
        None => ledger.full_history().await?,
    };
    write_history_csv(File::create(path)?, &movements)?;
    info!(path = %path.display(), rows = movements.len(), "movement history exported");
    Ok(movements.len())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, StoreOptions};

    fn article(code: &str) -> Article {
        Article {
            code: code.to_string(),
            description: format!("article {code}"),
            cost: 100.0,
            margin_pct: 10.0,
            tax_pct: 21.0,
            stock: 5,
            min_stock: 2,
            brand_id: None,
            supplier_id: None,
            category_id: None,
            image: None,
            protected: false,
        }
    }

    #[test]
    fn test_articles_csv_shape() {
        // no store involved, so any reference id may appear here
        let mut a = article("A-1");
        a.brand_id = Some(1);

        let mut out = Vec::new();
        write_articles_csv(&mut out, &[a]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "code,description,cost,margin %,tax %,stock,min stock,brand id,supplier id"
        );
        // optional supplier id renders as an empty field
        assert_eq!(lines.next().unwrap(), "A-1,article A-1,100,10,21,5,2,1,");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_catalog_writes_headers_only() {
        let mut out = Vec::new();
        write_articles_csv(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_description_with_comma_is_quoted() {
        let mut a = article("A-1");
        a.description = "one, two".to_string();

        let mut out = Vec::new();
        write_articles_csv(&mut out, &[a]).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\"one, two\""));
    }

    #[tokio::test]
    async fn test_export_history_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        store.articles().unwrap().upsert(&article("A-1")).await.unwrap();

        let ledger = store.stock().unwrap();
        ledger.entry("A-1", 3).await.unwrap();
        ledger.exit("A-1", 1).await.unwrap();

        let path = dir.path().join("history.csv");
        let rows = export_history(&ledger, &path, None).await.unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "id,code,quantity,kind,date");
        // newest first
        assert!(lines.next().unwrap().contains("SALIDA"));
        assert!(lines.next().unwrap().contains("ENTRADA"));
    }

    #[tokio::test]
    async fn test_export_articles_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(StoreOptions::in_memory()).await.unwrap();
        store.articles().unwrap().upsert(&article("B-2")).await.unwrap();
        store.articles().unwrap().upsert(&article("A-1")).await.unwrap();

        let path = dir.path().join("catalog.csv");
        let rows = export_articles(&store.articles().unwrap(), &path)
            .await
            .unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        // catalog order is by code
        let codes: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(codes, ["A-1", "B-2"]);
    }
}
