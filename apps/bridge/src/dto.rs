//! # Response DTOs
//!
//! Shapes returned to the caller where the stored entity alone is not
//! enough. The main one is [`ArticleDto`]: an article plus its computed
//! sale prices, so callers never re-implement the pricing formula.

use serde::Serialize;

use stok_core::pricing;
use stok_core::{Article, StoreSettings};

/// An article enriched with its computed prices and stock status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDto {
    pub code: String,
    pub description: String,
    pub cost: f64,
    pub margin_pct: f64,
    pub tax_pct: f64,
    pub stock: i64,
    pub min_stock: i64,
    pub brand_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub category_id: Option<i64>,
    pub image: Option<String>,
    pub protected: bool,
    /// Final sale price in the store currency.
    pub price_local: f64,
    /// Sale price converted at the configured USD rate (0 when no
    /// usable rate is configured).
    pub price_foreign: f64,
    /// Whether the article is at or below its minimum stock level.
    pub low_stock: bool,
}

impl ArticleDto {
    /// Builds a DTO from a stored article and the current settings.
    pub fn from_article(article: Article, settings: &StoreSettings) -> Self {
        let quote = pricing::quote(&article, settings);
        let low_stock = article.is_low_stock();

        ArticleDto {
            code: article.code,
            description: article.description,
            cost: article.cost,
            margin_pct: article.margin_pct,
            tax_pct: article.tax_pct,
            stock: article.stock,
            min_stock: article.min_stock,
            brand_id: article.brand_id,
            supplier_id: article.supplier_id,
            category_id: article.category_id,
            image: article.image,
            protected: article.protected,
            price_local: quote.local,
            price_foreign: quote.foreign,
            low_stock,
        }
    }

    /// Maps a batch of articles under one settings snapshot.
    pub fn from_articles(articles: Vec<Article>, settings: &StoreSettings) -> Vec<Self> {
        articles
            .into_iter()
            .map(|a| ArticleDto::from_article(a, settings))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article {
            code: "A-1".to_string(),
            description: "widget".to_string(),
            cost: 100.0,
            margin_pct: 10.0,
            tax_pct: 20.0,
            stock: 2,
            min_stock: 5,
            brand_id: None,
            supplier_id: None,
            category_id: None,
            image: None,
            protected: true,
        }
    }

    #[test]
    fn test_dto_carries_computed_prices() {
        let mut settings = StoreSettings::default();
        settings.usd_rate = 1000.0;

        let dto = ArticleDto::from_article(article(), &settings);
        // 100 * 1.10 * 1.20, protected article uses its own tax
        assert!((dto.price_local - 132.0).abs() < 1e-9);
        assert!((dto.price_foreign - 0.132).abs() < 1e-9);
        assert!(dto.low_stock);
    }

    #[test]
    fn test_dto_serializes_camel_case() {
        let dto = ArticleDto::from_article(article(), &StoreSettings::default());
        let json = serde_json::to_value(&dto).unwrap();
        assert!(json.get("priceLocal").is_some());
        assert!(json.get("minStock").is_some());
        assert!(json.get("lowStock").is_some());
    }
}
