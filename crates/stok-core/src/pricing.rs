//! # Pricing Calculator
//!
//! The one shared sell-price computation. Every surface that displays a
//! price (article listings, the quick-action scanner, CSV export) goes
//! through [`quote`] so the formula can never drift between call sites.
//!
//! ## Formula
//! ```text
//! base    = cost * (1 + margin / 100)
//! tax     = protected ? article.tax_pct : global_tax_pct
//! local   = base * (1 + tax / 100)
//! foreign = rate > 0 ? local / rate : 0
//! ```
//!
//! The `local / rate` division is the contract: the upstream rate source
//! reports a "sell" quote and the store has always divided by it, so it
//! is preserved exactly rather than reinterpreted.

use crate::types::{Article, StoreSettings};
use crate::DEFAULT_TAX_PCT;

/// A computed sell price in local currency plus its foreign-currency
/// equivalent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    /// Final price in the store currency.
    pub local: f64,
    /// Final price divided by the exchange rate; 0 when no usable rate
    /// is configured.
    pub foreign: f64,
}

/// Coerces a possibly-NaN/infinite input to 0 so a bad stored value can
/// never surface as NaN in a displayed price.
#[inline]
fn coerce(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Computes the sell price from raw components.
///
/// ## Arguments
/// * `cost` - article cost; non-finite coerces to 0
/// * `margin_pct` - margin percent; non-finite coerces to 0
/// * `own_tax_pct` - the article's own tax percent; non-finite coerces to 0
/// * `protected` - whether `own_tax_pct` overrides the global rate
/// * `global_tax_pct` - store-wide tax percent; falls back to 21 when
///   missing, zero or invalid
/// * `exchange_rate` - foreign quote divisor; a rate <= 0 yields a
///   foreign price of 0
///
/// Negative costs or margins are not rejected here - validating what
/// gets persisted is the Article's responsibility.
pub fn quote_parts(
    cost: f64,
    margin_pct: f64,
    own_tax_pct: f64,
    protected: bool,
    global_tax_pct: f64,
    exchange_rate: f64,
) -> PriceQuote {
    let cost = coerce(cost);
    let margin = coerce(margin_pct);
    let own_tax = coerce(own_tax_pct);

    let global_tax = if global_tax_pct.is_finite() && global_tax_pct > 0.0 {
        global_tax_pct
    } else {
        DEFAULT_TAX_PCT
    };

    let tax = if protected { own_tax } else { global_tax };

    let base = cost * (1.0 + margin / 100.0);
    let local = base * (1.0 + tax / 100.0);
    let foreign = if exchange_rate.is_finite() && exchange_rate > 0.0 {
        local / exchange_rate
    } else {
        0.0
    };

    PriceQuote { local, foreign }
}

/// Computes the sell price of an article under the given settings.
///
/// ## Example
/// ```rust
/// use stok_core::{pricing::quote, Article, StoreSettings};
///
/// let article = Article {
///     code: "A-001".into(),
///     description: "Yerba 1kg".into(),
///     cost: 100.0,
///     margin_pct: 20.0,
///     tax_pct: 10.0,
///     stock: 5,
///     min_stock: 2,
///     brand_id: None,
///     supplier_id: None,
///     category_id: None,
///     image: None,
///     protected: true,
/// };
/// let settings = StoreSettings::default();
/// let price = quote(&article, &settings);
/// assert!((price.local - 132.0).abs() < 1e-9);
/// ```
pub fn quote(article: &Article, settings: &StoreSettings) -> PriceQuote {
    quote_parts(
        article.cost,
        article.margin_pct,
        article.tax_pct,
        article.protected,
        settings.global_tax_pct,
        settings.usd_rate,
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
