//! # USD Exchange-Rate Refresh
//!
//! Best-effort fetch of the informal ("blue") USD/ARS sell rate from
//! the public dolarapi.com endpoint, persisted into the store's
//! configuration for foreign-price display.
//!
//! ## Failure Policy
//! The rate is cosmetic, so a failed refresh must never fail the
//! request: network errors, bad payloads and nonsense rates all log a
//! warning and leave the stored rate untouched. Only a storage failure
//! while persisting a good rate is a real error.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::ApiResult;
use stok_db::ConfigRepository;

/// Public quote endpoint for the informal USD/ARS rate.
pub const BLUE_RATE_URL: &str = "https://dolarapi.com/v1/dolares/blue";

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The fields we read from the quote payload; the sell price is what a
/// customer would pay, so that is the display rate.
#[derive(Debug, Deserialize)]
struct BlueQuote {
    venta: f64,
}

/// A rate must be a positive finite number to be worth storing.
fn usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Fetches the current blue rate and stores it.
///
/// Returns the new rate, or `None` when the fetch failed and the
/// previously stored rate remains in effect.
pub async fn refresh_usd_rate(config: &ConfigRepository) -> ApiResult<Option<f64>> {
    refresh_from(config, BLUE_RATE_URL).await
}

async fn refresh_from(config: &ConfigRepository, url: &str) -> ApiResult<Option<f64>> {
    let rate = match fetch_rate(url).await {
        Ok(rate) => rate,
        Err(err) => {
            warn!(%err, "exchange-rate fetch failed; keeping stored rate");
            return Ok(None);
        }
    };

    if !usable_rate(rate) {
        warn!(rate, "exchange-rate endpoint returned an unusable rate");
        return Ok(None);
    }

    config.set_usd_rate(rate).await?;
    info!(rate, "usd exchange rate refreshed");
    Ok(Some(rate))
}

async fn fetch_rate(url: &str) -> Result<f64, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let quote: BlueQuote = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(quote.venta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_payload_parses() {
        // shape of the real endpoint response
        let payload = r#"{
            "moneda": "USD",
            "casa": "blue",
            "nombre": "Blue",
            "compra": 1400,
            "venta": 1450,
            "fechaActualizacion": "2026-08-25T12:00:00.000Z"
        }"#;
        let quote: BlueQuote = serde_json::from_str(payload).unwrap();
        assert_eq!(quote.venta, 1450.0);
    }

    #[test]
    fn test_usable_rate_bounds() {
        assert!(usable_rate(1450.0));
        assert!(!usable_rate(0.0));
        assert!(!usable_rate(-1.0));
        assert!(!usable_rate(f64::NAN));
        assert!(!usable_rate(f64::INFINITY));
    }
}
