//! # Configuration Repository
//!
//! The flat key→value `config` table plus the typed
//! [`StoreSettings`] view over it.
//!
//! ## Parsing Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  key missing or value unparseable  →  per-key default           │
//! │                                                                 │
//! │  IVA_GLOBAL        "21"       → 21.0                            │
//! │  GANANCIA_GLOBAL   "0"        → 0.0                             │
//! │  MONEDA            "ARS"                                        │
//! │  ALERT_ENABLED     "true"     → true                            │
//! │  BACKGROUND_COLOR  "#F5F5F5"                                    │
//! │  PRIMARY_COLOR     "#0078D4"                                    │
//! │  FOREGROUND_COLOR  "#2C3E50"                                    │
//! │  COTIZACION_USD    "1000"     → 1000.0                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A bad stored value never propagates: loading settings always yields
//! a usable struct, the way the original config service fell back on
//! parse failure.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stok_core::StoreSettings;

// Configuration keys (legacy names are the persisted contract).
pub const KEY_GLOBAL_TAX: &str = "IVA_GLOBAL";
pub const KEY_GLOBAL_MARGIN: &str = "GANANCIA_GLOBAL";
pub const KEY_CURRENCY: &str = "MONEDA";
pub const KEY_ALERTS: &str = "ALERT_ENABLED";
pub const KEY_BACKGROUND: &str = "BACKGROUND_COLOR";
pub const KEY_PRIMARY: &str = "PRIMARY_COLOR";
pub const KEY_FOREGROUND: &str = "FOREGROUND_COLOR";
pub const KEY_USD_RATE: &str = "COTIZACION_USD";

/// Repository for key-value configuration.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    /// Creates a new ConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// Reads a raw configuration value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT valor FROM config WHERE clave = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(value)
    }

    /// Writes a raw configuration value (insert-or-replace).
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query("INSERT OR REPLACE INTO config (clave, valor) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Loads the typed settings, applying per-key defaults for missing
    /// or unparseable values.
    pub async fn load(&self) -> DbResult<StoreSettings> {
        let defaults = StoreSettings::default();

        let settings = StoreSettings {
            global_tax_pct: self
                .get_f64(KEY_GLOBAL_TAX)
                .await?
                .unwrap_or(defaults.global_tax_pct),
            global_margin_pct: self
                .get_f64(KEY_GLOBAL_MARGIN)
                .await?
                .unwrap_or(defaults.global_margin_pct),
            currency: self
                .get(KEY_CURRENCY)
                .await?
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.currency),
            alerts_enabled: match self.get(KEY_ALERTS).await? {
                Some(v) => v.eq_ignore_ascii_case("true"),
                None => defaults.alerts_enabled,
            },
            background_color: self
                .get(KEY_BACKGROUND)
                .await?
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.background_color),
            primary_color: self
                .get(KEY_PRIMARY)
                .await?
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.primary_color),
            foreground_color: self
                .get(KEY_FOREGROUND)
                .await?
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.foreground_color),
            usd_rate: self
                .get_f64(KEY_USD_RATE)
                .await?
                .unwrap_or(defaults.usd_rate),
        };

        Ok(settings)
    }

    /// Persists every settings field.
    pub async fn save(&self, settings: &StoreSettings) -> DbResult<()> {
        debug!("saving store settings");

        self.set(KEY_GLOBAL_TAX, &settings.global_tax_pct.to_string())
            .await?;
        self.set(KEY_GLOBAL_MARGIN, &settings.global_margin_pct.to_string())
            .await?;
        self.set(KEY_CURRENCY, &settings.currency).await?;
        self.set(KEY_ALERTS, &settings.alerts_enabled.to_string())
            .await?;
        self.set(KEY_BACKGROUND, &settings.background_color).await?;
        self.set(KEY_PRIMARY, &settings.primary_color).await?;
        self.set(KEY_FOREGROUND, &settings.foreground_color).await?;
        self.set(KEY_USD_RATE, &settings.usd_rate.to_string())
            .await?;

        Ok(())
    }

    /// Stores a freshly fetched USD exchange rate.
    pub async fn set_usd_rate(&self, rate: f64) -> DbResult<()> {
        self.set(KEY_USD_RATE, &rate.to_string()).await
    }

    async fn get_f64(&self, key: &str) -> DbResult<Option<f64>> {
        Ok(self
            .get(key)
            .await?
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Store, StoreOptions};

    async fn open() -> Store {
        Store::open(StoreOptions::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_seeded_defaults_load() {
        let store = open().await;
        let config = store.config().unwrap();

        let settings = config.load().await.unwrap();
        assert_eq!(settings, StoreSettings::default());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let store = open().await;
        let config = store.config().unwrap();

        let mut settings = StoreSettings::default();
        settings.global_tax_pct = 10.5;
        settings.currency = "USD".to_string();
        settings.alerts_enabled = false;
        settings.usd_rate = 1234.5;

        config.save(&settings).await.unwrap();
        assert_eq!(config.load().await.unwrap(), settings);
    }

    #[tokio::test]
    async fn test_unparseable_value_falls_back() {
        let store = open().await;
        let config = store.config().unwrap();

        config.set(KEY_GLOBAL_TAX, "not-a-number").await.unwrap();
        config.set(KEY_USD_RATE, "").await.unwrap();

        let settings = config.load().await.unwrap();
        assert_eq!(settings.global_tax_pct, 21.0);
        assert_eq!(settings.usd_rate, 1000.0);
    }

    #[tokio::test]
    async fn test_set_usd_rate() {
        let store = open().await;
        let config = store.config().unwrap();

        config.set_usd_rate(1475.0).await.unwrap();
        assert_eq!(config.load().await.unwrap().usd_rate, 1475.0);
    }

    #[tokio::test]
    async fn test_raw_get_missing_key() {
        let store = open().await;
        let config = store.config().unwrap();
        assert_eq!(config.get("NO_SUCH_KEY").await.unwrap(), None);
    }
}
