//! # Database Migrations
//!
//! Versioned, embedded schema migrations.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                          │
//! │                                                                 │
//! │  Store::open                                                    │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ensure schema_migrations table exists                          │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  for each embedded migration, in version order                  │
//! │       ├── version already recorded?  skip                       │
//! │       └── otherwise: run SQL + record row, one transaction      │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each migration runs exactly once per database, recorded by version
//! in `schema_migrations`. This replaces the legacy pattern of
//! re-attempting `ALTER TABLE` on every startup and swallowing the
//! error.
//!
//! ## Adding New Migrations
//! 1. Append a `Migration` to [`MIGRATIONS`] with the next version
//! 2. **NEVER** modify an existing migration - always add a new one

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};

/// One embedded migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Initial schema: the five entities plus the key-value config table.
///
/// Layout notes:
/// - `articulos.codigo` is the business primary key (no surrogate id)
/// - brand/supplier/category references are nullable with
///   ON DELETE SET NULL: deleting a lookup never deletes articles
/// - `stock_historial.codigo` is deliberately NOT a foreign key; the
///   movement log outlives article deletion
const INITIAL_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS marcas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS proveedores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL,
    contacto TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categorias (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS articulos (
    codigo TEXT PRIMARY KEY,
    descripcion TEXT NOT NULL,
    costo REAL NOT NULL,
    ganancia REAL NOT NULL,
    iva REAL NOT NULL,
    stock INTEGER NOT NULL,
    stock_minimo INTEGER NOT NULL,
    marcaId INTEGER,
    proveedorId INTEGER,
    categoriaId INTEGER,
    imagen TEXT,
    protegido INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (marcaId) REFERENCES marcas(id) ON DELETE SET NULL,
    FOREIGN KEY (proveedorId) REFERENCES proveedores(id) ON DELETE SET NULL,
    FOREIGN KEY (categoriaId) REFERENCES categorias(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS stock_historial (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    codigo TEXT NOT NULL,
    cantidad INTEGER NOT NULL,
    tipo TEXT NOT NULL,
    fecha TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS config (
    clave TEXT PRIMARY KEY,
    valor TEXT NOT NULL
);
"#;

/// Default configuration values, written once on first initialization.
const SEED_CONFIG: &str = r#"
INSERT OR IGNORE INTO config (clave, valor) VALUES ('IVA_GLOBAL', '21');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('GANANCIA_GLOBAL', '0');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('MONEDA', 'ARS');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('ALERT_ENABLED', 'true');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('BACKGROUND_COLOR', '#F5F5F5');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('PRIMARY_COLOR', '#0078D4');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('FOREGROUND_COLOR', '#2C3E50');
INSERT OR IGNORE INTO config (clave, valor) VALUES ('COTIZACION_USD', '1000');
"#;

/// All migrations, in version order.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: INITIAL_SCHEMA,
    },
    Migration {
        version: 2,
        name: "seed_config_defaults",
        sql: SEED_CONFIG,
    },
];

/// Runs all pending migrations.
///
/// ## Safety
/// - Idempotent: safe to run multiple times
/// - Transactional: each migration + its version row commit together
/// - Ordered: migrations run in ascending version order
pub async fn run(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    for migration in MIGRATIONS {
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?1")
                .bind(migration.version)
                .fetch_optional(pool)
                .await
                .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

        if applied.is_some() {
            continue;
        }

        info!(
            version = migration.version,
            name = migration.name,
            "applying migration"
        );

        let mut tx = pool
            .begin()
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

        sqlx::raw_sql(migration.sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DbError::MigrationFailed(format!("{} ({})", e, migration.name))
            })?;

        sqlx::query("INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)")
            .bind(migration.version)
            .bind(migration.name)
            .bind(Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;
    }

    info!("all migrations applied");
    Ok(())
}

/// Returns (total embedded migrations, applied migrations).
///
/// For diagnostics and health checks.
pub async fn status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATIONS.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((total, applied as usize))
}

// =============================================================================
// Unit Tests
// =============================================================================
