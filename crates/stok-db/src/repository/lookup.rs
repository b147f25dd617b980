//! # Lookup Repository
//!
//! Brands, suppliers and categories: the simple reference entities an
//! article may point at.
//!
//! ## Deletion Semantics
//! The schema declares the references with `ON DELETE SET NULL`, so
//! deleting a brand/supplier/category never deletes articles - their
//! reference just becomes NULL.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stok_core::validation::validate_name;
use stok_core::{Brand, Category, Supplier};

/// Repository for the lookup entities.
#[derive(Debug, Clone)]
pub struct LookupRepository {
    pool: SqlitePool,
}

impl LookupRepository {
    /// Creates a new LookupRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LookupRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Brands
    // -------------------------------------------------------------------------

    /// Lists all brands, alphabetically.
    pub async fn list_brands(&self) -> DbResult<Vec<Brand>> {
        let brands = sqlx::query_as::<_, Brand>(
            "SELECT id, nombre AS name FROM marcas ORDER BY nombre ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(brands)
    }

    /// Adds a brand. Returns the new id.
    pub async fn add_brand(&self, name: &str) -> DbResult<i64> {
        validate_name(name)?;

        let result = sqlx::query("INSERT INTO marcas (nombre) VALUES (?1)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;
        debug!(name, id = result.last_insert_rowid(), "brand added");
        Ok(result.last_insert_rowid())
    }

    /// Gets a brand by id.
    pub async fn get_brand(&self, id: i64) -> DbResult<Option<Brand>> {
        let brand =
            sqlx::query_as::<_, Brand>("SELECT id, nombre AS name FROM marcas WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(brand)
    }

    /// Renames a brand.
    pub async fn rename_brand(&self, id: i64, name: &str) -> DbResult<()> {
        validate_name(name)?;
        sqlx::query("UPDATE marcas SET nombre = ?1 WHERE id = ?2")
            .bind(name.trim())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes a brand; referencing articles get a NULL brand.
    pub async fn delete_brand(&self, id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM marcas WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Suppliers
    // -------------------------------------------------------------------------

    /// Lists all suppliers, alphabetically.
    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, nombre AS name, contacto AS contact FROM proveedores ORDER BY nombre ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(suppliers)
    }

    /// Adds a supplier if no supplier with that name exists yet;
    /// returns the existing id otherwise.
    pub async fn add_supplier(&self, name: &str, contact: &str) -> DbResult<i64> {
        validate_name(name)?;
        let name = name.trim();

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM proveedores WHERE nombre = ?1 LIMIT 1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(id) = existing {
            debug!(name, id, "supplier already exists");
            return Ok(id);
        }

        let result = sqlx::query("INSERT INTO proveedores (nombre, contacto) VALUES (?1, ?2)")
            .bind(name)
            .bind(contact)
            .execute(&self.pool)
            .await?;
        debug!(name, id = result.last_insert_rowid(), "supplier added");
        Ok(result.last_insert_rowid())
    }

    /// Gets a supplier by id.
    pub async fn get_supplier(&self, id: i64) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT id, nombre AS name, contacto AS contact FROM proveedores WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(supplier)
    }

    /// Updates a supplier's name and contact.
    pub async fn update_supplier(&self, id: i64, name: &str, contact: &str) -> DbResult<()> {
        validate_name(name)?;
        sqlx::query("UPDATE proveedores SET nombre = ?1, contacto = ?2 WHERE id = ?3")
            .bind(name.trim())
            .bind(contact)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deletes a supplier; referencing articles get a NULL supplier.
    pub async fn delete_supplier(&self, id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM proveedores WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// Lists all categories, alphabetically.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, nombre AS name FROM categorias ORDER BY nombre ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    /// Adds a category. Returns the new id.
    pub async fn add_category(&self, name: &str) -> DbResult<i64> {
        validate_name(name)?;

        let result = sqlx::query("INSERT INTO categorias (nombre) VALUES (?1)")
            .bind(name.trim())
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Deletes a category; referencing articles get a NULL category.
    pub async fn delete_category(&self, id: i64) -> DbResult<()> {
        sqlx::query("DELETE FROM categorias WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::store::{Store, StoreOptions};
    use stok_core::Article;

    async fn open() -> Store {
        Store::open(StoreOptions::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_brand_crud() {
        let store = open().await;
        let repo = store.lookups().unwrap();

        let id = repo.add_brand("Zeta").await.unwrap();
        repo.add_brand("Acme").await.unwrap();

        let brands = repo.list_brands().await.unwrap();
        assert_eq!(brands.len(), 2);
        // alphabetical
        assert_eq!(brands[0].name, "Acme");

        repo.rename_brand(id, "Zeta Corp").await.unwrap();
        assert_eq!(repo.get_brand(id).await.unwrap().unwrap().name, "Zeta Corp");

        repo.delete_brand(id).await.unwrap();
        assert!(repo.get_brand(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_supplier_add_if_not_exists() {
        let store = open().await;
        let repo = store.lookups().unwrap();

        let first = repo.add_supplier("Dist SA", "11-5555").await.unwrap();
        let again = repo.add_supplier("Dist SA", "other-contact").await.unwrap();
        assert_eq!(first, again);

        let suppliers = repo.list_suppliers().await.unwrap();
        assert_eq!(suppliers.len(), 1);
        // original contact wins; add-if-exists does not update
        assert_eq!(suppliers[0].contact, "11-5555");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let store = open().await;
        let repo = store.lookups().unwrap();
        assert!(repo.add_brand("  ").await.is_err());
        assert!(repo.add_supplier("", "c").await.is_err());
        assert!(repo.add_category("").await.is_err());
    }

    #[tokio::test]
    async fn test_delete_brand_nulls_article_reference() {
        let store = open().await;
        let lookups = store.lookups().unwrap();
        let articles = store.articles().unwrap();

        let brand_id = lookups.add_brand("Acme").await.unwrap();
        let article = Article {
            code: "A-1".to_string(),
            description: "test".to_string(),
            cost: 10.0,
            margin_pct: 0.0,
            tax_pct: 0.0,
            stock: 1,
            min_stock: 0,
            brand_id: Some(brand_id),
            supplier_id: None,
            category_id: None,
            image: None,
            protected: false,
        };
        articles.upsert(&article).await.unwrap();

        lookups.delete_brand(brand_id).await.unwrap();

        // article survives, reference is nulled
        let reloaded = articles.get("A-1").await.unwrap().unwrap();
        assert_eq!(reloaded.brand_id, None);
    }

    #[tokio::test]
    async fn test_category_roundtrip() {
        let store = open().await;
        let repo = store.lookups().unwrap();

        let id = repo.add_category("Bebidas").await.unwrap();
        assert_eq!(repo.list_categories().await.unwrap().len(), 1);
        repo.delete_category(id).await.unwrap();
        assert!(repo.list_categories().await.unwrap().is_empty());
    }
}
