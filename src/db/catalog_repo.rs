// src/db/catalog_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{is_foreign_key_violation, unique_violation},
        error::AppError,
    },
    db::traits::CatalogStore,
    models::catalog::{Category, NewProduct, Product, ProductFilter, Unit},
};

const PRODUCT_COLUMNS: &str = "id, name, description, image_url, price, category_id, unit_id, \
     available, discount_percentage, discount_price, offer_title, offer_description, \
     offer_valid_from, offer_valid_until, is_featured, stock_quantity, min_order_quantity, \
     max_order_quantity, tags, created_at, updated_at";

const CATEGORY_COLUMNS: &str = "id, name, description, is_active, created_at, updated_at";
const UNIT_COLUMNS: &str = "id, name, symbol, description, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_catalog_error(e: sqlx::Error) -> AppError {
    match unique_violation(&e).as_deref() {
        Some("categories_name_key") => AppError::Conflict("Category already exists".into()),
        Some("units_name_key") => AppError::Conflict("Unit already exists".into()),
        Some(other) => AppError::Conflict(format!("Duplicate value ({other})")),
        None if is_foreign_key_violation(&e) => {
            AppError::not_found("Category or unit")
        }
        None => e.into(),
    }
}

#[async_trait]
impl CatalogStore for CatalogRepository {
    // ---
    // Produtos
    // ---

    async fn create_product(&self, p: NewProduct) -> Result<Product, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                name, description, image_url, price, category_id, unit_id, available,
                discount_percentage, discount_price, offer_title, offer_description,
                offer_valid_from, offer_valid_until, is_featured, stock_quantity,
                min_order_quantity, max_order_quantity, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&p.name)
        .bind(&p.description)
        .bind(&p.image_url)
        .bind(p.price)
        .bind(p.category_id)
        .bind(p.unit_id)
        .bind(p.available)
        .bind(p.discount_percentage)
        .bind(p.discount_price)
        .bind(&p.offer_title)
        .bind(&p.offer_description)
        .bind(p.offer_valid_from)
        .bind(p.offer_valid_until)
        .bind(p.is_featured)
        .bind(p.stock_quantity)
        .bind(p.min_order_quantity)
        .bind(p.max_order_quantity)
        .bind(&p.tags)
        .fetch_one(&self.pool)
        .await
        .map_err(map_catalog_error)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let tags = filter.tag_list();
        let tags = (!tags.is_empty()).then_some(tags);

        // Filtros opcionais: parâmetro NULL desliga a condição
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1::bool IS NULL OR available = $1)
              AND ($2::bool IS NULL OR is_featured = $2)
              AND ($3::uuid IS NULL OR category_id = $3)
              AND ($4::text[] IS NULL OR tags && $4)
              AND ($5::numeric IS NULL OR price >= $5)
              AND ($6::numeric IS NULL OR price <= $6)
              AND ($7::bool IS NULL OR
                   (discount_percentage IS NOT NULL OR discount_price IS NOT NULL) = $7)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.available)
        .bind(filter.is_featured)
        .bind(filter.category_id)
        .bind(tags)
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(filter.has_discount)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    async fn save_product(&self, id: Uuid, p: NewProduct) -> Result<Option<Product>, AppError> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                name = $2, description = $3, image_url = $4, price = $5, category_id = $6,
                unit_id = $7, available = $8, discount_percentage = $9, discount_price = $10,
                offer_title = $11, offer_description = $12, offer_valid_from = $13,
                offer_valid_until = $14, is_featured = $15, stock_quantity = $16,
                min_order_quantity = $17, max_order_quantity = $18, tags = $19,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&p.name)
        .bind(&p.description)
        .bind(&p.image_url)
        .bind(p.price)
        .bind(p.category_id)
        .bind(p.unit_id)
        .bind(p.available)
        .bind(p.discount_percentage)
        .bind(p.discount_price)
        .bind(&p.offer_title)
        .bind(&p.offer_description)
        .bind(p.offer_valid_from)
        .bind(p.offer_valid_until)
        .bind(p.is_featured)
        .bind(p.stock_quantity)
        .bind(p.min_order_quantity)
        .bind(p.max_order_quantity)
        .bind(&p.tags)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_catalog_error)
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict(
                        "Product has order history; mark it unavailable instead".into(),
                    )
                } else {
                    e.into()
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Categorias
    // ---

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_catalog_error)
    }

    async fn list_categories(&self, active: Option<bool>) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            r#"
            SELECT {CATEGORY_COLUMNS} FROM categories
            WHERE ($1::bool IS NULL OR is_active = $1)
            ORDER BY name
            "#
        ))
        .bind(active)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn save_category(&self, category: &Category) -> Result<Category, AppError> {
        sqlx::query_as::<_, Category>(&format!(
            r#"
            UPDATE categories
            SET name = $2, description = $3, is_active = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_catalog_error)?
        .ok_or_else(|| AppError::not_found("Category"))
    }

    async fn count_products_in_category(&self, id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict("Category is referenced by products".into())
                } else {
                    e.into()
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    // ---
    // Unidades
    // ---

    async fn create_unit(
        &self,
        name: &str,
        symbol: &str,
        description: Option<&str>,
    ) -> Result<Unit, AppError> {
        sqlx::query_as::<_, Unit>(&format!(
            r#"
            INSERT INTO units (name, symbol, description) VALUES ($1, $2, $3)
            RETURNING {UNIT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(symbol)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_catalog_error)
    }

    async fn list_units(&self, active: Option<bool>) -> Result<Vec<Unit>, AppError> {
        let units = sqlx::query_as::<_, Unit>(&format!(
            r#"
            SELECT {UNIT_COLUMNS} FROM units
            WHERE ($1::bool IS NULL OR is_active = $1)
            ORDER BY name
            "#
        ))
        .bind(active)
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }

    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError> {
        let unit = sqlx::query_as::<_, Unit>(&format!("SELECT {UNIT_COLUMNS} FROM units WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(unit)
    }

    async fn save_unit(&self, unit: &Unit) -> Result<Unit, AppError> {
        sqlx::query_as::<_, Unit>(&format!(
            r#"
            UPDATE units
            SET name = $2, symbol = $3, description = $4, is_active = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {UNIT_COLUMNS}
            "#
        ))
        .bind(unit.id)
        .bind(&unit.name)
        .bind(&unit.symbol)
        .bind(&unit.description)
        .bind(unit.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_catalog_error)?
        .ok_or_else(|| AppError::not_found("Unit"))
    }

    async fn count_products_with_unit(&self, id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE unit_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn delete_unit(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM units WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::Conflict("Unit is referenced by products".into())
                } else {
                    e.into()
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}
