// src/services/catalog_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::CatalogStore,
    models::catalog::{
        Category, CategoryPayload, CreateProductPayload, DeleteOutcome, DeleteResponse, NewProduct,
        Product, ProductFilter, Unit, UnitPayload, UpdateCategoryPayload, UpdateProductPayload,
        UpdateUnitPayload,
    },
    services::image_store::ImageStore,
};

/// Regras de um produto completo; vale para criação e para o registro já
/// mesclado de uma atualização.
fn validate_product(p: &NewProduct) -> Result<(), AppError> {
    if p.price <= Decimal::ZERO {
        return Err(AppError::invalid("Price must be greater than 0"));
    }
    if let Some(pct) = p.discount_percentage {
        if pct < Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
            return Err(AppError::invalid("Discount percentage must be between 0 and 100"));
        }
    }
    if p.discount_price.is_some_and(|d| d < Decimal::ZERO) {
        return Err(AppError::invalid("Discount price cannot be negative"));
    }
    if p.stock_quantity < 0 {
        return Err(AppError::invalid("Stock quantity cannot be negative"));
    }
    if p.min_order_quantity < 1 || p.max_order_quantity.is_some_and(|max| max < 1) {
        return Err(AppError::invalid("Order quantity limits must be at least 1"));
    }
    if let (Some(from), Some(until)) = (p.offer_valid_from, p.offer_valid_until) {
        if from >= until {
            return Err(AppError::invalid("Offer start date must be before end date"));
        }
    }
    Ok(())
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    images: ImageStore,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, images: ImageStore) -> Self {
        Self { catalog, images }
    }

    // ---
    // Produtos
    // ---

    pub async fn create_product(&self, payload: CreateProductPayload) -> Result<Product, AppError> {
        let product = payload.into_new_product();
        validate_product(&product)?;
        let created = self.catalog.create_product(product).await?;
        tracing::info!(product_id = %created.id, name = %created.name, "Produto criado");
        Ok(created)
    }

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.catalog.list_products(filter).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog.find_product(id).await?.ok_or_else(|| AppError::not_found("Product"))
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        payload: UpdateProductPayload,
    ) -> Result<Product, AppError> {
        let current = self.get_product(id).await?;
        let merged = payload.apply_to(NewProduct::from_existing(&current));
        validate_product(&merged)?;

        let replaced_image = current.image_url.clone().filter(|old| merged.image_url.as_ref() != Some(old));
        let saved = self
            .catalog
            .save_product(id, merged)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))?;

        if let Some(old) = replaced_image {
            self.images.remove(&old).await;
        }
        Ok(saved)
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        let product = self.get_product(id).await?;
        if !self.catalog.delete_product(id).await? {
            return Err(AppError::not_found("Product"));
        }
        if let Some(url) = product.image_url.as_deref() {
            self.images.remove(url).await;
        }
        tracing::info!(product_id = %id, "Produto removido");
        Ok(())
    }

    pub async fn upload_image(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        self.images.save_product_image(file_name, content_type, data).await
    }

    // ---
    // Categorias
    // ---

    pub async fn create_category(&self, payload: CategoryPayload) -> Result<Category, AppError> {
        self.catalog
            .create_category(payload.name.trim(), payload.description.as_deref())
            .await
    }

    pub async fn list_categories(&self, active: Option<bool>) -> Result<Vec<Category>, AppError> {
        self.catalog.list_categories(active).await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, AppError> {
        self.catalog.find_category(id).await?.ok_or_else(|| AppError::not_found("Category"))
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        payload: UpdateCategoryPayload,
    ) -> Result<Category, AppError> {
        let mut category = self.get_category(id).await?;
        if let Some(name) = payload.name {
            category.name = name.trim().to_string();
        }
        if let Some(description) = payload.description {
            category.description = Some(description);
        }
        if let Some(is_active) = payload.is_active {
            category.is_active = is_active;
        }
        self.catalog.save_category(&category).await
    }

    /// Desativa quando há produtos na categoria; senão remove de vez.
    pub async fn delete_category(&self, id: Uuid) -> Result<DeleteResponse, AppError> {
        let mut category = self.get_category(id).await?;
        let in_use = self.catalog.count_products_in_category(id).await?;

        if in_use > 0 {
            category.is_active = false;
            self.catalog.save_category(&category).await?;
            return Ok(DeleteResponse {
                outcome: DeleteOutcome::Deactivated,
                message: format!("Category is used by {in_use} product(s) and was deactivated"),
            });
        }

        if !self.catalog.delete_category(id).await? {
            return Err(AppError::not_found("Category"));
        }
        Ok(DeleteResponse {
            outcome: DeleteOutcome::Deleted,
            message: "Category deleted".to_string(),
        })
    }

    // ---
    // Unidades
    // ---

    pub async fn create_unit(&self, payload: UnitPayload) -> Result<Unit, AppError> {
        self.catalog
            .create_unit(payload.name.trim(), payload.symbol.trim(), payload.description.as_deref())
            .await
    }

    pub async fn list_units(&self, active: Option<bool>) -> Result<Vec<Unit>, AppError> {
        self.catalog.list_units(active).await
    }

    pub async fn get_unit(&self, id: Uuid) -> Result<Unit, AppError> {
        self.catalog.find_unit(id).await?.ok_or_else(|| AppError::not_found("Unit"))
    }

    pub async fn update_unit(&self, id: Uuid, payload: UpdateUnitPayload) -> Result<Unit, AppError> {
        let mut unit = self.get_unit(id).await?;
        if let Some(name) = payload.name {
            unit.name = name.trim().to_string();
        }
        if let Some(symbol) = payload.symbol {
            unit.symbol = symbol.trim().to_string();
        }
        if let Some(description) = payload.description {
            unit.description = Some(description);
        }
        if let Some(is_active) = payload.is_active {
            unit.is_active = is_active;
        }
        self.catalog.save_unit(&unit).await
    }

    pub async fn delete_unit(&self, id: Uuid) -> Result<DeleteResponse, AppError> {
        let mut unit = self.get_unit(id).await?;
        let in_use = self.catalog.count_products_with_unit(id).await?;

        if in_use > 0 {
            unit.is_active = false;
            self.catalog.save_unit(&unit).await?;
            return Ok(DeleteResponse {
                outcome: DeleteOutcome::Deactivated,
                message: format!("Unit is used by {in_use} product(s) and was deactivated"),
            });
        }

        if !self.catalog.delete_unit(id).await? {
            return Err(AppError::not_found("Unit"));
        }
        Ok(DeleteResponse { outcome: DeleteOutcome::Deleted, message: "Unit deleted".to_string() })
    }
}
