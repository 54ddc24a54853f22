// src/models/catalog.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

// --- Produtos ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    #[schema(example = "Fresh Tomatoes")]
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    #[schema(value_type = String, example = "40.00")]
    pub price: Decimal,
    pub category_id: Uuid,
    pub unit_id: Uuid,
    pub available: bool,
    #[schema(value_type = Option<String>)]
    pub discount_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<Decimal>,
    pub offer_title: Option<String>,
    pub offer_description: Option<String>,
    pub offer_valid_from: Option<DateTime<Utc>>,
    pub offer_valid_until: Option<DateTime<Utc>>,
    pub is_featured: bool,
    pub stock_quantity: i32,
    pub min_order_quantity: i32,
    pub max_order_quantity: Option<i32>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registro completo de produto, usado tanto na criação quanto na gravação
/// de uma atualização já mesclada.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub price: Decimal,
    pub category_id: Uuid,
    pub unit_id: Uuid,
    pub available: bool,
    pub discount_percentage: Option<Decimal>,
    pub discount_price: Option<Decimal>,
    pub offer_title: Option<String>,
    pub offer_description: Option<String>,
    pub offer_valid_from: Option<DateTime<Utc>>,
    pub offer_valid_until: Option<DateTime<Utc>>,
    pub is_featured: bool,
    pub stock_quantity: i32,
    pub min_order_quantity: i32,
    pub max_order_quantity: Option<i32>,
    pub tags: Vec<String>,
}

impl NewProduct {
    pub fn from_existing(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            description: p.description.clone(),
            image_url: p.image_url.clone(),
            price: p.price,
            category_id: p.category_id,
            unit_id: p.unit_id,
            available: p.available,
            discount_percentage: p.discount_percentage,
            discount_price: p.discount_price,
            offer_title: p.offer_title.clone(),
            offer_description: p.offer_description.clone(),
            offer_valid_from: p.offer_valid_from,
            offer_valid_until: p.offer_valid_until,
            is_featured: p.is_featured,
            stock_quantity: p.stock_quantity,
            min_order_quantity: p.min_order_quantity,
            max_order_quantity: p.max_order_quantity,
            tags: p.tags.clone(),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    pub available: Option<bool>,
    pub is_featured: Option<bool>,
    pub category_id: Option<Uuid>,
    /// Lista separada por vírgulas; basta uma tag coincidir
    pub tags: Option<String>,
    #[param(value_type = Option<String>)]
    pub min_price: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub has_discount: Option<bool>,
}

impl ProductFilter {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    #[cfg(test)]
    pub fn matches(&self, p: &Product) -> bool {
        let tags = self.tag_list();
        self.available.is_none_or(|a| p.available == a)
            && self.is_featured.is_none_or(|f| p.is_featured == f)
            && self.category_id.is_none_or(|c| p.category_id == c)
            && (tags.is_empty() || p.tags.iter().any(|t| tags.contains(t)))
            && self.min_price.is_none_or(|min| p.price >= min)
            && self.max_price.is_none_or(|max| p.price <= max)
            && self.has_discount.is_none_or(|d| {
                let discounted = p.discount_percentage.is_some() || p.discount_price.is_some();
                discounted == d
            })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub image_url: Option<String>,
    #[schema(value_type = String, example = "40.00")]
    pub price: Decimal,
    pub category_id: Uuid,
    pub unit_id: Uuid,
    pub available: Option<bool>,
    #[schema(value_type = Option<String>)]
    pub discount_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<Decimal>,
    pub offer_title: Option<String>,
    pub offer_description: Option<String>,
    pub offer_valid_from: Option<DateTime<Utc>>,
    pub offer_valid_until: Option<DateTime<Utc>>,
    pub is_featured: Option<bool>,
    pub stock_quantity: Option<i32>,
    pub min_order_quantity: Option<i32>,
    pub max_order_quantity: Option<i32>,
    pub tags: Option<Vec<String>>,
}

impl CreateProductPayload {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            image_url: self.image_url,
            price: self.price,
            category_id: self.category_id,
            unit_id: self.unit_id,
            available: self.available.unwrap_or(true),
            discount_percentage: self.discount_percentage,
            discount_price: self.discount_price,
            offer_title: self.offer_title,
            offer_description: self.offer_description,
            offer_valid_from: self.offer_valid_from,
            offer_valid_until: self.offer_valid_until,
            is_featured: self.is_featured.unwrap_or(false),
            stock_quantity: self.stock_quantity.unwrap_or(0),
            min_order_quantity: self.min_order_quantity.unwrap_or(1),
            max_order_quantity: self.max_order_quantity,
            tags: self.tags.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub available: Option<bool>,
    #[schema(value_type = Option<String>)]
    pub discount_percentage: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub discount_price: Option<Decimal>,
    pub offer_title: Option<String>,
    pub offer_description: Option<String>,
    pub offer_valid_from: Option<DateTime<Utc>>,
    pub offer_valid_until: Option<DateTime<Utc>>,
    pub is_featured: Option<bool>,
    pub stock_quantity: Option<i32>,
    pub min_order_quantity: Option<i32>,
    pub max_order_quantity: Option<i32>,
    pub tags: Option<Vec<String>>,
}

impl UpdateProductPayload {
    /// Mescla os campos enviados sobre o registro atual.
    pub fn apply_to(self, mut base: NewProduct) -> NewProduct {
        if let Some(v) = self.name {
            base.name = v;
        }
        if let Some(v) = self.description {
            base.description = v;
        }
        if let Some(v) = self.image_url {
            base.image_url = Some(v);
        }
        if let Some(v) = self.price {
            base.price = v;
        }
        if let Some(v) = self.category_id {
            base.category_id = v;
        }
        if let Some(v) = self.unit_id {
            base.unit_id = v;
        }
        if let Some(v) = self.available {
            base.available = v;
        }
        if let Some(v) = self.discount_percentage {
            base.discount_percentage = Some(v);
        }
        if let Some(v) = self.discount_price {
            base.discount_price = Some(v);
        }
        if let Some(v) = self.offer_title {
            base.offer_title = Some(v);
        }
        if let Some(v) = self.offer_description {
            base.offer_description = Some(v);
        }
        if let Some(v) = self.offer_valid_from {
            base.offer_valid_from = Some(v);
        }
        if let Some(v) = self.offer_valid_until {
            base.offer_valid_until = Some(v);
        }
        if let Some(v) = self.is_featured {
            base.is_featured = v;
        }
        if let Some(v) = self.stock_quantity {
            base.stock_quantity = v;
        }
        if let Some(v) = self.min_order_quantity {
            base.min_order_quantity = v;
        }
        if let Some(v) = self.max_order_quantity {
            base.max_order_quantity = Some(v);
        }
        if let Some(v) = self.tags {
            base.tags = v;
        }
        base
    }
}

// --- Taxonomia (categorias e unidades) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    #[schema(example = "Vegetables")]
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: Uuid,
    #[schema(example = "Kilogram")]
    pub name: String,
    #[schema(example = "kg")]
    pub symbol: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryPayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Symbol is required"))]
    pub symbol: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUnitPayload {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "Symbol cannot be empty"))]
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActiveFilter {
    pub active: Option<bool>,
}

/// Resultado da remoção de uma categoria ou unidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeleteOutcome {
    /// Ainda referenciada por produtos: apenas desativada
    Deactivated,
    Deleted,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
    pub message: String,
}

/// Formulário do upload (só para a documentação; o handler lê o multipart).
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ImageUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "/uploads/products/product-1700000000000-123456789.jpg")]
    pub image_url: String,
}
