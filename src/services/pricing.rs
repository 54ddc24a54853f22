// src/services/pricing.rs

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        catalog::Product,
        order::{MAX_ITEM_QUANTITY, OrderItemPayload, PriceBreakdown, PricedLine},
    },
};

/// Taxa de entrega fixa por pedido.
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Imposto sobre o subtotal (5%).
pub const TAX_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Maior valor que as colunas NUMERIC(14, 4) do pedido comportam (9999999999.9999).
pub const MAX_ORDER_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 4);

/// Precifica um pedido a partir dos produtos já carregados do catálogo.
///
/// Cada linha guarda o preço resolvido aqui, e é esse mesmo valor que vai
/// para o banco como snapshot. Campos de desconto do produto não entram no
/// cálculo.
pub fn price_order(
    items: &[OrderItemPayload],
    products: &[Product],
) -> Result<PriceBreakdown, AppError> {
    if items.is_empty() {
        return Err(AppError::invalid("Order must have at least one item"));
    }

    let catalog: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(AppError::invalid("Quantity must be at least 1"));
        }
        if item.quantity > MAX_ITEM_QUANTITY {
            return Err(AppError::invalid("Quantity must be between 1 and 10000"));
        }

        let product = catalog
            .get(&item.product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {}", item.product_id)))?;

        if !product.available {
            return Err(AppError::ProductUnavailable(product.name.clone()));
        }

        lines.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            quantity: item.quantity,
            unit_price: product.price,
            subtotal: product.price * Decimal::from(item.quantity),
        });
    }

    let subtotal: Decimal = lines.iter().map(|l| l.subtotal).sum();
    let tax = subtotal * TAX_RATE;
    let total = subtotal + DELIVERY_FEE + tax;
    if total > MAX_ORDER_AMOUNT {
        return Err(AppError::invalid("Order total is too large"));
    }

    Ok(PriceBreakdown { lines, subtotal, delivery_fee: DELIVERY_FEE, tax, total })
}
