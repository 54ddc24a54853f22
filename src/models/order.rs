// src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    address::{Address, AddressPayload},
    auth::User,
};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Placed,
    Confirmed,
    Processing,
    Prepared,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Status em que o pedido ainda aguarda ação da loja.
    pub const PENDING: [OrderStatus; 3] = [
        OrderStatus::Placed,
        OrderStatus::Confirmed,
        OrderStatus::Processing,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Posição no fluxo de entrega. CANCELLED fica fora da sequência.
    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Placed => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Processing => Some(2),
            OrderStatus::Prepared => Some(3),
            OrderStatus::OutForDelivery => Some(4),
            OrderStatus::Delivered => Some(5),
            OrderStatus::Cancelled => None,
        }
    }

    /// Estados terminais não têm saída. O fluxo só anda para frente (pular
    /// etapas é permitido) e qualquer estado ativo pode ser cancelado.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => target > current,
            (None, Some(_)) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Prepared => "PREPARED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cod,
    Card,
    Upi,
}

// --- Entidades ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(example = "ORD-261018-143015-042000142")]
    pub order_number: String,
    pub customer_id: Uuid,
    pub address_id: Uuid,
    #[schema(value_type = String, example = "200")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "50")]
    pub delivery_fee: Decimal,
    #[schema(value_type = String, example = "10.00")]
    pub tax: Decimal,
    #[schema(value_type = String, example = "260.00")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    // Preço congelado na criação do pedido
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Item com os dados de exibição do produto.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
    pub product_image: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLine>,
    pub address: Address,
    pub customer: CustomerSummary,
}

// --- Precificação ---

/// Linha já precificada: o preço resolvido é o mesmo que vai para o banco.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Tudo que é gravado atomicamente na criação de um pedido.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub customer_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub estimated_delivery_time: DateTime<Utc>,
    pub pricing: PriceBreakdown,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub customer_id: Option<Uuid>,
    pub status: Option<OrderStatus>,
}

// --- Payloads ---

/// Maior quantidade aceita por item.
pub const MAX_ITEM_QUANTITY: i32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: Uuid,
    #[validate(range(
        min = 1,
        max = MAX_ITEM_QUANTITY,
        message = "Quantity must be between 1 and 10000"
    ))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    #[validate(length(min = 1, message = "Order must have at least one item"), nested)]
    pub items: Vec<OrderItemPayload>,
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderPayload {
    #[validate(length(min = 10, max = 20, message = "Phone number must have at least 10 digits"))]
    pub phone: String,
    pub name: Option<String>,
    #[validate(nested)]
    pub address: Option<AddressPayload>,
    pub address_id: Option<Uuid>,
    #[validate(length(min = 1, message = "Order must have at least one item"), nested)]
    pub items: Vec<OrderItemPayload>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub fcm_token: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderResponse {
    pub order: OrderDetail,
    pub user: User,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusFilter {
    pub status: Option<OrderStatus>,
}

// --- Dashboard ---

#[derive(Debug, Clone, PartialEq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub today_orders: i64,
    pub total_orders: i64,
    pub pending_orders: i64,
    #[schema(value_type = String)]
    pub today_revenue: Decimal,
}
