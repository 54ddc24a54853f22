// src/db/traits.rs

// Fronteira de persistência. Os serviços dependem destes traits e não do
// Postgres diretamente; os testes usam a implementação em memória.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        address::{Address, NewAddress},
        auth::{NewUser, User},
        catalog::{Category, NewProduct, Product, ProductFilter, Unit},
        notification::{NewNotification, Notification},
        order::{DashboardStats, NewOrder, Order, OrderDetail, OrderFilter, OrderStatus},
    },
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError>;
    /// `PhoneAlreadyExists` se o telefone já estiver cadastrado.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;
    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<User>, AppError>;
    async fn set_fcm_token(&self, id: Uuid, token: Option<String>) -> Result<(), AppError>;
    /// Limpa o token só se ele ainda for o informado (não apaga um token novo).
    async fn clear_fcm_token_if(&self, id: Uuid, token: &str) -> Result<bool, AppError>;
    async fn list_admins(&self) -> Result<Vec<User>, AppError>;
    async fn latest_customer(&self) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Padrão primeiro, depois os mais novos.
    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, AppError>;
    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>, AppError>;
    /// Se `is_default`, desmarca os outros na mesma transação.
    async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<Address, AppError>;
    async fn save_address(
        &self,
        id: Uuid,
        user_id: Uuid,
        address: NewAddress,
    ) -> Result<Option<Address>, AppError>;
    /// `false` se não existir para o usuário; `Conflict` se algum pedido o usa.
    async fn delete_address(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
    /// Troca o endereço padrão atomicamente. `false` se não pertencer ao usuário.
    async fn make_default(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_product(&self, product: NewProduct) -> Result<Product, AppError>;
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError>;
    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError>;
    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError>;
    async fn save_product(&self, id: Uuid, product: NewProduct) -> Result<Option<Product>, AppError>;
    /// `Conflict` quando o produto já aparece em pedidos.
    async fn delete_product(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, AppError>;
    async fn list_categories(&self, active: Option<bool>) -> Result<Vec<Category>, AppError>;
    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError>;
    async fn save_category(&self, category: &Category) -> Result<Category, AppError>;
    async fn count_products_in_category(&self, id: Uuid) -> Result<i64, AppError>;
    async fn delete_category(&self, id: Uuid) -> Result<bool, AppError>;

    async fn create_unit(
        &self,
        name: &str,
        symbol: &str,
        description: Option<&str>,
    ) -> Result<Unit, AppError>;
    async fn list_units(&self, active: Option<bool>) -> Result<Vec<Unit>, AppError>;
    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError>;
    async fn save_unit(&self, unit: &Unit) -> Result<Unit, AppError>;
    async fn count_products_with_unit(&self, id: Uuid) -> Result<i64, AppError>;
    async fn delete_unit(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Grava pedido e itens numa única transação.
    /// `DuplicateOrderNumber` se o número colidir.
    async fn insert_order(&self, order: NewOrder) -> Result<OrderDetail, AppError>;
    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError>;
    /// Mais novos primeiro.
    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderDetail>, AppError>;
    /// Compare-and-set: só grava se o status atual ainda for `from`.
    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Order>, AppError>;
    async fn dashboard_stats(&self, since: DateTime<Utc>) -> Result<DashboardStats, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: NewNotification) -> Result<Notification, AppError>;
    /// Mais novas primeiro, no máximo `limit`.
    async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, AppError>;
    async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError>;
    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<u64, AppError>;
    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError>;
}
