// src/db/memory.rs

// Implementação em memória de todos os stores, usada nos testes de serviço
// e de rotas. Segue as mesmas regras de unicidade do esquema Postgres.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::traits::{AddressStore, CatalogStore, NotificationStore, OrderStore, UserStore},
    models::{
        address::{Address, NewAddress},
        auth::{NewUser, User, UserRole},
        catalog::{Category, NewProduct, Product, ProductFilter, Unit},
        notification::{NewNotification, Notification},
        order::{
            CustomerSummary, DashboardStats, NewOrder, Order, OrderDetail, OrderFilter, OrderItem,
            OrderLine, OrderStatus,
        },
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    addresses: Vec<Address>,
    categories: Vec<Category>,
    units: Vec<Unit>,
    products: Vec<Product>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    notifications: Vec<Notification>,
    // Números de pedido que devem colidir na próxima inserção
    forced_duplicates: usize,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Faz as próximas `n` inserções de pedido falharem com número duplicado.
    pub fn force_duplicate_order_numbers(&self, n: usize) {
        self.lock().forced_duplicates = n;
    }

    /// Reescreve a data de criação (testes de dashboard).
    pub fn backdate_order(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(order) = self.lock().orders.iter_mut().find(|o| o.id == id) {
            order.created_at = created_at;
        }
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn order_item_count(&self) -> usize {
        self.lock().order_items.len()
    }

    pub fn set_product_price(&self, id: Uuid, price: Decimal) {
        if let Some(p) = self.lock().products.iter_mut().find(|p| p.id == id) {
            p.price = price;
        }
    }
}

impl Tables {
    fn detail(&self, order: &Order) -> Result<OrderDetail, AppError> {
        let items = self
            .order_items
            .iter()
            .filter(|i| i.order_id == order.id)
            .map(|item| {
                let product = self.products.iter().find(|p| p.id == item.product_id);
                OrderLine {
                    item: item.clone(),
                    product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                    product_image: product.and_then(|p| p.image_url.clone()),
                }
            })
            .collect();

        let address = self
            .addresses
            .iter()
            .find(|a| a.id == order.address_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Address"))?;

        let customer = self
            .users
            .iter()
            .find(|u| u.id == order.customer_id)
            .map(|u| CustomerSummary { id: u.id, name: u.name.clone(), phone: u.phone.clone() })
            .ok_or_else(|| AppError::not_found("Customer"))?;

        Ok(OrderDetail { order: order.clone(), items, address, customer })
    }
}

// ---
// Usuários
// ---

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.phone == phone).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.phone == new_user.phone) {
            return Err(AppError::PhoneAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            phone: new_user.phone,
            password_hash: new_user.password_hash,
            name: new_user.name,
            email: new_user.email,
            role: new_user.role,
            fcm_token: None,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<Option<User>, AppError> {
        let mut t = self.lock();
        let Some(user) = t.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            user.name = name;
        }
        if email.is_some() {
            user.email = email;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_fcm_token(&self, id: Uuid, token: Option<String>) -> Result<(), AppError> {
        if let Some(user) = self.lock().users.iter_mut().find(|u| u.id == id) {
            user.fcm_token = token;
        }
        Ok(())
    }

    async fn clear_fcm_token_if(&self, id: Uuid, token: &str) -> Result<bool, AppError> {
        let mut t = self.lock();
        match t.users.iter_mut().find(|u| u.id == id) {
            Some(user) if user.fcm_token.as_deref() == Some(token) => {
                user.fcm_token = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_admins(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock().users.iter().filter(|u| u.role == UserRole::Admin).cloned().collect())
    }

    async fn latest_customer(&self) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| u.role == UserRole::Customer)
            .max_by_key(|u| u.created_at)
            .cloned())
    }
}

// ---
// Endereços
// ---

#[async_trait]
impl AddressStore for MemoryStore {
    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, AppError> {
        let mut list: Vec<Address> =
            self.lock().addresses.iter().filter(|a| a.user_id == user_id).cloned().collect();
        list.sort_by(|a, b| b.is_default.cmp(&a.is_default).then(b.created_at.cmp(&a.created_at)));
        Ok(list)
    }

    async fn find_address(&self, id: Uuid, user_id: Uuid) -> Result<Option<Address>, AppError> {
        Ok(self.lock().addresses.iter().find(|a| a.id == id && a.user_id == user_id).cloned())
    }

    async fn create_address(&self, user_id: Uuid, address: NewAddress) -> Result<Address, AppError> {
        let mut t = self.lock();
        if address.is_default {
            for a in t.addresses.iter_mut().filter(|a| a.user_id == user_id) {
                a.is_default = false;
            }
        }
        let now = Utc::now();
        let created = Address {
            id: Uuid::new_v4(),
            user_id,
            label: address.label,
            street: address.street,
            city: address.city,
            state: address.state,
            zip_code: address.zip_code,
            latitude: address.latitude,
            longitude: address.longitude,
            is_default: address.is_default,
            created_at: now,
            updated_at: now,
        };
        t.addresses.push(created.clone());
        Ok(created)
    }

    async fn save_address(
        &self,
        id: Uuid,
        user_id: Uuid,
        address: NewAddress,
    ) -> Result<Option<Address>, AppError> {
        let mut t = self.lock();
        if !t.addresses.iter().any(|a| a.id == id && a.user_id == user_id) {
            return Ok(None);
        }
        if address.is_default {
            for a in t.addresses.iter_mut().filter(|a| a.user_id == user_id && a.id != id) {
                a.is_default = false;
            }
        }
        let Some(saved) = t.addresses.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        saved.label = address.label;
        saved.street = address.street;
        saved.city = address.city;
        saved.state = address.state;
        saved.zip_code = address.zip_code;
        saved.latitude = address.latitude;
        saved.longitude = address.longitude;
        saved.is_default = address.is_default;
        saved.updated_at = Utc::now();
        Ok(Some(saved.clone()))
    }

    async fn delete_address(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        if !t.addresses.iter().any(|a| a.id == id && a.user_id == user_id) {
            return Ok(false);
        }
        if t.orders.iter().any(|o| o.address_id == id) {
            return Err(AppError::Conflict("Address is used by existing orders".into()));
        }
        t.addresses.retain(|a| a.id != id);
        Ok(true)
    }

    async fn make_default(&self, id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        if !t.addresses.iter().any(|a| a.id == id && a.user_id == user_id) {
            return Ok(false);
        }
        for a in t.addresses.iter_mut().filter(|a| a.user_id == user_id) {
            a.is_default = a.id == id;
        }
        Ok(true)
    }
}

// ---
// Catálogo
// ---

fn product_from(id: Uuid, p: NewProduct, created_at: DateTime<Utc>) -> Product {
    Product {
        id,
        name: p.name,
        description: p.description,
        image_url: p.image_url,
        price: p.price,
        category_id: p.category_id,
        unit_id: p.unit_id,
        available: p.available,
        discount_percentage: p.discount_percentage,
        discount_price: p.discount_price,
        offer_title: p.offer_title,
        offer_description: p.offer_description,
        offer_valid_from: p.offer_valid_from,
        offer_valid_until: p.offer_valid_until,
        is_featured: p.is_featured,
        stock_quantity: p.stock_quantity,
        min_order_quantity: p.min_order_quantity,
        max_order_quantity: p.max_order_quantity,
        tags: p.tags,
        created_at,
        updated_at: Utc::now(),
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_product(&self, product: NewProduct) -> Result<Product, AppError> {
        let mut t = self.lock();
        if !t.categories.iter().any(|c| c.id == product.category_id)
            || !t.units.iter().any(|u| u.id == product.unit_id)
        {
            return Err(AppError::not_found("Category or unit"));
        }
        let created = product_from(Uuid::new_v4(), product, Utc::now());
        t.products.push(created.clone());
        Ok(created)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        let mut list: Vec<Product> =
            self.lock().products.iter().filter(|p| filter.matches(p)).cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn find_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.lock().products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        Ok(self.lock().products.iter().filter(|p| ids.contains(&p.id)).cloned().collect())
    }

    async fn save_product(&self, id: Uuid, product: NewProduct) -> Result<Option<Product>, AppError> {
        let mut t = self.lock();
        let Some(slot) = t.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        *slot = product_from(id, product, slot.created_at);
        Ok(Some(slot.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        if t.order_items.iter().any(|i| i.product_id == id) {
            return Err(AppError::Conflict(
                "Product has order history; mark it unavailable instead".into(),
            ));
        }
        let before = t.products.len();
        t.products.retain(|p| p.id != id);
        Ok(t.products.len() < before)
    }

    async fn create_category(&self, name: &str, description: Option<&str>) -> Result<Category, AppError> {
        let mut t = self.lock();
        if t.categories.iter().any(|c| c.name == name) {
            return Err(AppError::Conflict("Category already exists".into()));
        }
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn list_categories(&self, active: Option<bool>) -> Result<Vec<Category>, AppError> {
        let mut list: Vec<Category> = self
            .lock()
            .categories
            .iter()
            .filter(|c| active.is_none_or(|a| c.is_active == a))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn find_category(&self, id: Uuid) -> Result<Option<Category>, AppError> {
        Ok(self.lock().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn save_category(&self, category: &Category) -> Result<Category, AppError> {
        let mut t = self.lock();
        if t.categories.iter().any(|c| c.name == category.name && c.id != category.id) {
            return Err(AppError::Conflict("Category already exists".into()));
        }
        let slot = t
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or_else(|| AppError::not_found("Category"))?;
        *slot = Category { updated_at: Utc::now(), ..category.clone() };
        Ok(slot.clone())
    }

    async fn count_products_in_category(&self, id: Uuid) -> Result<i64, AppError> {
        Ok(self.lock().products.iter().filter(|p| p.category_id == id).count() as i64)
    }

    async fn delete_category(&self, id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        let before = t.categories.len();
        t.categories.retain(|c| c.id != id);
        Ok(t.categories.len() < before)
    }

    async fn create_unit(
        &self,
        name: &str,
        symbol: &str,
        description: Option<&str>,
    ) -> Result<Unit, AppError> {
        let mut t = self.lock();
        if t.units.iter().any(|u| u.name == name) {
            return Err(AppError::Conflict("Unit already exists".into()));
        }
        let now = Utc::now();
        let unit = Unit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            description: description.map(str::to_string),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        t.units.push(unit.clone());
        Ok(unit)
    }

    async fn list_units(&self, active: Option<bool>) -> Result<Vec<Unit>, AppError> {
        let mut list: Vec<Unit> = self
            .lock()
            .units
            .iter()
            .filter(|u| active.is_none_or(|a| u.is_active == a))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn find_unit(&self, id: Uuid) -> Result<Option<Unit>, AppError> {
        Ok(self.lock().units.iter().find(|u| u.id == id).cloned())
    }

    async fn save_unit(&self, unit: &Unit) -> Result<Unit, AppError> {
        let mut t = self.lock();
        if t.units.iter().any(|u| u.name == unit.name && u.id != unit.id) {
            return Err(AppError::Conflict("Unit already exists".into()));
        }
        let slot = t
            .units
            .iter_mut()
            .find(|u| u.id == unit.id)
            .ok_or_else(|| AppError::not_found("Unit"))?;
        *slot = Unit { updated_at: Utc::now(), ..unit.clone() };
        Ok(slot.clone())
    }

    async fn count_products_with_unit(&self, id: Uuid) -> Result<i64, AppError> {
        Ok(self.lock().products.iter().filter(|p| p.unit_id == id).count() as i64)
    }

    async fn delete_unit(&self, id: Uuid) -> Result<bool, AppError> {
        let mut t = self.lock();
        let before = t.units.len();
        t.units.retain(|u| u.id != id);
        Ok(t.units.len() < before)
    }
}

// ---
// Pedidos
// ---

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, new_order: NewOrder) -> Result<OrderDetail, AppError> {
        let mut t = self.lock();

        if t.forced_duplicates > 0 {
            t.forced_duplicates -= 1;
            return Err(AppError::DuplicateOrderNumber);
        }
        if t.orders.iter().any(|o| o.order_number == new_order.order_number) {
            return Err(AppError::DuplicateOrderNumber);
        }

        // Mesmas chaves estrangeiras do esquema, checadas antes de gravar
        let known: HashSet<Uuid> = t.products.iter().map(|p| p.id).collect();
        if new_order.pricing.lines.iter().any(|l| !known.contains(&l.product_id))
            || !t.addresses.iter().any(|a| a.id == new_order.address_id)
        {
            return Err(AppError::not_found("Product or address"));
        }

        let now = Utc::now();
        let pricing = new_order.pricing;
        let order = Order {
            id: Uuid::new_v4(),
            order_number: new_order.order_number,
            customer_id: new_order.customer_id,
            address_id: new_order.address_id,
            subtotal: pricing.subtotal,
            delivery_fee: pricing.delivery_fee,
            tax: pricing.tax,
            total: pricing.total,
            status: OrderStatus::Placed,
            payment_method: new_order.payment_method,
            notes: new_order.notes,
            estimated_delivery_time: Some(new_order.estimated_delivery_time),
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };

        for line in pricing.lines {
            t.order_items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
                created_at: now,
            });
        }
        t.orders.push(order.clone());
        t.detail(&order)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let t = self.lock();
        match t.orders.iter().find(|o| o.id == id) {
            Some(order) => Ok(Some(t.detail(order)?)),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderDetail>, AppError> {
        let t = self.lock();
        let mut orders: Vec<&Order> = t
            .orders
            .iter()
            .filter(|o| filter.customer_id.is_none_or(|c| o.customer_id == c))
            .filter(|o| filter.status.is_none_or(|s| o.status == s))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.into_iter().map(|o| t.detail(o)).collect()
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Order>, AppError> {
        let mut t = self.lock();
        match t.orders.iter_mut().find(|o| o.id == id && o.status == from) {
            Some(order) => {
                order.status = to;
                order.delivered_at = delivered_at;
                order.updated_at = Utc::now();
                Ok(Some(order.clone()))
            }
            None => Ok(None),
        }
    }

    async fn dashboard_stats(&self, since: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        let t = self.lock();
        let live = || t.orders.iter().filter(|o| o.status != OrderStatus::Cancelled);
        let today = || live().filter(|o| o.created_at >= since);

        Ok(DashboardStats {
            today_orders: today().count() as i64,
            total_orders: live().count() as i64,
            pending_orders: t
                .orders
                .iter()
                .filter(|o| OrderStatus::PENDING.contains(&o.status))
                .count() as i64,
            today_revenue: today().map(|o| o.total).sum(),
        })
    }
}

// ---
// Notificações
// ---

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, n: NewNotification) -> Result<Notification, AppError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: n.user_id,
            title: n.title,
            body: n.body,
            kind: n.kind,
            order_id: n.order_id,
            read: false,
            created_at: Utc::now(),
        };
        self.lock().notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid, limit: i64) -> Result<Vec<Notification>, AppError> {
        let t = self.lock();
        // Ordem de inserção desempata timestamps iguais
        let mut list: Vec<Notification> = t
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(list)
    }

    async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }

    async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        let mut t = self.lock();
        let mut updated = 0;
        for n in t.notifications.iter_mut().filter(|n| n.id == id && n.user_id == user_id) {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        let mut t = self.lock();
        let mut updated = 0;
        for n in t.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.read) {
            n.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}
