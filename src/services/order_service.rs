// src/services/order_service.rs

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    common::{error::AppError, phone::normalize_phone, tasks::BackgroundTasks},
    db::{AddressStore, CatalogStore, OrderStore, UserStore},
    models::{
        auth::{NewUser, User, UserRole},
        order::{
            CreateOrderPayload, DashboardStats, GuestOrderPayload, GuestOrderResponse, NewOrder,
            Order, OrderDetail, OrderFilter, OrderItemPayload, OrderStatus, PaymentMethod,
            PriceBreakdown,
        },
    },
    services::{
        notification_service::NotificationService,
        order_number::OrderNumberGenerator,
        pricing::price_order,
        realtime::{RealtimeEvent, RealtimeHub},
    },
};

/// Tentativas de gravação quando o número de pedido colide.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// Previsão de entrega a partir da criação.
const ESTIMATED_DELIVERY_MINUTES: i64 = 60;

#[derive(Clone)]
pub struct OrderService {
    users: Arc<dyn UserStore>,
    addresses: Arc<dyn AddressStore>,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    notifications: NotificationService,
    realtime: RealtimeHub,
    tasks: BackgroundTasks,
    numbers: Arc<OrderNumberGenerator>,
}

impl OrderService {
    pub fn new(
        users: Arc<dyn UserStore>,
        addresses: Arc<dyn AddressStore>,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        notifications: NotificationService,
        realtime: RealtimeHub,
        tasks: BackgroundTasks,
    ) -> Self {
        Self {
            users,
            addresses,
            catalog,
            orders,
            notifications,
            realtime,
            tasks,
            numbers: Arc::new(OrderNumberGenerator::new()),
        }
    }

    // ---
    // Criação
    // ---

    pub async fn create_order(
        &self,
        customer_id: Uuid,
        payload: CreateOrderPayload,
    ) -> Result<OrderDetail, AppError> {
        if payload.items.is_empty() {
            return Err(AppError::invalid("Order must have at least one item"));
        }

        let customer = self
            .users
            .find_user(customer_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        // Endereço de outro usuário é tratado como inexistente
        if self.addresses.find_address(payload.address_id, customer.id).await?.is_none() {
            return Err(AppError::not_found("Address"));
        }

        self.register_device(&customer, payload.fcm_token.as_deref()).await?;

        let pricing = self.quote(&payload.items).await?;
        self.place(&customer, payload.address_id, pricing, payload.payment_method, payload.notes)
            .await
    }

    /// Pedido por telefone, sem sessão. Reaproveita o cliente do telefone
    /// (em qualquer formato) ou cria um novo, sem senha.
    pub async fn create_guest_order(
        &self,
        payload: GuestOrderPayload,
    ) -> Result<GuestOrderResponse, AppError> {
        let phone = normalize_phone(&payload.phone);
        if phone.len() < 10 {
            return Err(AppError::invalid("Phone number must have at least 10 digits"));
        }

        // Precifica antes de criar qualquer registro
        let pricing = self.quote(&payload.items).await?;

        let user = match self.users.find_user_by_phone(&phone).await? {
            Some(user) => user,
            None => self.create_guest_customer(&phone, &payload).await?,
        };

        self.register_device(&user, payload.fcm_token.as_deref()).await?;

        let address_id = match (payload.address_id, payload.address) {
            (Some(address_id), _) => {
                if !self.addresses.make_default(address_id, user.id).await? {
                    return Err(AppError::not_found("Address"));
                }
                address_id
            }
            (None, Some(address)) => {
                let mut new_address = address.into_new_address();
                new_address.is_default = true;
                self.addresses.create_address(user.id, new_address).await?.id
            }
            (None, None) => return Err(AppError::invalid("Address is required")),
        };

        let order = self
            .place(&user, address_id, pricing, payload.payment_method, payload.notes)
            .await?;

        Ok(GuestOrderResponse { order, user })
    }

    async fn create_guest_customer(
        &self,
        phone: &str,
        payload: &GuestOrderPayload,
    ) -> Result<User, AppError> {
        let name = payload
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::invalid("Name is required for new customers"))?;

        if payload.address.is_none() {
            return Err(AppError::invalid("Address is required for new customers"));
        }

        let created = self
            .users
            .create_user(NewUser {
                phone: phone.to_string(),
                password_hash: None,
                name: name.to_string(),
                email: None,
                role: UserRole::Customer,
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Cliente criado por pedido de convidado");
                Ok(user)
            }
            // Outra requisição criou o mesmo telefone no meio do caminho
            Err(AppError::PhoneAlreadyExists) => self
                .users
                .find_user_by_phone(phone)
                .await?
                .ok_or(AppError::PhoneAlreadyExists),
            Err(e) => Err(e),
        }
    }

    async fn register_device(&self, user: &User, token: Option<&str>) -> Result<(), AppError> {
        match token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) if user.fcm_token.as_deref() != Some(token) => {
                self.users.set_fcm_token(user.id, Some(token.to_string())).await
            }
            _ => Ok(()),
        }
    }

    /// Lê os produtos uma única vez e precifica com esse mesmo retrato do
    /// catálogo; é ele que vira o snapshot dos itens.
    async fn quote(&self, items: &[OrderItemPayload]) -> Result<PriceBreakdown, AppError> {
        if items.is_empty() {
            return Err(AppError::invalid("Order must have at least one item"));
        }

        let ids: Vec<Uuid> = items
            .iter()
            .map(|i| i.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let products = self.catalog.find_products(&ids).await?;

        price_order(items, &products)
    }

    async fn place(
        &self,
        customer: &User,
        address_id: Uuid,
        pricing: PriceBreakdown,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<OrderDetail, AppError> {
        let mut attempt = 0;
        let detail = loop {
            attempt += 1;
            let new_order = NewOrder {
                order_number: self.numbers.next(),
                customer_id: customer.id,
                address_id,
                payment_method,
                notes: notes.clone(),
                estimated_delivery_time: Utc::now() + Duration::minutes(ESTIMATED_DELIVERY_MINUTES),
                pricing: pricing.clone(),
            };

            match self.orders.insert_order(new_order).await {
                Ok(detail) => break detail,
                Err(AppError::DuplicateOrderNumber) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    tracing::warn!(attempt, "Número de pedido repetido, gerando outro");
                }
                Err(e) => return Err(e),
            }
        };

        let order = &detail.order;
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            "🛒 Pedido criado"
        );

        self.realtime
            .emit_new_order_to_admins(RealtimeEvent::new_order(order, &customer.name));
        self.notify_placed(order.clone(), customer.name.clone());

        Ok(detail)
    }

    /// As duas notificações rodam em tarefas separadas; a resposta não
    /// espera por elas e a falha de uma não afeta a outra.
    fn notify_placed(&self, order: Order, customer_name: String) {
        let notifications = self.notifications.clone();
        let placed = order.clone();
        self.tasks.spawn("order_placed_notification", async move {
            if let Err(e) = notifications.send_order_status_notification(&placed).await {
                tracing::warn!(order_id = %placed.id, "Falha ao notificar o cliente: {}", e);
            }
        });

        let notifications = self.notifications.clone();
        self.tasks.spawn("new_order_admin_notification", async move {
            match notifications.send_new_order_notification_to_admins(&order, &customer_name).await {
                Ok(count) => tracing::debug!(order_id = %order.id, admins = count, "Admins notificados"),
                Err(e) => tracing::warn!(order_id = %order.id, "Falha ao notificar admins: {}", e),
            }
        });
    }

    // ---
    // Status
    // ---

    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<OrderDetail, AppError> {
        let detail = self.orders.find_order(id).await?.ok_or_else(|| AppError::not_found("Order"))?;
        self.transition(detail.order, status).await
    }

    /// Só o dono cancela, e só enquanto o pedido não terminou.
    pub async fn cancel(&self, id: Uuid, requester_id: Uuid) -> Result<OrderDetail, AppError> {
        let detail = self
            .orders
            .find_order(id)
            .await?
            .filter(|d| d.order.customer_id == requester_id)
            .ok_or_else(|| AppError::not_found("Order"))?;

        if detail.order.status.is_terminal() {
            return Err(AppError::InvalidTransition(format!(
                "Order cannot be cancelled once {}",
                detail.order.status
            )));
        }

        self.transition(detail.order, OrderStatus::Cancelled).await
    }

    async fn transition(&self, order: Order, next: OrderStatus) -> Result<OrderDetail, AppError> {
        if !order.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition(format!(
                "Cannot change order status from {} to {}",
                order.status, next
            )));
        }

        let delivered_at = (next == OrderStatus::Delivered).then(Utc::now);

        // Compare-and-set: perde se outra requisição mudou o status antes
        let updated = self
            .orders
            .transition_status(order.id, order.status, next, delivered_at)
            .await?
            .ok_or_else(|| {
                AppError::InvalidTransition("Order status was changed by another request".into())
            })?;

        tracing::info!(
            order_id = %updated.id,
            from = %order.status,
            to = %updated.status,
            "Status do pedido alterado"
        );

        // A mudança já está gravada; falha de notificação só vai para o log
        if let Err(e) = self.notifications.send_order_status_notification(&updated).await {
            tracing::warn!(order_id = %updated.id, "Falha ao notificar mudança de status: {}", e);
        }
        self.realtime
            .emit_order_status_change(updated.customer_id, RealtimeEvent::status_changed(&updated));

        self.orders
            .find_order(updated.id)
            .await?
            .ok_or_else(|| AppError::not_found("Order"))
    }

    // ---
    // Leitura
    // ---

    pub async fn get_user_orders(&self, customer_id: Uuid) -> Result<Vec<OrderDetail>, AppError> {
        self.orders
            .list_orders(OrderFilter { customer_id: Some(customer_id), status: None })
            .await
    }

    pub async fn get_all_orders(&self, status: Option<OrderStatus>) -> Result<Vec<OrderDetail>, AppError> {
        self.orders.list_orders(OrderFilter { customer_id: None, status }).await
    }

    /// Admin vê qualquer pedido; cliente só os próprios (os outros são 404).
    pub async fn get_order_for(
        &self,
        id: Uuid,
        requester_id: Uuid,
        is_admin: bool,
    ) -> Result<OrderDetail, AppError> {
        self.orders
            .find_order(id)
            .await?
            .filter(|d| is_admin || d.order.customer_id == requester_id)
            .ok_or_else(|| AppError::not_found("Order"))
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        self.orders.dashboard_stats(start_of_local_day(Local::now())).await
    }
}

/// Meia-noite local de hoje, em UTC.
fn start_of_local_day(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(Local)
        .earliest()
        .map(|midnight| midnight.with_timezone(&Utc))
        // Meia-noite inexistente (horário de verão): conta desde agora
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::{
            address::{AddressPayload, NewAddress, UpdateAddressPayload},
            catalog::NewProduct,
            notification::NotificationType,
        },
        services::{address_service::AddressService, push::testing::RecordingPush},
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct Fixture {
        store: Arc<MemoryStore>,
        push: Arc<RecordingPush>,
        realtime: RealtimeHub,
        tasks: BackgroundTasks,
        service: OrderService,
        notifications: NotificationService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let push = Arc::new(RecordingPush::new());
        let notifications = NotificationService::new(store.clone(), store.clone(), Some(push.clone()));
        let realtime = RealtimeHub::new();
        let tasks = BackgroundTasks::new();
        let service = OrderService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifications.clone(),
            realtime.clone(),
            tasks.clone(),
        );
        Fixture { store, push, realtime, tasks, service, notifications }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn user(store: &MemoryStore, phone: &str, role: UserRole) -> User {
        store
            .create_user(NewUser {
                phone: phone.into(),
                password_hash: None,
                name: format!("User {phone}"),
                email: None,
                role,
            })
            .await
            .unwrap()
    }

    fn address_payload() -> AddressPayload {
        AddressPayload {
            label: None,
            street: "12 MG Road".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip_code: "411001".into(),
            latitude: None,
            longitude: None,
            is_default: None,
        }
    }

    async fn address(store: &MemoryStore, user_id: Uuid, is_default: bool) -> Uuid {
        let mut new_address: NewAddress = address_payload().into_new_address();
        new_address.is_default = is_default;
        store.create_address(user_id, new_address).await.unwrap().id
    }

    async fn product(store: &MemoryStore, name: &str, price: &str, available: bool) -> Uuid {
        let category = store.create_category(&format!("cat-{name}"), None).await.unwrap();
        let unit = store.create_unit(&format!("unit-{name}"), "kg", None).await.unwrap();
        store
            .create_product(NewProduct {
                name: name.into(),
                description: String::new(),
                image_url: None,
                price: dec(price),
                category_id: category.id,
                unit_id: unit.id,
                available,
                discount_percentage: Some(dec("10")),
                discount_price: None,
                offer_title: None,
                offer_description: None,
                offer_valid_from: None,
                offer_valid_until: None,
                is_featured: false,
                stock_quantity: 100,
                min_order_quantity: 1,
                max_order_quantity: None,
                tags: vec![],
            })
            .await
            .unwrap()
            .id
    }

    fn item(product_id: Uuid, quantity: i32) -> OrderItemPayload {
        OrderItemPayload { product_id, quantity }
    }

    fn order_payload(items: Vec<OrderItemPayload>, address_id: Uuid) -> CreateOrderPayload {
        CreateOrderPayload {
            items,
            address_id,
            payment_method: PaymentMethod::Cod,
            notes: None,
            fcm_token: None,
        }
    }

    fn guest_payload(phone: &str, items: Vec<OrderItemPayload>) -> GuestOrderPayload {
        GuestOrderPayload {
            phone: phone.into(),
            name: Some("Guest".into()),
            address: Some(address_payload()),
            address_id: None,
            items,
            payment_method: PaymentMethod::Upi,
            notes: None,
            fcm_token: None,
        }
    }

    #[tokio::test]
    async fn totals_follow_the_fixed_fee_and_tax() {
        let f = fixture();
        let customer = user(&f.store, "9000000001", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let tomato = product(&f.store, "Tomato", "40.50", true).await;
        let milk = product(&f.store, "Milk", "29.99", true).await;

        let detail = f
            .service
            .create_order(customer.id, order_payload(vec![item(tomato, 2), item(milk, 3)], addr))
            .await
            .unwrap();

        let order = &detail.order;
        // 81.00 + 89.97; o desconto do produto não é aplicado
        assert_eq!(order.subtotal, dec("170.97"));
        assert_eq!(order.delivery_fee, dec("50"));
        assert_eq!(order.tax, dec("8.5485"));
        assert_eq!(order.total, order.subtotal + dec("50") + order.subtotal * dec("0.05"));
        assert_eq!(order.status, OrderStatus::Placed);
        assert_eq!(detail.items.len(), 2);
        assert!(order.estimated_delivery_time.unwrap() > order.created_at);
    }

    #[tokio::test]
    async fn unavailable_or_unknown_products_leave_nothing_behind() {
        let f = fixture();
        let customer = user(&f.store, "9000000002", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let fresh = product(&f.store, "Fresh", "10", true).await;
        let gone = product(&f.store, "Gone", "10", false).await;

        let err = f
            .service
            .create_order(customer.id, order_payload(vec![item(fresh, 1), item(gone, 1)], addr))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProductUnavailable(_)));

        let err = f
            .service
            .create_order(customer.id, order_payload(vec![item(fresh, 1), item(Uuid::new_v4(), 1)], addr))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));

        assert_eq!(f.store.order_count(), 0);
        assert_eq!(f.store.order_item_count(), 0);
    }

    #[tokio::test]
    async fn empty_orders_and_foreign_addresses_are_rejected() {
        let f = fixture();
        let customer = user(&f.store, "9000000003", UserRole::Customer).await;
        let stranger = user(&f.store, "9000000004", UserRole::Customer).await;
        let foreign = address(&f.store, stranger.id, true).await;
        let p = product(&f.store, "P", "10", true).await;

        let err = f.service.create_order(customer.id, order_payload(vec![], foreign)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = f
            .service
            .create_order(customer.id, order_payload(vec![item(p, 1)], foreign))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn later_price_changes_do_not_touch_placed_orders() {
        let f = fixture();
        let customer = user(&f.store, "9000000005", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Mango", "100", true).await;

        let placed = f.service.create_order(customer.id, order_payload(vec![item(p, 2)], addr)).await.unwrap();
        f.store.set_product_price(p, dec("999"));

        let reloaded = f.service.get_order_for(placed.order.id, customer.id, false).await.unwrap();
        assert_eq!(reloaded.items[0].item.unit_price, dec("100"));
        assert_eq!(reloaded.items[0].item.subtotal, dec("200"));
        assert_eq!(reloaded.order.subtotal, dec("200"));
    }

    #[tokio::test]
    async fn background_notifications_reach_customer_and_admins() {
        let f = fixture();
        let customer = user(&f.store, "9000000006", UserRole::Customer).await;
        let admin = user(&f.store, "9000000007", UserRole::Admin).await;
        f.store.set_fcm_token(admin.id, Some("admin-device".into())).await.unwrap();
        let mut admin_session = f.realtime.connect(admin.id, true);
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Bread", "30", true).await;

        let mut payload = order_payload(vec![item(p, 1)], addr);
        payload.fcm_token = Some("customer-device".into());
        let detail = f.service.create_order(customer.id, payload).await.unwrap();

        f.tasks.wait_idle().await;

        let mine = f.notifications.list(customer.id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title, "Order Placed");
        assert_eq!(mine[0].kind, NotificationType::OrderStatus);
        assert_eq!(mine[0].order_id, Some(detail.order.id));

        let theirs = f.notifications.list(admin.id).await.unwrap();
        assert_eq!(theirs[0].body, format!("Order #{} from {}", detail.order.order_number, customer.name));

        assert_eq!(f.push.sent_to("customer-device"), 1);
        assert_eq!(f.push.sent_to("admin-device"), 1);

        let event = admin_session.admin_events.as_mut().unwrap().recv().await.unwrap();
        assert!(matches!(event, RealtimeEvent::NewOrder(e) if e.order_id == detail.order.id));
    }

    #[tokio::test]
    async fn failing_customer_push_does_not_stop_admin_notifications() {
        let f = fixture();
        let customer = user(&f.store, "9000000008", UserRole::Customer).await;
        let admin = user(&f.store, "9000000009", UserRole::Admin).await;
        f.store.set_fcm_token(customer.id, Some("broken".into())).await.unwrap();
        f.push.mark_failing("broken");
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Eggs", "60", true).await;

        f.service.create_order(customer.id, order_payload(vec![item(p, 1)], addr)).await.unwrap();
        f.tasks.wait_idle().await;

        assert_eq!(f.notifications.list(customer.id).await.unwrap().len(), 1);
        assert_eq!(f.notifications.list(admin.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_order_numbers_are_retried() {
        let f = fixture();
        let customer = user(&f.store, "9000000010", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Rice", "55", true).await;

        f.store.force_duplicate_order_numbers(2);
        assert!(f.service.create_order(customer.id, order_payload(vec![item(p, 1)], addr)).await.is_ok());

        f.store.force_duplicate_order_numbers(ORDER_NUMBER_ATTEMPTS);
        let err = f
            .service
            .create_order(customer.id, order_payload(vec![item(p, 1)], addr))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateOrderNumber));
        assert_eq!(f.store.order_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_orders_get_distinct_numbers() {
        let f = fixture();
        let customer = user(&f.store, "9000000011", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Salt", "20", true).await;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let service = f.service.clone();
                let payload = order_payload(vec![item(p, 1)], addr);
                tokio::spawn(async move { service.create_order(customer.id, payload).await })
            })
            .collect();

        let mut numbers = HashSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap().unwrap().order.order_number);
        }
        assert_eq!(numbers.len(), 20);
    }

    #[tokio::test]
    async fn cancel_is_owner_only_and_not_after_the_end() {
        let f = fixture();
        let customer = user(&f.store, "9000000012", UserRole::Customer).await;
        let other = user(&f.store, "9000000013", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Curd", "35", true).await;

        let first = f.service.create_order(customer.id, order_payload(vec![item(p, 1)], addr)).await.unwrap();
        let id = first.order.id;

        assert!(matches!(f.service.cancel(id, other.id).await, Err(AppError::ResourceNotFound(_))));

        let cancelled = f.service.cancel(id, customer.id).await.unwrap();
        assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
        assert!(f
            .notifications
            .list(customer.id)
            .await
            .unwrap()
            .iter()
            .any(|n| n.body == format!("Your order #{} has been cancelled", first.order.order_number)));

        assert!(matches!(f.service.cancel(id, customer.id).await, Err(AppError::InvalidTransition(_))));

        let second = f.service.create_order(customer.id, order_payload(vec![item(p, 1)], addr)).await.unwrap();
        f.service.update_status(second.order.id, OrderStatus::Delivered).await.unwrap();
        assert!(matches!(
            f.service.cancel(second.order.id, customer.id).await,
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn delivered_at_is_only_set_on_delivery() {
        let f = fixture();
        let customer = user(&f.store, "9000000014", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Paneer", "80", true).await;
        let mut session = f.realtime.connect(customer.id, false);

        let placed = f.service.create_order(customer.id, order_payload(vec![item(p, 1)], addr)).await.unwrap();
        let id = placed.order.id;

        for status in [OrderStatus::Confirmed, OrderStatus::Processing, OrderStatus::OutForDelivery] {
            let updated = f.service.update_status(id, status).await.unwrap();
            assert_eq!(updated.order.status, status);
            assert!(updated.order.delivered_at.is_none());
        }

        assert!(matches!(
            f.service.update_status(id, OrderStatus::Processing).await,
            Err(AppError::InvalidTransition(_))
        ));

        let delivered = f.service.update_status(id, OrderStatus::Delivered).await.unwrap();
        assert!(delivered.order.delivered_at.is_some());

        assert!(matches!(
            f.service.update_status(id, OrderStatus::Confirmed).await,
            Err(AppError::InvalidTransition(_))
        ));
        assert!(matches!(
            f.service.update_status(Uuid::new_v4(), OrderStatus::Confirmed).await,
            Err(AppError::ResourceNotFound(_))
        ));

        // Um evento de tempo real por transição aceita
        let mut seen = 0;
        while let Ok(event) = session.events.try_recv() {
            assert!(matches!(event, RealtimeEvent::OrderStatusChanged(_)));
            seen += 1;
        }
        assert_eq!(seen, 4);
    }

    #[tokio::test]
    async fn dashboard_ignores_cancelled_orders() {
        let f = fixture();
        let customer = user(&f.store, "9000000015", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let cheap = product(&f.store, "Cheap", "50", true).await;
        let pricier = product(&f.store, "Pricier", "100", true).await;

        let kept = f.service.create_order(customer.id, order_payload(vec![item(pricier, 1)], addr)).await.unwrap();
        let dropped = f.service.create_order(customer.id, order_payload(vec![item(cheap, 1)], addr)).await.unwrap();
        f.service.cancel(dropped.order.id, customer.id).await.unwrap();

        let old = f.service.create_order(customer.id, order_payload(vec![item(cheap, 1)], addr)).await.unwrap();
        f.store.backdate_order(old.order.id, Utc::now() - Duration::days(3));

        let stats = f.service.dashboard_stats().await.unwrap();
        assert_eq!(stats.today_orders, 1);
        assert_eq!(stats.today_revenue, kept.order.total);
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.pending_orders, 2);
    }

    #[tokio::test]
    async fn guest_orders_reuse_the_customer_across_phone_formats() {
        let f = fixture();
        let p = product(&f.store, "Onion", "25", true).await;

        let first = f
            .service
            .create_guest_order(guest_payload("+91 98765-43210", vec![item(p, 1)]))
            .await
            .unwrap();
        assert_eq!(first.user.phone, "9876543210");
        assert!(first.user.password_hash.is_none());

        let mut again = guest_payload("098765 43210", vec![item(p, 2)]);
        again.name = None;
        again.address = None;
        again.address_id = Some(first.order.address.id);
        let second = f.service.create_guest_order(again).await.unwrap();

        assert_eq!(second.user.id, first.user.id);
        assert_eq!(f.service.get_user_orders(first.user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn inline_guest_address_becomes_the_only_default() {
        let f = fixture();
        let existing = user(&f.store, "9876543210", UserRole::Customer).await;
        address(&f.store, existing.id, true).await;
        let p = product(&f.store, "Garlic", "15", true).await;

        let placed = f
            .service
            .create_guest_order(guest_payload("9876543210", vec![item(p, 1)]))
            .await
            .unwrap();

        let addresses = f.store.list_addresses(existing.id).await.unwrap();
        let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();
        assert_eq!(addresses.len(), 2);
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, placed.order.address.id);
    }

    #[tokio::test]
    async fn new_guests_need_a_name_and_an_address() {
        let f = fixture();
        let p = product(&f.store, "Lime", "5", true).await;

        let mut nameless = guest_payload("9111111111", vec![item(p, 1)]);
        nameless.name = None;
        assert!(matches!(f.service.create_guest_order(nameless).await, Err(AppError::InvalidInput(_))));

        let mut homeless = guest_payload("9111111111", vec![item(p, 1)]);
        homeless.address = None;
        assert!(matches!(f.service.create_guest_order(homeless).await, Err(AppError::InvalidInput(_))));

        // Nada foi criado pelas tentativas rejeitadas
        assert!(f.store.find_user_by_phone("9111111111").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn customers_only_see_their_own_orders() {
        let f = fixture();
        let alice = user(&f.store, "9000000020", UserRole::Customer).await;
        let bob = user(&f.store, "9000000021", UserRole::Customer).await;
        let addr = address(&f.store, alice.id, true).await;
        let p = product(&f.store, "Tea", "120", true).await;

        let order = f.service.create_order(alice.id, order_payload(vec![item(p, 1)], addr)).await.unwrap();

        assert!(matches!(
            f.service.get_order_for(order.order.id, bob.id, false).await,
            Err(AppError::ResourceNotFound(_))
        ));
        assert!(f.service.get_order_for(order.order.id, bob.id, true).await.is_ok());
        assert!(f.service.get_user_orders(bob.id).await.unwrap().is_empty());
        assert_eq!(f.service.get_all_orders(Some(OrderStatus::Placed)).await.unwrap().len(), 1);
        assert!(f.service.get_all_orders(Some(OrderStatus::Delivered)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn orders_follow_later_address_edits_and_pin_the_address() {
        let f = fixture();
        let addresses = AddressService::new(f.store.clone());
        let customer = user(&f.store, "9000000022", UserRole::Customer).await;
        let addr = address(&f.store, customer.id, true).await;
        let p = product(&f.store, "Curd", "30", true).await;

        let order = f.service.create_order(customer.id, order_payload(vec![item(p, 2)], addr)).await.unwrap();

        let edit = UpdateAddressPayload { street: Some("7 FC Road".into()), ..Default::default() };
        addresses.update(addr, customer.id, edit).await.unwrap();

        let fetched = f.service.get_order_for(order.order.id, customer.id, false).await.unwrap();
        assert_eq!(fetched.address.street, "7 FC Road");

        assert!(matches!(
            addresses.delete(addr, customer.id).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(addresses.list(customer.id).await.unwrap().len(), 1);
    }

    #[test]
    fn local_midnight_is_not_after_now() {
        let now = Local::now();
        let midnight = start_of_local_day(now);
        assert!(midnight <= now.with_timezone(&Utc));
        assert!(now.with_timezone(&Utc) - midnight < Duration::hours(25));
    }
}
