// src/services/notification_service.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{NotificationStore, UserStore},
    models::{
        auth::User,
        notification::{NewNotification, Notification, NotificationType},
        order::{Order, OrderStatus},
    },
    services::push::{PushError, PushMessage, PushSender},
};

/// Máximo de notificações devolvidas na listagem.
pub const NOTIFICATION_LIST_LIMIT: i64 = 50;

/// Título e corpo da notificação de cada status.
pub fn status_message(status: OrderStatus, order_number: &str) -> (&'static str, String) {
    let title = match status {
        OrderStatus::Placed => "Order Placed",
        _ => "Order Update",
    };

    let body = match status {
        OrderStatus::Placed => format!("Your order #{order_number} has been placed successfully"),
        OrderStatus::Confirmed => {
            format!("Your order #{order_number} has been confirmed and is being processed")
        }
        OrderStatus::Processing => format!("We're preparing your order #{order_number}"),
        OrderStatus::Prepared => {
            format!("Your order #{order_number} is ready and will be delivered soon")
        }
        OrderStatus::OutForDelivery => format!("Your order #{order_number} is on the way!"),
        OrderStatus::Delivered => format!("Your order #{order_number} has been delivered. Enjoy!"),
        OrderStatus::Cancelled => format!("Your order #{order_number} has been cancelled"),
    };

    (title, body)
}

#[derive(Clone)]
pub struct NotificationService {
    users: Arc<dyn UserStore>,
    notifications: Arc<dyn NotificationStore>,
    // None quando as credenciais do Firebase não foram configuradas
    push: Option<Arc<dyn PushSender>>,
}

impl NotificationService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notifications: Arc<dyn NotificationStore>,
        push: Option<Arc<dyn PushSender>>,
    ) -> Self {
        Self { users, notifications, push }
    }

    /// Grava a notificação e tenta o push. O registro no banco é a fonte da
    /// verdade: falhas de push só são logadas.
    pub async fn create_notification(
        &self,
        user_id: Uuid,
        title: &str,
        body: &str,
        kind: NotificationType,
        order_id: Option<Uuid>,
    ) -> Result<Notification, AppError> {
        let notification = self
            .notifications
            .insert_notification(NewNotification {
                user_id,
                title: title.to_string(),
                body: body.to_string(),
                kind,
                order_id,
            })
            .await?;

        if let Some(push) = &self.push {
            match self.users.find_user(user_id).await {
                Ok(Some(user)) => self.deliver_push(push.as_ref(), &user, &notification).await,
                Ok(None) => {}
                Err(e) => tracing::warn!(%user_id, "Falha ao buscar token de push: {}", e),
            }
        }

        Ok(notification)
    }

    async fn deliver_push(&self, push: &dyn PushSender, user: &User, notification: &Notification) {
        let Some(token) = user.fcm_token.as_deref() else {
            return;
        };

        let mut data = HashMap::from([
            ("notificationId".to_string(), notification.id.to_string()),
            ("type".to_string(), notification.kind.as_str().to_string()),
        ]);
        if let Some(order_id) = notification.order_id {
            data.insert("orderId".to_string(), order_id.to_string());
        }

        let message = PushMessage {
            token: token.to_string(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            data,
        };

        match push.send(&message).await {
            Ok(()) => tracing::info!(user_id = %user.id, "📲 Push entregue"),
            Err(PushError::Unregistered) => {
                // Token morto: limpa para não tentar de novo
                tracing::warn!(user_id = %user.id, "Token de push inválido, removendo");
                if let Err(e) = self.users.clear_fcm_token_if(user.id, token).await {
                    tracing::warn!(user_id = %user.id, "Falha ao limpar token de push: {}", e);
                }
            }
            Err(e) => tracing::warn!(user_id = %user.id, "Falha no envio de push: {}", e),
        }
    }

    pub async fn send_order_status_notification(
        &self,
        order: &Order,
    ) -> Result<Notification, AppError> {
        let (title, body) = status_message(order.status, &order.order_number);
        self.create_notification(
            order.customer_id,
            title,
            &body,
            NotificationType::OrderStatus,
            Some(order.id),
        )
        .await
    }

    /// Notifica cada admin isoladamente; a falha de um não impede os outros.
    /// Retorna quantos foram notificados.
    pub async fn send_new_order_notification_to_admins(
        &self,
        order: &Order,
        customer_name: &str,
    ) -> Result<usize, AppError> {
        let admins = self.users.list_admins().await?;
        let body = format!("Order #{} from {}", order.order_number, customer_name);

        let mut delivered = 0;
        for admin in admins {
            match self
                .create_notification(
                    admin.id,
                    "🔔 New Order Received!",
                    &body,
                    NotificationType::OrderStatus,
                    Some(order.id),
                )
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => tracing::warn!(admin_id = %admin.id, "Falha ao notificar admin: {}", e),
            }
        }

        Ok(delivered)
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Notification>, AppError> {
        self.notifications.list_notifications(user_id, NOTIFICATION_LIST_LIMIT).await
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64, AppError> {
        self.notifications.unread_count(user_id).await
    }

    /// Sem efeito (e sem erro) se a notificação não existir ou for de outro usuário.
    pub async fn mark_as_read(&self, id: Uuid, user_id: Uuid) -> Result<u64, AppError> {
        self.notifications.mark_read(id, user_id).await
    }

    pub async fn mark_all_as_read(&self, user_id: Uuid) -> Result<u64, AppError> {
        self.notifications.mark_all_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryStore,
        models::auth::{NewUser, UserRole},
        services::push::testing::RecordingPush,
    };

    struct Fixture {
        store: Arc<MemoryStore>,
        push: Arc<RecordingPush>,
        service: NotificationService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let push = Arc::new(RecordingPush::new());
        let service = NotificationService::new(store.clone(), store.clone(), Some(push.clone()));
        Fixture { store, push, service }
    }

    async fn user_with_token(store: &MemoryStore, phone: &str, role: UserRole, token: &str) -> User {
        let user = store
            .create_user(NewUser {
                phone: phone.into(),
                password_hash: None,
                name: format!("User {phone}"),
                email: None,
                role,
            })
            .await
            .unwrap();
        store.set_fcm_token(user.id, Some(token.into())).await.unwrap();
        user
    }

    fn sample_order() -> Order {
        let now = chrono::Utc::now();
        Order {
            id: Uuid::new_v4(),
            order_number: "ORD-261018-101500-000142".into(),
            customer_id: Uuid::new_v4(),
            address_id: Uuid::new_v4(),
            subtotal: rust_decimal::Decimal::from(100),
            delivery_fee: rust_decimal::Decimal::from(50),
            tax: rust_decimal::Decimal::from(5),
            total: rust_decimal::Decimal::from(155),
            status: OrderStatus::Placed,
            payment_method: crate::models::order::PaymentMethod::Cod,
            notes: None,
            estimated_delivery_time: None,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn every_status_has_its_own_message() {
        let all = [
            OrderStatus::Placed,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Prepared,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ];
        let bodies: std::collections::HashSet<String> =
            all.iter().map(|s| status_message(*s, "ORD-7").1).collect();
        assert_eq!(bodies.len(), all.len());
        assert!(bodies.iter().all(|b| b.contains("#ORD-7")));
        assert_eq!(status_message(OrderStatus::Placed, "X").0, "Order Placed");
        assert_eq!(status_message(OrderStatus::Delivered, "X").0, "Order Update");
    }

    #[tokio::test]
    async fn notification_is_persisted_and_pushed() {
        let f = fixture();
        let user = user_with_token(&f.store, "9000000001", UserRole::Customer, "tok-1").await;

        let n = f
            .service
            .create_notification(user.id, "Hi", "Body", NotificationType::System, None)
            .await
            .unwrap();

        assert_eq!(f.push.sent_to("tok-1"), 1);
        assert_eq!(f.service.list(user.id).await.unwrap()[0].id, n.id);
        assert_eq!(f.service.unread_count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unregistered_token_is_cleared_and_not_retried() {
        let f = fixture();
        let user = user_with_token(&f.store, "9000000002", UserRole::Customer, "dead").await;
        f.push.mark_unregistered("dead");

        f.service
            .create_notification(user.id, "1", "first", NotificationType::System, None)
            .await
            .unwrap();
        let reloaded = f.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.fcm_token, None);

        // A segunda notificação ainda é gravada, mas sem nova tentativa de push
        f.service
            .create_notification(user.id, "2", "second", NotificationType::System, None)
            .await
            .unwrap();
        assert_eq!(f.push.sent_to("dead"), 1);
        assert_eq!(f.service.list(user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transient_push_failure_keeps_the_token() {
        let f = fixture();
        let user = user_with_token(&f.store, "9000000003", UserRole::Customer, "flaky").await;
        f.push.mark_failing("flaky");

        let result = f
            .service
            .create_notification(user.id, "t", "b", NotificationType::System, None)
            .await;
        assert!(result.is_ok());
        let reloaded = f.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.fcm_token.as_deref(), Some("flaky"));
    }

    #[tokio::test]
    async fn one_failing_admin_does_not_block_the_others() {
        let f = fixture();
        let a1 = user_with_token(&f.store, "9000000010", UserRole::Admin, "adm-1").await;
        let a2 = user_with_token(&f.store, "9000000011", UserRole::Admin, "adm-2").await;
        let a3 = user_with_token(&f.store, "9000000012", UserRole::Admin, "adm-3").await;
        f.push.mark_failing("adm-1");
        f.push.mark_unregistered("adm-2");

        let order = sample_order();
        let count = f.service.send_new_order_notification_to_admins(&order, "Ravi").await.unwrap();

        assert_eq!(count, 3);
        for admin in [&a1, &a2, &a3] {
            let list = f.service.list(admin.id).await.unwrap();
            assert_eq!(list.len(), 1);
            assert_eq!(list[0].title, "🔔 New Order Received!");
            assert_eq!(list[0].body, format!("Order #{} from Ravi", order.order_number));
        }
        assert_eq!(f.push.sent_to("adm-3"), 1);
    }

    #[tokio::test]
    async fn missing_push_configuration_still_persists() {
        let store = Arc::new(MemoryStore::new());
        let service = NotificationService::new(store.clone(), store.clone(), None);
        let user = user_with_token(&store, "9000000004", UserRole::Customer, "tok").await;

        service
            .create_notification(user.id, "t", "b", NotificationType::Promotion, None)
            .await
            .unwrap();
        assert_eq!(service.unread_count(user.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn marking_foreign_or_unknown_notifications_is_a_no_op() {
        let f = fixture();
        let owner = user_with_token(&f.store, "9000000005", UserRole::Customer, "o").await;
        let other = user_with_token(&f.store, "9000000006", UserRole::Customer, "x").await;
        let n = f
            .service
            .create_notification(owner.id, "t", "b", NotificationType::System, None)
            .await
            .unwrap();

        assert_eq!(f.service.mark_as_read(n.id, other.id).await.unwrap(), 0);
        assert_eq!(f.service.mark_as_read(Uuid::new_v4(), owner.id).await.unwrap(), 0);
        assert_eq!(f.service.unread_count(owner.id).await.unwrap(), 1);

        assert_eq!(f.service.mark_as_read(n.id, owner.id).await.unwrap(), 1);
        assert_eq!(f.service.unread_count(owner.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_all_only_touches_the_callers_notifications() {
        let f = fixture();
        let a = user_with_token(&f.store, "9000000007", UserRole::Customer, "a").await;
        let b = user_with_token(&f.store, "9000000008", UserRole::Customer, "b").await;
        for _ in 0..3 {
            f.service.create_notification(a.id, "t", "b", NotificationType::System, None).await.unwrap();
        }
        f.service.create_notification(b.id, "t", "b", NotificationType::System, None).await.unwrap();

        assert_eq!(f.service.mark_all_as_read(a.id).await.unwrap(), 3);
        assert_eq!(f.service.unread_count(b.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn listing_is_capped_at_fifty() {
        let f = fixture();
        let user = user_with_token(&f.store, "9000000009", UserRole::Customer, "t").await;
        for i in 0..55 {
            f.service
                .create_notification(user.id, "t", &format!("n{i}"), NotificationType::System, None)
                .await
                .unwrap();
        }
        assert_eq!(f.service.list(user.id).await.unwrap().len(), 50);
    }
}
