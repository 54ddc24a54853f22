// src/services/realtime.rs

// Distribuição em tempo real dos eventos de pedido para as sessões
// WebSocket abertas. Nada é persistido: quem está desconectado perde o
// evento e conta com a notificação gravada no banco.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

/// Capacidade do canal dos admins; um admin lento perde eventos antigos
const ADMIN_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderPlaced {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Evento enviado ao cliente como `{"event": ..., "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum RealtimeEvent {
    #[serde(rename = "order:status-changed")]
    OrderStatusChanged(OrderStatusChanged),
    #[serde(rename = "order:new")]
    NewOrder(NewOrderPlaced),
}

impl RealtimeEvent {
    pub fn status_changed(order: &Order) -> Self {
        RealtimeEvent::OrderStatusChanged(OrderStatusChanged {
            order_id: order.id,
            order_number: order.order_number.clone(),
            status: order.status,
            updated_at: order.updated_at,
        })
    }

    pub fn new_order(order: &Order, customer_name: &str) -> Self {
        RealtimeEvent::NewOrder(NewOrderPlaced {
            order_id: order.id,
            order_number: order.order_number.clone(),
            customer_name: customer_name.to_string(),
            total: order.total,
            created_at: order.created_at,
        })
    }
}

struct Session {
    id: u64,
    tx: mpsc::UnboundedSender<RealtimeEvent>,
}

/// Assinatura de uma sessão recém-conectada.
pub struct Subscription {
    pub user_id: Uuid,
    pub session_id: u64,
    /// Eventos endereçados a este usuário
    pub events: mpsc::UnboundedReceiver<RealtimeEvent>,
    /// Grupo dos admins (só para sessões de admin)
    pub admin_events: Option<broadcast::Receiver<RealtimeEvent>>,
}

#[derive(Clone)]
pub struct RealtimeHub {
    /// user_id → sessão ativa
    sessions: Arc<DashMap<Uuid, Session>>,
    admins: broadcast::Sender<RealtimeEvent>,
    next_session: Arc<AtomicU64>,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeHub {
    pub fn new() -> Self {
        let (admins, _) = broadcast::channel(ADMIN_BROADCAST_CAPACITY);
        Self {
            sessions: Arc::new(DashMap::new()),
            admins,
            next_session: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registra a sessão do usuário. Uma sessão anterior do mesmo usuário é
    /// substituída e o canal dela é fechado.
    pub fn connect(&self, user_id: Uuid, is_admin: bool) -> Subscription {
        let (tx, events) = mpsc::unbounded_channel();
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);

        if self.sessions.insert(user_id, Session { id: session_id, tx }).is_some() {
            tracing::debug!(%user_id, "Sessão anterior substituída");
        }

        Subscription {
            user_id,
            session_id,
            events,
            admin_events: is_admin.then(|| self.admins.subscribe()),
        }
    }

    /// Remove a sessão apenas se ainda for a mesma; o fim de uma sessão
    /// antiga não derruba a que a substituiu.
    pub fn disconnect(&self, user_id: Uuid, session_id: u64) {
        self.sessions.remove_if(&user_id, |_, session| session.id == session_id);
    }

    #[cfg(test)]
    pub fn is_connected(&self, user_id: Uuid) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Entrega ao cliente, se conectado. Retorna `false` quando o evento foi
    /// descartado.
    pub fn emit_order_status_change(&self, customer_id: Uuid, event: RealtimeEvent) -> bool {
        match self.sessions.get(&customer_id) {
            Some(session) => session.tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Difunde para todas as sessões de admin. Retorna quantas receberam.
    pub fn emit_new_order_to_admins(&self, event: RealtimeEvent) -> usize {
        // Sem assinantes o send falha; nada a fazer
        self.admins.send(event).unwrap_or(0)
    }
}
