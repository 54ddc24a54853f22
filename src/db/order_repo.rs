// src/db/order_repo.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::{db_utils::unique_violation, error::AppError},
    db::traits::OrderStore,
    models::{
        address::Address,
        order::{
            CustomerSummary, DashboardStats, NewOrder, Order, OrderDetail, OrderFilter, OrderLine,
            OrderStatus,
        },
    },
};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, address_id, subtotal, delivery_fee, \
     tax, total, status, payment_method, notes, estimated_delivery_time, delivered_at, \
     created_at, updated_at";

const LINE_QUERY: &str = r#"
    SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.unit_price, oi.subtotal,
           oi.created_at, p.name AS product_name, p.image_url AS product_image
    FROM order_items oi
    JOIN products p ON p.id = oi.product_id
    WHERE oi.order_id = ANY($1)
    ORDER BY oi.created_at, oi.id
"#;

#[derive(Clone)]
pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Monta os detalhes (itens, endereço e cliente) de vários pedidos com
/// uma consulta por tabela.
async fn load_details(
    conn: &mut PgConnection,
    orders: Vec<Order>,
) -> Result<Vec<OrderDetail>, AppError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let address_ids: Vec<Uuid> = orders.iter().map(|o| o.address_id).collect();
    let customer_ids: Vec<Uuid> = orders.iter().map(|o| o.customer_id).collect();

    let lines = sqlx::query_as::<_, OrderLine>(LINE_QUERY)
        .bind(&order_ids)
        .fetch_all(&mut *conn)
        .await?;

    let addresses: HashMap<Uuid, Address> = sqlx::query_as::<_, Address>(
        r#"
        SELECT id, user_id, label, street, city, state, zip_code, latitude, longitude,
               is_default, created_at, updated_at
        FROM addresses WHERE id = ANY($1)
        "#,
    )
    .bind(&address_ids)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|a| (a.id, a))
    .collect();

    let customers: HashMap<Uuid, CustomerSummary> =
        sqlx::query_as::<_, CustomerSummary>("SELECT id, name, phone FROM users WHERE id = ANY($1)")
            .bind(&customer_ids)
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

    let mut lines_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        lines_by_order.entry(line.item.order_id).or_default().push(line);
    }

    orders
        .into_iter()
        .map(|order| -> Result<OrderDetail, AppError> {
            // Chaves estrangeiras garantem que endereço e cliente existem
            let address = addresses.get(&order.address_id).cloned().ok_or_else(|| {
                anyhow::anyhow!("Endereço {} do pedido {} sumiu", order.address_id, order.id)
            })?;
            let customer = customers.get(&order.customer_id).cloned().ok_or_else(|| {
                anyhow::anyhow!("Cliente {} do pedido {} sumiu", order.customer_id, order.id)
            })?;
            Ok(OrderDetail {
                items: lines_by_order.remove(&order.id).unwrap_or_default(),
                address,
                customer,
                order,
            })
        })
        .collect()
}

#[async_trait]
impl OrderStore for OrderRepository {
    async fn insert_order(&self, new_order: NewOrder) -> Result<OrderDetail, AppError> {
        let pricing = &new_order.pricing;

        // --- INÍCIO DA TRANSAÇÃO ---
        // Pedido e itens entram juntos ou não entram
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders (
                order_number, customer_id, address_id, subtotal, delivery_fee, tax, total,
                status, payment_method, notes, estimated_delivery_time
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(&new_order.order_number)
        .bind(new_order.customer_id)
        .bind(new_order.address_id)
        .bind(pricing.subtotal)
        .bind(pricing.delivery_fee)
        .bind(pricing.tax)
        .bind(pricing.total)
        .bind(OrderStatus::Placed)
        .bind(new_order.payment_method)
        .bind(&new_order.notes)
        .bind(new_order.estimated_delivery_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e).as_deref() {
            Some("orders_order_number_key") => AppError::DuplicateOrderNumber,
            _ => e.into(),
        })?;

        for line in &pricing.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        let mut details = load_details(&mut *tx, vec![order]).await?;
        tx.commit().await?;
        // --- FIM DA TRANSAÇÃO ---

        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Pedido recém-criado não encontrado").into())
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<OrderDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match order {
            Some(order) => Ok(load_details(&mut *conn, vec![order]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_orders(&self, filter: OrderFilter) -> Result<Vec<OrderDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, Order>(&format!(
            r#"
            SELECT {ORDER_COLUMNS} FROM orders
            WHERE ($1::uuid IS NULL OR customer_id = $1)
              AND ($2::order_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
        .bind(filter.customer_id)
        .bind(filter.status)
        .fetch_all(&mut *conn)
        .await?;

        load_details(&mut *conn, orders).await
    }

    async fn transition_status(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders
            SET status = $3, delivered_at = $4, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(delivered_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    async fn dashboard_stats(&self, since: DateTime<Utc>) -> Result<DashboardStats, AppError> {
        // Um único SELECT para um retrato consistente
        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE created_at >= $1 AND status <> 'CANCELLED') AS today_orders,
                COUNT(*) FILTER (WHERE status <> 'CANCELLED') AS total_orders,
                COUNT(*) FILTER (WHERE status = ANY($2)) AS pending_orders,
                COALESCE(SUM(total) FILTER (WHERE created_at >= $1 AND status <> 'CANCELLED'), 0)
                    AS today_revenue
            FROM orders
            "#,
        )
        .bind(since)
        .bind(OrderStatus::PENDING.to_vec())
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
