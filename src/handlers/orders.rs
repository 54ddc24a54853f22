// src/handlers/orders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::policy::{ops, Authorized, Permitted},
    models::order::{
        CreateOrderPayload, DashboardStats, GuestOrderPayload, GuestOrderResponse, OrderDetail,
        StatusFilter, UpdateStatusPayload,
    },
};

// =============================================================================
//  CLIENTE
// =============================================================================

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Pedido criado", body = OrderDetail),
        (status = 400, description = "Itens inválidos ou produto indisponível"),
        (status = 404, description = "Endereço ou produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    auth: Authorized<ops::CreateOrder>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let order = app_state.order_service.create_order(auth.user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Pedido sem login: o cliente é identificado pelo telefone.
#[utoipa::path(
    post,
    path = "/api/orders/guest",
    tag = "Orders",
    request_body = GuestOrderPayload,
    responses(
        (status = 201, description = "Pedido criado", body = GuestOrderResponse),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn create_guest_order(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::CreateGuestOrder>,
    Json(payload): Json<GuestOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.order_service.create_guest_order(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses((status = 200, description = "Pedidos do usuário, mais recentes primeiro", body = Vec<OrderDetail>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_orders(
    State(app_state): State<AppState>,
    auth: Authorized<ops::ListMyOrders>,
) -> Result<Json<Vec<OrderDetail>>, AppError> {
    Ok(Json(app_state.order_service.get_user_orders(auth.user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    auth: Authorized<ops::GetOrder>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    let order = app_state
        .order_service
        .get_order_for(id, auth.user.id, auth.user.is_admin())
        .await?;
    Ok(Json(order))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/cancel",
    tag = "Orders",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses(
        (status = 200, description = "Pedido cancelado", body = OrderDetail),
        (status = 400, description = "Pedido já entregue ou cancelado"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    auth: Authorized<ops::CancelOrder>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    Ok(Json(app_state.order_service.cancel(id, auth.user.id).await?))
}

// =============================================================================
//  ADMIN
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "Admin",
    params(StatusFilter),
    responses(
        (status = 200, description = "Todos os pedidos", body = Vec<OrderDetail>),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_all_orders(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ListAllOrders>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<OrderDetail>>, AppError> {
    Ok(Json(app_state.order_service.get_all_orders(filter.status).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    responses((status = 200, description = "Pedido", body = OrderDetail)),
    security(("api_jwt" = []))
)]
pub async fn get_any_order(
    State(app_state): State<AppState>,
    auth: Authorized<ops::ListAllOrders>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>, AppError> {
    Ok(Json(app_state.order_service.get_order_for(id, auth.user.id, true).await?))
}

#[utoipa::path(
    put,
    path = "/api/admin/orders/{id}/status",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID do pedido")),
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = OrderDetail),
        (status = 400, description = "Transição inválida"),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order_status(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::UpdateOrderStatus>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<Json<OrderDetail>, AppError> {
    Ok(Json(app_state.order_service.update_status(id, payload.status).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard/stats",
    tag = "Admin",
    responses((status = 200, description = "Indicadores do dia", body = DashboardStats)),
    security(("api_jwt" = []))
)]
pub async fn dashboard_stats(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::DashboardStats>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(app_state.order_service.dashboard_stats().await?))
}
