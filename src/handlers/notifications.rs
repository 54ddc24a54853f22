// src/handlers/notifications.rs

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::policy::{ops, Authorized},
    models::notification::{Notification, UnreadCount, UpdatedCount},
};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 200, description = "Notificações mais recentes", body = Vec<Notification>)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    auth: Authorized<ops::ListNotifications>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(app_state.notification_service.list(auth.user.id).await?))
}

#[utoipa::path(
    get,
    path = "/api/notifications/unread-count",
    tag = "Notifications",
    responses((status = 200, description = "Quantidade não lida", body = UnreadCount)),
    security(("api_jwt" = []))
)]
pub async fn unread_count(
    State(app_state): State<AppState>,
    auth: Authorized<ops::ListNotifications>,
) -> Result<Json<UnreadCount>, AppError> {
    let count = app_state.notification_service.unread_count(auth.user.id).await?;
    Ok(Json(UnreadCount { count }))
}

#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "ID da notificação")),
    responses((status = 200, description = "Quantas foram marcadas (0 ou 1)", body = UpdatedCount)),
    security(("api_jwt" = []))
)]
pub async fn mark_as_read(
    State(app_state): State<AppState>,
    auth: Authorized<ops::MarkNotificationsRead>,
    Path(id): Path<Uuid>,
) -> Result<Json<UpdatedCount>, AppError> {
    let updated = app_state.notification_service.mark_as_read(id, auth.user.id).await?;
    Ok(Json(UpdatedCount { updated }))
}

#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "Quantas foram marcadas", body = UpdatedCount)),
    security(("api_jwt" = []))
)]
pub async fn mark_all_as_read(
    State(app_state): State<AppState>,
    auth: Authorized<ops::MarkNotificationsRead>,
) -> Result<Json<UpdatedCount>, AppError> {
    let updated = app_state.notification_service.mark_all_as_read(auth.user.id).await?;
    Ok(Json(UpdatedCount { updated }))
}
