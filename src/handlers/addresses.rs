// src/handlers/addresses.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::policy::{ops, Authorized},
    models::{
        address::{Address, AddressPayload, UpdateAddressPayload},
        auth::MessageResponse,
    },
};

#[utoipa::path(
    get,
    path = "/api/addresses",
    tag = "Addresses",
    responses((status = 200, description = "Endereços do usuário, padrão primeiro", body = Vec<Address>)),
    security(("api_jwt" = []))
)]
pub async fn list_addresses(
    State(app_state): State<AppState>,
    auth: Authorized<ops::ListAddresses>,
) -> Result<Json<Vec<Address>>, AppError> {
    Ok(Json(app_state.address_service.list(auth.user.id).await?))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    tag = "Addresses",
    request_body = AddressPayload,
    responses(
        (status = 201, description = "Endereço criado", body = Address),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_address(
    State(app_state): State<AppState>,
    auth: Authorized<ops::CreateAddress>,
    Json(payload): Json<AddressPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let address = app_state.address_service.create(auth.user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}",
    tag = "Addresses",
    params(("id" = Uuid, Path, description = "ID do endereço")),
    request_body = UpdateAddressPayload,
    responses(
        (status = 200, description = "Endereço atualizado", body = Address),
        (status = 404, description = "Endereço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_address(
    State(app_state): State<AppState>,
    auth: Authorized<ops::UpdateAddress>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAddressPayload>,
) -> Result<Json<Address>, AppError> {
    payload.validate()?;

    let address = app_state.address_service.update(id, auth.user.id, payload).await?;
    Ok(Json(address))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    tag = "Addresses",
    params(("id" = Uuid, Path, description = "ID do endereço")),
    responses(
        (status = 200, description = "Endereço removido", body = MessageResponse),
        (status = 404, description = "Endereço não encontrado"),
        (status = 409, description = "Endereço usado por um pedido")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_address(
    State(app_state): State<AppState>,
    auth: Authorized<ops::DeleteAddress>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.address_service.delete(id, auth.user.id).await?;
    Ok(Json(MessageResponse { message: "Address deleted successfully".into() }))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}/default",
    tag = "Addresses",
    params(("id" = Uuid, Path, description = "ID do endereço")),
    responses(
        (status = 200, description = "Novo endereço padrão", body = Address),
        (status = 404, description = "Endereço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_default_address(
    State(app_state): State<AppState>,
    auth: Authorized<ops::SetDefaultAddress>,
    Path(id): Path<Uuid>,
) -> Result<Json<Address>, AppError> {
    Ok(Json(app_state.address_service.set_default(id, auth.user.id).await?))
}
