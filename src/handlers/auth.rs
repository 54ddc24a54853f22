// src/handlers/auth.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::policy::{ops, Authorized, Permitted},
    models::auth::{
        AuthResponse, CustomerLookup, FcmTokenPayload, LoginUserPayload, MessageResponse,
        PhoneQuery, RefreshResponse, RefreshTokenPayload, RegisterUserPayload,
        UpdateProfilePayload, User,
    },
};

// Handler de registro
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário registrado", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Telefone já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::Register>,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state.auth_service.register_user(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

// Handler de login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Login efetuado", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::Login>,
    Json(payload): Json<LoginUserPayload>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login_user(&payload.phone, &payload.password)
        .await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Auth",
    request_body = RefreshTokenPayload,
    responses(
        (status = 200, description = "Novo token de acesso", body = RefreshResponse),
        (status = 401, description = "Refresh token inválido ou expirado")
    )
)]
pub async fn refresh(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::RefreshToken>,
    Json(payload): Json<RefreshTokenPayload>,
) -> Result<Json<RefreshResponse>, AppError> {
    payload.validate()?;

    let access_token = app_state.auth_service.refresh_access_token(&payload.refresh_token)?;
    Ok(Json(RefreshResponse { access_token }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Sessão encerrada", body = MessageResponse)),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    auth: Authorized<ops::Logout>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.auth_service.logout(auth.user.id).await?;
    Ok(Json(MessageResponse { message: "Logged out successfully".into() }))
}

#[utoipa::path(
    put,
    path = "/api/auth/fcm-token",
    tag = "Auth",
    request_body = FcmTokenPayload,
    responses(
        (status = 200, description = "Token do aparelho registrado", body = MessageResponse),
        (status = 400, description = "Token vazio")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_fcm_token(
    State(app_state): State<AppState>,
    auth: Authorized<ops::UpdateFcmToken>,
    Json(payload): Json<FcmTokenPayload>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate()?;

    app_state.auth_service.update_fcm_token(auth.user.id, &payload.fcm_token).await?;
    Ok(Json(MessageResponse { message: "FCM token updated successfully".into() }))
}

// Handler da rota protegida /me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Users",
    responses((status = 200, description = "Usuário autenticado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    auth: Authorized<ops::GetMe>,
) -> Result<Json<User>, AppError> {
    Ok(Json(app_state.auth_service.me(auth.user.id).await?))
}

#[utoipa::path(
    put,
    path = "/api/auth/me",
    tag = "Users",
    request_body = UpdateProfilePayload,
    responses((status = 200, description = "Perfil atualizado", body = User)),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    auth: Authorized<ops::UpdateProfile>,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let user = app_state
        .auth_service
        .update_profile(auth.user.id, payload.name, payload.email)
        .await?;
    Ok(Json(user))
}

#[utoipa::path(
    get,
    path = "/api/customers/last",
    tag = "Customers",
    responses(
        (status = 200, description = "Cliente cadastrado mais recentemente", body = Option<User>),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn latest_customer(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::LatestCustomer>,
) -> Result<Json<Option<User>>, AppError> {
    Ok(Json(app_state.auth_service.latest_customer().await?))
}

#[utoipa::path(
    get,
    path = "/api/customers/lookup",
    tag = "Customers",
    params(PhoneQuery),
    responses((status = 200, description = "Cliente e endereços do telefone", body = CustomerLookup)),
    security(("api_jwt" = []))
)]
pub async fn lookup_customer(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::LookupCustomer>,
    Query(query): Query<PhoneQuery>,
) -> Result<Json<CustomerLookup>, AppError> {
    Ok(Json(app_state.auth_service.lookup_by_phone(&query.phone).await?))
}
