// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::{
    common::{error::AppError, phone::normalize_phone},
    db::{AddressStore, UserStore},
    models::auth::{
        AuthResponse, Claims, CustomerLookup, NewUser, RegisterUserPayload, TokenKind, User,
        UserRole,
    },
};

const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub bcrypt_cost: u32,
    /// Se `register` aceita `role = ADMIN`
    pub allow_admin_signup: bool,
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    addresses: Arc<dyn AddressStore>,
    settings: AuthSettings,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        addresses: Arc<dyn AddressStore>,
        settings: AuthSettings,
    ) -> Self {
        Self { users, addresses, settings }
    }

    pub async fn register_user(&self, payload: RegisterUserPayload) -> Result<AuthResponse, AppError> {
        let phone = normalize_phone(&payload.phone);
        if phone.len() < 10 {
            return Err(AppError::invalid("Phone number must have at least 10 digits"));
        }

        let role = match payload.role {
            Some(UserRole::Admin) if self.settings.allow_admin_signup => UserRole::Admin,
            Some(UserRole::Admin) => return Err(AppError::Forbidden),
            _ => UserRole::Customer,
        };

        // Hashing fora do runtime assíncrono
        let password = payload.password;
        let cost = self.settings.bcrypt_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let user = self
            .users
            .create_user(NewUser {
                phone,
                password_hash: Some(hashed_password),
                name: payload.name,
                email: payload.email,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, "Novo usuário registrado");
        self.auth_response(user)
    }

    /// Telefone desconhecido e senha errada produzem o mesmo erro.
    pub async fn login_user(&self, phone: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .users
            .find_user_by_phone(&normalize_phone(phone))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Cliente criado por pedido de convidado ainda não tem senha
        let password_hash = user.password_hash.clone().ok_or(AppError::InvalidCredentials)?;
        let password = password.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
            .unwrap_or(false);

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        self.auth_response(user)
    }

    pub fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let claims = Self::decode_claims(refresh_token, &self.settings.jwt_refresh_secret)?;
        if claims.kind != TokenKind::Refresh {
            return Err(AppError::InvalidToken);
        }
        self.sign(claims.sub, &claims.phone, claims.role, TokenKind::Access)
    }

    /// Valida só a assinatura e a validade; não consulta o banco.
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AppError> {
        let claims = Self::decode_claims(token, &self.settings.jwt_secret)?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.users.set_fcm_token(user_id, None).await
    }

    pub async fn update_fcm_token(&self, user_id: Uuid, token: &str) -> Result<(), AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::invalid("FCM token is required"));
        }
        self.users.set_fcm_token(user_id, Some(token.to_string())).await
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users.find_user(user_id).await?.ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: Option<String>,
        email: Option<String>,
    ) -> Result<User, AppError> {
        self.users
            .update_profile(user_id, name, email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    pub async fn latest_customer(&self) -> Result<Option<User>, AppError> {
        self.users.latest_customer().await
    }

    pub async fn lookup_by_phone(&self, phone: &str) -> Result<CustomerLookup, AppError> {
        let Some(user) = self.users.find_user_by_phone(&normalize_phone(phone)).await? else {
            return Ok(CustomerLookup { exists: false, user: None, addresses: Vec::new() });
        };
        let addresses = self.addresses.list_addresses(user.id).await?;
        Ok(CustomerLookup { exists: true, user: Some(user), addresses })
    }

    // ---
    // Tokens
    // ---

    fn auth_response(&self, user: User) -> Result<AuthResponse, AppError> {
        let access_token = self.sign(user.id, &user.phone, user.role, TokenKind::Access)?;
        let refresh_token = self.sign(user.id, &user.phone, user.role, TokenKind::Refresh)?;
        Ok(AuthResponse { user, access_token, refresh_token })
    }

    fn sign(&self, user_id: Uuid, phone: &str, role: UserRole, kind: TokenKind) -> Result<String, AppError> {
        let now = Utc::now();
        let (ttl, secret) = match kind {
            TokenKind::Access => {
                (Duration::minutes(ACCESS_TOKEN_TTL_MINUTES), &self.settings.jwt_secret)
            }
            TokenKind::Refresh => {
                (Duration::days(REFRESH_TOKEN_TTL_DAYS), &self.settings.jwt_refresh_secret)
            }
        };

        let claims = Claims {
            sub: user_id,
            phone: phone.to_string(),
            role,
            kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))?)
    }

    fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::InvalidToken)
    }
}
