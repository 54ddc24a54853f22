// src/config.rs

use std::{env, path::PathBuf, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    common::tasks::BackgroundTasks,
    db::{
        AddressRepository, AddressStore, CatalogRepository, CatalogStore, NotificationRepository,
        NotificationStore, OrderRepository, OrderStore, UserRepository, UserStore,
    },
    services::{
        address_service::AddressService,
        auth::{AuthService, AuthSettings},
        catalog_service::CatalogService,
        image_store::ImageStore,
        notification_service::NotificationService,
        order_service::OrderService,
        push::{FcmClient, FcmCredentials, PushSender},
        realtime::RealtimeHub,
    },
};

/// Configuração lida do ambiente (e do `.env`, carregado no `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_refresh_secret: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    // None quando alguma das três variáveis do Firebase falta
    pub firebase: Option<FcmCredentials>,
    pub push_timeout: Duration,
    pub shutdown_grace: Duration,
    pub allow_admin_signup: bool,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de qualquer fonte chave → valor.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} deve ser definida"))
        };

        let firebase = match (
            lookup("FIREBASE_PROJECT_ID"),
            lookup("FIREBASE_CLIENT_EMAIL"),
            lookup("FIREBASE_PRIVATE_KEY"),
        ) {
            (Some(project_id), Some(client_email), Some(private_key)) => Some(FcmCredentials {
                project_id,
                client_email,
                // O .env costuma trazer a chave com "\n" literais
                private_key: private_key.replace("\\n", "\n"),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_refresh_secret: required("JWT_REFRESH_SECRET")?,
            port: parse_or(&lookup, "PORT", 3000)?,
            upload_dir: lookup("UPLOAD_DIR").map(PathBuf::from).unwrap_or_else(|| "uploads".into()),
            firebase,
            push_timeout: Duration::from_secs(parse_or(&lookup, "PUSH_TIMEOUT_SECS", 10)?),
            shutdown_grace: Duration::from_secs(parse_or(&lookup, "SHUTDOWN_GRACE_SECS", 10)?),
            allow_admin_signup: parse_or(&lookup, "ALLOW_ADMIN_SIGNUP", false)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {key}: {e}")),
        _ => Ok(default),
    }
}

/// Cliente de push, se as credenciais existirem. A ausência não impede a
/// subida do servidor: as notificações continuam sendo gravadas.
pub fn push_sender(config: &Config) -> Option<Arc<dyn PushSender>> {
    let Some(credentials) = config.firebase.clone() else {
        tracing::warn!("⚠️ Credenciais do Firebase ausentes; push desativado");
        return None;
    };

    match FcmClient::new(credentials, config.push_timeout) {
        Ok(client) => {
            tracing::info!("✅ Firebase inicializado");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::error!("🔥 Falha ao inicializar o Firebase, push desativado: {}", e);
            None
        }
    }
}

/// Implementações de persistência usadas pelos serviços.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub addresses: Arc<dyn AddressStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            addresses: Arc::new(AddressRepository::new(pool.clone())),
            catalog: Arc::new(CatalogRepository::new(pool.clone())),
            orders: Arc::new(OrderRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool)),
        }
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub address_service: AddressService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub notification_service: NotificationService,
    pub realtime: RealtimeHub,
    pub tasks: BackgroundTasks,
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Monta o gráfico de dependências.
    pub fn assemble(config: &Config, stores: Stores, push: Option<Arc<dyn PushSender>>) -> Self {
        let realtime = RealtimeHub::new();
        let tasks = BackgroundTasks::new();

        let auth_service = AuthService::new(
            stores.users.clone(),
            stores.addresses.clone(),
            AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                jwt_refresh_secret: config.jwt_refresh_secret.clone(),
                bcrypt_cost: config.bcrypt_cost,
                allow_admin_signup: config.allow_admin_signup,
            },
        );
        let notification_service =
            NotificationService::new(stores.users.clone(), stores.notifications.clone(), push);
        let order_service = OrderService::new(
            stores.users.clone(),
            stores.addresses.clone(),
            stores.catalog.clone(),
            stores.orders.clone(),
            notification_service.clone(),
            realtime.clone(),
            tasks.clone(),
        );

        Self {
            auth_service,
            address_service: AddressService::new(stores.addresses),
            catalog_service: CatalogService::new(stores.catalog, ImageStore::new(&config.upload_dir)),
            order_service,
            notification_service,
            realtime,
            tasks,
            upload_dir: config.upload_dir.clone(),
        }
    }
}
