// src/middleware/policy.rs

// Tabela única de autorização: cada operação exposta declara a capacidade
// exigida, e o extrator `Authorized` a aplica antes do handler rodar.

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{common::error::AppError, middleware::auth::AuthenticatedUser, models::auth::UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    Admin,
}

impl Capability {
    /// 401 sem identidade quando ela é exigida; 403 quando o papel não basta.
    pub fn check(self, user: Option<&AuthenticatedUser>) -> Result<(), AppError> {
        match (self, user) {
            (Capability::Public, _) => Ok(()),
            (_, None) => Err(AppError::InvalidToken),
            (Capability::Authenticated, Some(_)) => Ok(()),
            (Capability::Admin, Some(user)) if user.role == UserRole::Admin => Ok(()),
            (Capability::Admin, Some(_)) => Err(AppError::Forbidden),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Conta
    Register,
    Login,
    RefreshToken,
    Logout,
    GetMe,
    UpdateProfile,
    UpdateFcmToken,
    LatestCustomer,
    LookupCustomer,
    // Endereços
    ListAddresses,
    CreateAddress,
    UpdateAddress,
    DeleteAddress,
    SetDefaultAddress,
    // Catálogo
    BrowseCatalog,
    ManageProducts,
    UploadProductImage,
    ManageCategories,
    ManageUnits,
    // Pedidos
    CreateOrder,
    CreateGuestOrder,
    ListMyOrders,
    GetOrder,
    CancelOrder,
    ListAllOrders,
    UpdateOrderStatus,
    DashboardStats,
    // Notificações
    ListNotifications,
    MarkNotificationsRead,
    // Tempo real
    RealtimeConnect,
}

impl Operation {
    pub const fn capability(self) -> Capability {
        use Capability::*;
        match self {
            Operation::Register
            | Operation::Login
            | Operation::RefreshToken
            | Operation::BrowseCatalog
            | Operation::CreateGuestOrder => Public,

            Operation::Logout
            | Operation::GetMe
            | Operation::UpdateProfile
            | Operation::UpdateFcmToken
            | Operation::ListAddresses
            | Operation::CreateAddress
            | Operation::UpdateAddress
            | Operation::DeleteAddress
            | Operation::SetDefaultAddress
            | Operation::CreateOrder
            | Operation::ListMyOrders
            | Operation::GetOrder
            | Operation::CancelOrder
            | Operation::ListNotifications
            | Operation::MarkNotificationsRead
            | Operation::RealtimeConnect => Authenticated,

            Operation::LatestCustomer
            | Operation::LookupCustomer
            | Operation::ManageProducts
            | Operation::UploadProductImage
            | Operation::ManageCategories
            | Operation::ManageUnits
            | Operation::ListAllOrders
            | Operation::UpdateOrderStatus
            | Operation::DashboardStats => Admin,
        }
    }
}

/// O que define uma operação no nível de tipo
pub trait OperationDef: Send + Sync + 'static {
    const OP: Operation;
}

/// O Extractor (Guardião): só constrói se a operação `T` for permitida
/// para quem chama.
pub struct Authorized<T> {
    pub user: AuthenticatedUser,
    _op: PhantomData<T>,
}

impl<T, S> FromRequestParts<S> for Authorized<T>
where
    T: OperationDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthenticatedUser>();
        T::OP.capability().check(user)?;

        // Operações públicas usam `Permitted`
        let user = user.cloned().ok_or(AppError::InvalidToken)?;
        Ok(Authorized { user, _op: PhantomData })
    }
}

/// Variante para operações que também aceitam anônimos: aplica a mesma
/// tabela sem exigir identidade.
pub struct Permitted<T>(PhantomData<T>);

impl<T, S> FromRequestParts<S> for Permitted<T>
where
    T: OperationDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        T::OP.capability().check(parts.extensions.get::<AuthenticatedUser>())?;
        Ok(Permitted(PhantomData))
    }
}

macro_rules! operations {
    ($($name:ident),* $(,)?) => {
        /// Marcadores de tipo para `Authorized<T>`.
        pub mod ops {
            $(
                pub struct $name;
                impl super::OperationDef for $name {
                    const OP: super::Operation = super::Operation::$name;
                }
            )*
        }
    };
}

operations!(
    Register,
    Login,
    RefreshToken,
    Logout,
    GetMe,
    UpdateProfile,
    UpdateFcmToken,
    LatestCustomer,
    LookupCustomer,
    ListAddresses,
    CreateAddress,
    UpdateAddress,
    DeleteAddress,
    SetDefaultAddress,
    BrowseCatalog,
    ManageProducts,
    UploadProductImage,
    ManageCategories,
    ManageUnits,
    CreateOrder,
    CreateGuestOrder,
    ListMyOrders,
    GetOrder,
    CancelOrder,
    ListAllOrders,
    UpdateOrderStatus,
    DashboardStats,
    ListNotifications,
    MarkNotificationsRead,
);
