// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,

        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::logout,
        handlers::auth::update_fcm_token,

        // --- Users ---
        handlers::auth::get_me,
        handlers::auth::update_profile,

        // --- Customers ---
        handlers::auth::latest_customer,
        handlers::auth::lookup_customer,

        // --- Addresses ---
        handlers::addresses::list_addresses,
        handlers::addresses::create_address,
        handlers::addresses::update_address,
        handlers::addresses::delete_address,
        handlers::addresses::set_default_address,

        // --- Catálogo ---
        handlers::catalog::list_products,
        handlers::catalog::get_product,
        handlers::catalog::create_product,
        handlers::catalog::update_product,
        handlers::catalog::delete_product,
        handlers::catalog::upload_product_image,
        handlers::catalog::list_categories,
        handlers::catalog::get_category,
        handlers::catalog::create_category,
        handlers::catalog::update_category,
        handlers::catalog::delete_category,
        handlers::catalog::list_units,
        handlers::catalog::get_unit,
        handlers::catalog::create_unit,
        handlers::catalog::update_unit,
        handlers::catalog::delete_unit,

        // --- Orders ---
        handlers::orders::create_order,
        handlers::orders::create_guest_order,
        handlers::orders::list_my_orders,
        handlers::orders::get_order,
        handlers::orders::cancel_order,

        // --- Admin ---
        handlers::orders::list_all_orders,
        handlers::orders::get_any_order,
        handlers::orders::update_order_status,
        handlers::orders::dashboard_stats,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::unread_count,
        handlers::notifications::mark_as_read,
        handlers::notifications::mark_all_as_read,
    ),
    components(
        schemas(
            // Auth
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::RefreshTokenPayload,
            models::auth::FcmTokenPayload,
            models::auth::UpdateProfilePayload,
            models::auth::AuthResponse,
            models::auth::RefreshResponse,
            models::auth::MessageResponse,
            models::auth::CustomerLookup,

            // Endereços
            models::address::Address,
            models::address::AddressPayload,
            models::address::UpdateAddressPayload,

            // Catálogo
            models::catalog::Product,
            models::catalog::CreateProductPayload,
            models::catalog::UpdateProductPayload,
            models::catalog::Category,
            models::catalog::CategoryPayload,
            models::catalog::UpdateCategoryPayload,
            models::catalog::Unit,
            models::catalog::UnitPayload,
            models::catalog::UpdateUnitPayload,
            models::catalog::DeleteOutcome,
            models::catalog::DeleteResponse,
            models::catalog::ImageUploadForm,
            models::catalog::UploadResponse,

            // Pedidos
            models::order::OrderStatus,
            models::order::PaymentMethod,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderLine,
            models::order::CustomerSummary,
            models::order::OrderDetail,
            models::order::OrderItemPayload,
            models::order::CreateOrderPayload,
            models::order::GuestOrderPayload,
            models::order::GuestOrderResponse,
            models::order::UpdateStatusPayload,
            models::order::DashboardStats,

            // Notificações
            models::notification::NotificationType,
            models::notification::Notification,
            models::notification::UnreadCount,
            models::notification::UpdatedCount,
        )
    ),
    tags(
        (name = "Health", description = "Verificação de disponibilidade"),
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário e Perfil"),
        (name = "Customers", description = "Busca de clientes pelo painel"),
        (name = "Addresses", description = "Endereços de entrega"),
        (name = "Products", description = "Catálogo de produtos"),
        (name = "Categories", description = "Categorias do catálogo"),
        (name = "Units", description = "Unidades de medida"),
        (name = "Orders", description = "Pedidos do cliente"),
        (name = "Admin", description = "Gestão de pedidos e indicadores"),
        (name = "Notifications", description = "Caixa de notificações")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
