// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers::{self, addresses, auth, catalog, notifications, orders, realtime},
    middleware::auth::authenticate,
    services::image_store::MAX_IMAGE_SIZE,
};

/// Folga para os cabeçalhos do multipart além do arquivo em si
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Monta a aplicação completa. Quem exige identidade ou papel é decidido
/// por handler, pelo extrator `Authorized`.
pub fn build_router(app_state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/fcm-token", put(auth::update_fcm_token))
        .route("/me", get(auth::get_me).put(auth::update_profile));

    let customer_routes = Router::new()
        .route("/last", get(auth::latest_customer))
        .route("/lookup", get(auth::lookup_customer));

    let address_routes = Router::new()
        .route("/", get(addresses::list_addresses).post(addresses::create_address))
        .route("/{id}", put(addresses::update_address).delete(addresses::delete_address))
        .route("/{id}/default", put(addresses::set_default_address));

    let product_routes = Router::new()
        .route("/", get(catalog::list_products).post(catalog::create_product))
        .route(
            "/upload-image",
            post(catalog::upload_product_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD)),
        )
        .route(
            "/{id}",
            get(catalog::get_product)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        );

    let category_routes = Router::new()
        .route("/", get(catalog::list_categories).post(catalog::create_category))
        .route(
            "/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        );

    let unit_routes = Router::new()
        .route("/", get(catalog::list_units).post(catalog::create_unit))
        .route(
            "/{id}",
            get(catalog::get_unit).put(catalog::update_unit).delete(catalog::delete_unit),
        );

    let order_routes = Router::new()
        .route("/", get(orders::list_my_orders).post(orders::create_order))
        .route("/guest", post(orders::create_guest_order))
        .route("/{id}", get(orders::get_order))
        .route("/{id}/cancel", put(orders::cancel_order));

    let admin_routes = Router::new()
        .route("/orders", get(orders::list_all_orders))
        .route("/orders/{id}", get(orders::get_any_order))
        .route("/orders/{id}/status", put(orders::update_order_status))
        .route("/dashboard/stats", get(orders::dashboard_stats));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/unread-count", get(notifications::unread_count))
        .route("/read-all", put(notifications::mark_all_as_read))
        .route("/{id}/read", put(notifications::mark_as_read));

    let uploads = ServeDir::new(&app_state.upload_dir);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/ws", get(realtime::realtime_ws))
        .nest("/api/auth", auth_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/addresses", address_routes)
        .nest("/api/products", product_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/units", unit_routes)
        .nest("/api/orders", order_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/notifications", notification_routes)
        .nest_service("/uploads", uploads)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Identifica quem chama (sem rejeitar) antes de qualquer rota
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), authenticate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
