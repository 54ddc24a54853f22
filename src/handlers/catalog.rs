// src/handlers/catalog.rs

use axum::{
    extract::{Multipart, Path, Query, State},
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
    models::{
        auth::MessageResponse,
        catalog::{
            ActiveFilter, Category, CategoryPayload, CreateProductPayload, DeleteResponse,
            ImageUploadForm, Product, ProductFilter, Unit, UnitPayload, UpdateCategoryPayload,
            UpdateProductPayload, UpdateUnitPayload, UploadResponse,
        },
    },
};

/// Nome do campo do formulário que carrega a imagem
const IMAGE_FIELD: &str = "image";

// =============================================================================
//  PRODUTOS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Products",
    params(ProductFilter),
    responses((status = 200, description = "Produtos filtrados", body = Vec<Product>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(app_state.catalog_service.list_products(&filter).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto", body = Product),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    Ok(Json(app_state.catalog_service.get_product(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Products",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos"),
        (status = 403, description = "Apenas admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageProducts>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state.catalog_service.create_product(payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Produto atualizado", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageProducts>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate()?;

    Ok(Json(app_state.catalog_service.update_product(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Products",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto removido", body = MessageResponse),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageProducts>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    app_state.catalog_service.delete_product(id).await?;
    Ok(Json(MessageResponse { message: "Product deleted successfully".into() }))
}

/// Upload multipart; o arquivo vai no campo `image`.
#[utoipa::path(
    post,
    path = "/api/products/upload-image",
    tag = "Products",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data", description = "JPEG, PNG, GIF ou WEBP até 5MB"),
    responses(
        (status = 201, description = "Imagem salva", body = UploadResponse),
        (status = 400, description = "Arquivo ausente, vazio, grande demais ou de tipo não aceito")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_product_image(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::UploadProductImage>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid(format!("Invalid multipart request: {e}")))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid(format!("Multipart error: {e}")))?;

        let image_url = app_state
            .catalog_service
            .upload_image(file_name.as_deref(), content_type.as_deref(), &data)
            .await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { image_url })));
    }

    Err(AppError::invalid(format!("No '{IMAGE_FIELD}' field found")))
}

// =============================================================================
//  CATEGORIAS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Categories",
    params(ActiveFilter),
    responses((status = 200, description = "Categorias", body = Vec<Category>))
)]
pub async fn list_categories(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(app_state.catalog_service.list_categories(filter.active).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses(
        (status = 200, description = "Categoria", body = Category),
        (status = 404, description = "Categoria não encontrada")
    )
)]
pub async fn get_category(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(app_state.catalog_service.get_category(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Categories",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageCategories>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state.catalog_service.create_category(payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    request_body = UpdateCategoryPayload,
    responses((status = 200, description = "Categoria atualizada", body = Category)),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageCategories>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<Json<Category>, AppError> {
    payload.validate()?;

    Ok(Json(app_state.catalog_service.update_category(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Categories",
    params(("id" = Uuid, Path, description = "ID da categoria")),
    responses((status = 200, description = "Removida ou desativada", body = DeleteResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageCategories>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(app_state.catalog_service.delete_category(id).await?))
}

// =============================================================================
//  UNIDADES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/units",
    tag = "Units",
    params(ActiveFilter),
    responses((status = 200, description = "Unidades de medida", body = Vec<Unit>))
)]
pub async fn list_units(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Query(filter): Query<ActiveFilter>,
) -> Result<Json<Vec<Unit>>, AppError> {
    Ok(Json(app_state.catalog_service.list_units(filter.active).await?))
}

#[utoipa::path(
    get,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses(
        (status = 200, description = "Unidade", body = Unit),
        (status = 404, description = "Unidade não encontrada")
    )
)]
pub async fn get_unit(
    State(app_state): State<AppState>,
    _caller: Permitted<ops::BrowseCatalog>,
    Path(id): Path<Uuid>,
) -> Result<Json<Unit>, AppError> {
    Ok(Json(app_state.catalog_service.get_unit(id).await?))
}

#[utoipa::path(
    post,
    path = "/api/units",
    tag = "Units",
    request_body = UnitPayload,
    responses(
        (status = 201, description = "Unidade criada", body = Unit),
        (status = 409, description = "Nome ou símbolo já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_unit(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageUnits>,
    Json(payload): Json<UnitPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let unit = app_state.catalog_service.create_unit(payload).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    put,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    request_body = UpdateUnitPayload,
    responses((status = 200, description = "Unidade atualizada", body = Unit)),
    security(("api_jwt" = []))
)]
pub async fn update_unit(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageUnits>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUnitPayload>,
) -> Result<Json<Unit>, AppError> {
    payload.validate()?;

    Ok(Json(app_state.catalog_service.update_unit(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/units/{id}",
    tag = "Units",
    params(("id" = Uuid, Path, description = "ID da unidade")),
    responses((status = 200, description = "Removida ou desativada", body = DeleteResponse)),
    security(("api_jwt" = []))
)]
pub async fn delete_unit(
    State(app_state): State<AppState>,
    _auth: Authorized<ops::ManageUnits>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, AppError> {
    Ok(Json(app_state.catalog_service.delete_unit(id).await?))
}
