use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::{AdminUser, AuthUser},
    error::AppResult,
    extract::{ApiJson, ApiPath},
    products::{
        dto::{CreateProductRequest, UpdateProductRequest},
        repo_types::Product,
        services,
    },
    state::AppState,
};

/// Reads need any signed-in user; writes go through `AdminUser`.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/low-stock", get(list_low_stock))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.store.list_products().await?))
}

#[instrument(skip(state))]
pub async fn list_low_stock(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(state.store.list_low_stock().await?))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Product>> {
    Ok(Json(state.store.get_product(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let new = services::validate_new(payload)?;
    let product = state.store.create_product(new).await?;
    info!(product_id = %product.id, sku = %product.sku, admin_id = %admin.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    let patch = services::validate_patch(payload)?;
    let product = state.store.update_product(id, patch).await?;
    info!(product_id = %id, admin_id = %admin.id, "product updated");
    Ok(Json(product))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    state.store.delete_product(id).await?;
    info!(product_id = %id, admin_id = %admin.id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
