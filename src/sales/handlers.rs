use axum::{
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    sales::{
        dto::{CreateSaleRequest, Pagination},
        repo_types::{NewSale, SaleWithLines},
        services,
    },
    state::AppState,
};

pub const IDEMPOTENCY_KEY: &str = "idempotency-key";
pub const IDEMPOTENT_REPLAYED: &str = "idempotent-replayed";

pub fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/:id", get(get_sale))
}

/// 201 for a new sale. A repeated `Idempotency-Key` returns the stored sale
/// with 200 and `Idempotent-Replayed: true`.
#[instrument(skip(state, headers, payload), fields(user_id = %user.id))]
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<CreateSaleRequest>,
) -> AppResult<Response> {
    let raw_key = headers
        .get(IDEMPOTENCY_KEY)
        .map(|v| {
            v.to_str()
                .map_err(|_| AppError::validation("Idempotency-Key must be visible ASCII"))
        })
        .transpose()?;

    let new = NewSale {
        payment_method: payload.payment_method,
        lines: services::merge_lines(&payload.sale_products)?,
        idempotency_key: services::validate_idempotency_key(raw_key)?,
        created_by: Some(user.id),
    };

    let recorded = state.store.record_sale(new).await?;
    if recorded.replayed {
        info!(sale_id = %recorded.sale.sale.id, "sale replayed");
        let mut res = (StatusCode::OK, Json(recorded.sale)).into_response();
        res.headers_mut().insert(
            HeaderName::from_static(IDEMPOTENT_REPLAYED),
            HeaderValue::from_static("true"),
        );
        return Ok(res);
    }
    Ok((StatusCode::CREATED, Json(recorded.sale)).into_response())
}

#[instrument(skip(state))]
pub async fn list_sales(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(page): ApiQuery<Pagination>,
) -> AppResult<Json<Vec<SaleWithLines>>> {
    let (limit, offset) = page.bounds();
    Ok(Json(state.store.list_sales(limit, offset).await?))
}

#[instrument(skip(state))]
pub async fn get_sale(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<SaleWithLines>> {
    Ok(Json(state.store.get_sale(id).await?))
}
