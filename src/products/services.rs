use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{AppError, AppResult};
use crate::products::dto::{CreateProductRequest, UpdateProductRequest};
use crate::products::repo_types::{NewProduct, ProductPatch};

/// Largest price a `NUMERIC(12,2)` column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Money is kept to cents; anything finer is rounded half away from zero.
fn money(field: &str, value: Decimal) -> AppResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(AppError::validation(format!("{field} must be non-negative")));
    }
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded > MAX_PRICE {
        return Err(AppError::validation(format!(
            "{field} must not exceed {MAX_PRICE}"
        )));
    }
    Ok(rounded)
}

fn count(field: &str, value: i32) -> AppResult<i32> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} must be non-negative")));
    }
    Ok(value)
}

fn required(field: &str, value: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

pub fn validate_new(req: CreateProductRequest) -> AppResult<NewProduct> {
    Ok(NewProduct {
        name: required("name", &req.name)?,
        description: req.description.trim().to_string(),
        price: money("price", req.price)?,
        cost_price: money("costPrice", req.cost_price)?,
        sku: required("sku", &req.sku)?,
        category: req.category.trim().to_string(),
        stock: count("stock", req.stock)?,
        low_stock_alert: count("lowStockAlert", req.low_stock_alert)?,
    })
}

pub fn validate_patch(req: UpdateProductRequest) -> AppResult<ProductPatch> {
    let patch = ProductPatch {
        name: req.name.as_deref().map(|v| required("name", v)).transpose()?,
        description: req.description.map(|v| v.trim().to_string()),
        price: req.price.map(|v| money("price", v)).transpose()?,
        cost_price: req.cost_price.map(|v| money("costPrice", v)).transpose()?,
        sku: req.sku.as_deref().map(|v| required("sku", v)).transpose()?,
        category: req.category.map(|v| v.trim().to_string()),
        stock: req.stock.map(|v| count("stock", v)).transpose()?,
        low_stock_alert: req
            .low_stock_alert
            .map(|v| count("lowStockAlert", v))
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(AppError::validation("no fields to update"));
    }
    Ok(patch)
}
