//! Sale planning: the checks and arithmetic shared by every store backend.
//!
//! A backend locks the products a sale touches, hands their current rows to
//! [`plan_sale`], and writes the returned plan in the same atomic unit. Nothing
//! here touches storage.

use std::collections::HashMap;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::sales::dto::SaleLineRequest;
use crate::sales::repo_types::{NewSale, SaleWithLines};

pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Largest subtotal or total a `NUMERIC(14,2)` column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Current state of a product as seen inside the sale's atomic unit.
#[derive(Debug, Clone)]
pub struct StockSnapshot {
    pub name: String,
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalePlan {
    pub lines: Vec<PlannedLine>,
    pub total: Decimal,
}

/// Rejects empty or non-positive input and folds repeated products into one
/// line, keeping first-seen order.
pub fn merge_lines(lines: &[SaleLineRequest]) -> AppResult<Vec<(Uuid, i32)>> {
    if lines.is_empty() {
        return Err(AppError::validation("a sale needs at least one product line"));
    }

    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for line in lines {
        if line.quantity <= 0 {
            return Err(AppError::validation(format!(
                "quantity for product {} must be positive",
                line.product_id
            )));
        }
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => {
                *qty = qty.checked_add(line.quantity).ok_or_else(|| {
                    AppError::validation(format!(
                        "quantity for product {} is too large",
                        line.product_id
                    ))
                })?;
            }
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    Ok(merged)
}

pub fn validate_idempotency_key(key: Option<&str>) -> AppResult<Option<String>> {
    let Some(key) = key.map(str::trim) else {
        return Ok(None);
    };
    if key.is_empty() || key.len() > MAX_IDEMPOTENCY_KEY_LEN {
        return Err(AppError::validation(format!(
            "Idempotency-Key must be 1..={MAX_IDEMPOTENCY_KEY_LEN} characters"
        )));
    }
    Ok(Some(key.to_string()))
}

/// A key may only replay the sale it was first used for. Lines whose product
/// has since been deleted match on quantity alone.
pub fn ensure_replay_matches(stored: &SaleWithLines, new: &NewSale) -> AppResult<()> {
    let same_lines = stored.lines.len() == new.lines.len()
        && stored
            .lines
            .iter()
            .zip(&new.lines)
            .all(|(line, &(product_id, quantity))| {
                line.product_id.map_or(true, |id| id == product_id) && line.quantity == quantity
            });
    if stored.sale.payment_method != new.payment_method || !same_lines {
        return Err(AppError::Conflict(
            "Idempotency-Key was already used for a different sale".into(),
        ));
    }
    Ok(())
}

/// Checks every line against `products` and prices it.
///
/// All lookups are checked before any stock check, so a request naming an
/// unknown product reports `ProductNotFound` even if another line is short.
pub fn plan_sale(
    lines: &[(Uuid, i32)],
    products: &HashMap<Uuid, StockSnapshot>,
) -> AppResult<SalePlan> {
    if let Some((missing, _)) = lines.iter().find(|(id, _)| !products.contains_key(id)) {
        return Err(AppError::ProductNotFound(*missing));
    }

    let mut planned = Vec::with_capacity(lines.len());
    let mut total = Decimal::ZERO;
    for &(product_id, quantity) in lines {
        let product = &products[&product_id];
        if quantity > product.stock {
            return Err(AppError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }
        let subtotal = product.price * Decimal::from(quantity);
        if subtotal > MAX_AMOUNT {
            return Err(AppError::validation(format!(
                "subtotal for product {product_id} exceeds {MAX_AMOUNT}"
            )));
        }
        total += subtotal;
        if total > MAX_AMOUNT {
            return Err(AppError::validation(format!(
                "sale total exceeds {MAX_AMOUNT}"
            )));
        }
        planned.push(PlannedLine {
            product_id,
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            quantity,
            unit_price: product.price,
            subtotal,
        });
    }

    Ok(SalePlan {
        lines: planned,
        total,
    })
}
