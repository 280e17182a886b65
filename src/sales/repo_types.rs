use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[serde(alias = "CASH", alias = "Cash")]
    Cash,
    #[serde(alias = "CARD", alias = "Card")]
    Card,
    #[serde(alias = "TRANSFER", alias = "Transfer")]
    Transfer,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            other => Err(AppError::validation(format!(
                "unknown payment method {other:?}"
            ))),
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SaleRow {
    pub id: Uuid,
    pub payment_method: String,
    pub total_amount: Decimal,
    pub created_by: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

/// Sale header. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub payment_method: PaymentMethod,
    pub total_amount: Decimal,
    pub created_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<SaleRow> for Sale {
    type Error = AppError;

    fn try_from(r: SaleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            payment_method: r.payment_method.parse()?,
            total_amount: r.total_amount,
            created_by: r.created_by,
            created_at: r.created_at,
        })
    }
}

/// One persisted line. `product_id` is `None` once the product is deleted;
/// name, SKU and price stay as they were at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub sale_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithLines {
    #[serde(flatten)]
    pub sale: Sale,
    pub lines: Vec<SaleLine>,
}

/// Validated sale request: lines are merged per product and quantities are positive.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub payment_method: PaymentMethod,
    pub lines: Vec<(Uuid, i32)>,
    pub idempotency_key: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Outcome of `record_sale`; `replayed` is true when an idempotency key matched
/// an earlier sale and nothing new was written.
#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub sale: SaleWithLines,
    pub replayed: bool,
}
