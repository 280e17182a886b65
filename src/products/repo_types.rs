use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Product record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub sku: String,
    pub category: String,
    pub stock: i32,
    pub low_stock_alert: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Product {
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_alert
    }
}

/// Validated fields of a product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub cost_price: Decimal,
    pub sku: String,
    pub category: String,
    pub stock: i32,
    pub low_stock_alert: i32,
}

/// Validated partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub low_stock_alert: Option<i32>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.cost_price.is_none()
            && self.sku.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.low_stock_alert.is_none()
    }

    pub fn apply(self, p: &mut Product) {
        if let Some(v) = self.name {
            p.name = v;
        }
        if let Some(v) = self.description {
            p.description = v;
        }
        if let Some(v) = self.price {
            p.price = v;
        }
        if let Some(v) = self.cost_price {
            p.cost_price = v;
        }
        if let Some(v) = self.sku {
            p.sku = v;
        }
        if let Some(v) = self.category {
            p.category = v;
        }
        if let Some(v) = self.stock {
            p.stock = v;
        }
        if let Some(v) = self.low_stock_alert {
            p.low_stock_alert = v;
        }
    }
}
