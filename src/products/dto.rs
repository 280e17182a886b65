use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(alias = "cost")]
    pub cost_price: Decimal,
    pub sku: String,
    #[serde(default)]
    pub category: String,
    pub stock: i32,
    #[serde(default)]
    pub low_stock_alert: i32,
}

/// Every field optional; only supplied ones change.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    #[serde(alias = "cost")]
    pub cost_price: Option<Decimal>,
    pub sku: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i32>,
    pub low_stock_alert: Option<i32>,
}
