use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::auth::PublicUser;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_products: i64,
    pub low_stock_products: i64,
    pub total_sales_count: i64,
    pub total_sales_amount: Decimal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    #[serde(default)]
    pub include_admins: bool,
}

#[derive(Debug, Deserialize)]
pub struct UsersQuery {
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    pub users: Vec<PublicUser>,
    pub page: i64,
    pub page_size: i64,
    pub total_users: i64,
    pub total_pages: i64,
}
