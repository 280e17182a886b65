//! Persistence seam. Handlers only see [`InventoryStore`]; Postgres backs it
//! in production and an in-memory store backs it in tests.

#[cfg(test)]
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::AppResult;
use crate::products::repo_types::{NewProduct, Product, ProductPatch};
use crate::sales::repo_types::{NewSale, RecordedSale, SaleWithLines};

pub use postgres::PgStore;

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn create_user(&self, new: NewUser) -> AppResult<User>;
    /// One page of accounts with `role`, oldest first, and the total count.
    async fn list_users(&self, role: Role, limit: i64, offset: i64)
        -> AppResult<(Vec<User>, i64)>;

    async fn create_product(&self, new: NewProduct) -> AppResult<Product>;
    async fn get_product(&self, id: Uuid) -> AppResult<Product>;
    async fn list_products(&self) -> AppResult<Vec<Product>>;
    async fn list_low_stock(&self) -> AppResult<Vec<Product>>;
    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product>;
    async fn delete_product(&self, id: Uuid) -> AppResult<()>;

    /// Atomically checks stock, writes the sale and decrements every product,
    /// or changes nothing.
    async fn record_sale(&self, new: NewSale) -> AppResult<RecordedSale>;
    async fn get_sale(&self, id: Uuid) -> AppResult<SaleWithLines>;
    async fn list_sales(&self, limit: i64, offset: i64) -> AppResult<Vec<SaleWithLines>>;

    async fn count_users(&self, include_admins: bool) -> AppResult<i64>;
    async fn count_products(&self) -> AppResult<i64>;
    async fn count_low_stock(&self) -> AppResult<i64>;
    async fn count_sales(&self) -> AppResult<i64>;
    async fn total_sales_amount(&self) -> AppResult<Decimal>;
}
