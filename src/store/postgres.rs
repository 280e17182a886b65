use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::AppResult;
use crate::products::repo_types::{NewProduct, Product, ProductPatch};
use crate::sales::repo_types::{NewSale, RecordedSale, SaleWithLines};
use crate::store::InventoryStore;
use crate::{auth, products, reports, sales};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl InventoryStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        auth::repo::find_by_email(&self.db, email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        auth::repo::find_by_id(&self.db, id).await
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        auth::repo::create(&self.db, &new).await
    }

    async fn list_users(
        &self,
        role: Role,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        reports::repo::list_users_by_role(&self.db, role, limit, offset).await
    }

    async fn create_product(&self, new: NewProduct) -> AppResult<Product> {
        products::repo::create(&self.db, &new).await
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        products::repo::get_by_id(&self.db, id).await
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        products::repo::list(&self.db).await
    }

    async fn list_low_stock(&self) -> AppResult<Vec<Product>> {
        products::repo::list_low_stock(&self.db).await
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product> {
        products::repo::update(&self.db, id, &patch).await
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        products::repo::delete(&self.db, id).await
    }

    async fn record_sale(&self, new: NewSale) -> AppResult<RecordedSale> {
        sales::repo::record_sale(&self.db, &new).await
    }

    async fn get_sale(&self, id: Uuid) -> AppResult<SaleWithLines> {
        sales::repo::get_by_id(&self.db, id).await
    }

    async fn list_sales(&self, limit: i64, offset: i64) -> AppResult<Vec<SaleWithLines>> {
        sales::repo::list(&self.db, limit, offset).await
    }

    async fn count_users(&self, include_admins: bool) -> AppResult<i64> {
        reports::repo::count_users(&self.db, include_admins).await
    }

    async fn count_products(&self) -> AppResult<i64> {
        reports::repo::count_products(&self.db).await
    }

    async fn count_low_stock(&self) -> AppResult<i64> {
        reports::repo::count_low_stock(&self.db).await
    }

    async fn count_sales(&self) -> AppResult<i64> {
        reports::repo::count_sales(&self.db).await
    }

    async fn total_sales_amount(&self) -> AppResult<Decimal> {
        reports::repo::total_sales_amount(&self.db).await
    }
}
