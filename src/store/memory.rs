//! In-memory [`InventoryStore`] used by handler tests. One mutex guards all
//! tables, so each call is atomic the way a database transaction is.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User};
use crate::error::{AppError, AppResult};
use crate::products::repo_types::{NewProduct, Product, ProductPatch};
use crate::sales::repo_types::{NewSale, RecordedSale, Sale, SaleLine, SaleWithLines};
use crate::sales::services::{self, StockSnapshot};
use crate::store::InventoryStore;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    products: HashMap<Uuid, Product>,
    sales: Vec<SaleWithLines>,
    idempotency: HashMap<String, Uuid>,
}

impl Tables {
    fn sale(&self, id: Uuid) -> Option<&SaleWithLines> {
        self.sales.iter().find(|s| s.sale.id == id)
    }

    fn sku_taken(&self, sku: &str, except: Option<Uuid>) -> bool {
        self.products
            .values()
            .any(|p| p.sku == sku && Some(p.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Persistence(anyhow::anyhow!("memory store poisoned")))
    }
}

fn sorted(mut products: Vec<Product>) -> Vec<Product> {
    products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    products
}

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> AppResult<User> {
        let mut t = self.lock()?;
        if t.users.iter().any(|u| u.username == new.username) {
            return Err(AppError::Conflict("Username already taken".into()));
        }
        if t.users.iter().any(|u| u.email == new.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(
        &self,
        role: Role,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        let t = self.lock()?;
        let matching: Vec<&User> = t.users.iter().filter(|u| u.role == role).collect();
        let page = matching
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|u| (*u).clone())
            .collect();
        Ok((page, matching.len() as i64))
    }

    async fn create_product(&self, new: NewProduct) -> AppResult<Product> {
        let mut t = self.lock()?;
        if t.sku_taken(&new.sku, None) {
            return Err(AppError::Conflict("SKU already exists".into()));
        }
        let now = OffsetDateTime::now_utc();
        let product = Product {
            id: Uuid::new_v4(),
            name: new.name,
            description: new.description,
            price: new.price,
            cost_price: new.cost_price,
            sku: new.sku,
            category: new.category,
            stock: new.stock,
            low_stock_alert: new.low_stock_alert,
            created_at: now,
            updated_at: now,
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Product> {
        self.lock()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("product", id))
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(sorted(self.lock()?.products.values().cloned().collect()))
    }

    async fn list_low_stock(&self) -> AppResult<Vec<Product>> {
        let mut low = sorted(
            self.lock()?
                .products
                .values()
                .filter(|p| p.is_low_stock())
                .cloned()
                .collect(),
        );
        low.sort_by_key(|p| p.stock);
        Ok(low)
    }

    async fn update_product(&self, id: Uuid, patch: ProductPatch) -> AppResult<Product> {
        let mut t = self.lock()?;
        if !t.products.contains_key(&id) {
            return Err(AppError::not_found("product", id));
        }
        if let Some(sku) = patch.sku.as_deref() {
            if t.sku_taken(sku, Some(id)) {
                return Err(AppError::Conflict("SKU already exists".into()));
            }
        }
        let product = t
            .products
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("product", id))?;
        patch.apply(product);
        product.updated_at = OffsetDateTime::now_utc();
        Ok(product.clone())
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<()> {
        let mut t = self.lock()?;
        if t.products.remove(&id).is_none() {
            return Err(AppError::not_found("product", id));
        }
        for line in t.sales.iter_mut().flat_map(|s| s.lines.iter_mut()) {
            if line.product_id == Some(id) {
                line.product_id = None;
            }
        }
        Ok(())
    }

    async fn record_sale(&self, new: NewSale) -> AppResult<RecordedSale> {
        let mut t = self.lock()?;

        if let Some(key) = new.idempotency_key.as_deref() {
            if let Some(sale) = t.idempotency.get(key).and_then(|id| t.sale(*id)) {
                services::ensure_replay_matches(sale, &new)?;
                return Ok(RecordedSale {
                    sale: sale.clone(),
                    replayed: true,
                });
            }
        }

        let snapshots: HashMap<Uuid, StockSnapshot> = new
            .lines
            .iter()
            .filter_map(|(id, _)| t.products.get(id))
            .map(|p| {
                (
                    p.id,
                    StockSnapshot {
                        name: p.name.clone(),
                        sku: p.sku.clone(),
                        price: p.price,
                        stock: p.stock,
                    },
                )
            })
            .collect();
        let plan = services::plan_sale(&new.lines, &snapshots)?;

        let now = OffsetDateTime::now_utc();
        for line in &plan.lines {
            if let Some(p) = t.products.get_mut(&line.product_id) {
                p.stock -= line.quantity;
                p.updated_at = now;
            }
        }

        let sale = Sale {
            id: Uuid::new_v4(),
            payment_method: new.payment_method,
            total_amount: plan.total,
            created_by: new.created_by,
            created_at: now,
        };
        let lines = plan
            .lines
            .into_iter()
            .map(|l| SaleLine {
                id: Uuid::new_v4(),
                sale_id: sale.id,
                product_id: Some(l.product_id),
                product_name: l.product_name,
                sku: l.sku,
                quantity: l.quantity,
                unit_price: l.unit_price,
                subtotal: l.subtotal,
            })
            .collect();
        let recorded = SaleWithLines { sale, lines };

        if let Some(key) = new.idempotency_key {
            t.idempotency.insert(key, recorded.sale.id);
        }
        t.sales.push(recorded.clone());
        Ok(RecordedSale {
            sale: recorded,
            replayed: false,
        })
    }

    async fn get_sale(&self, id: Uuid) -> AppResult<SaleWithLines> {
        self.lock()?
            .sale(id)
            .cloned()
            .ok_or_else(|| AppError::not_found("sale", id))
    }

    async fn list_sales(&self, limit: i64, offset: i64) -> AppResult<Vec<SaleWithLines>> {
        Ok(self
            .lock()?
            .sales
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_users(&self, include_admins: bool) -> AppResult<i64> {
        let t = self.lock()?;
        Ok(t.users
            .iter()
            .filter(|u| include_admins || u.role != Role::Admin)
            .count() as i64)
    }

    async fn count_products(&self) -> AppResult<i64> {
        Ok(self.lock()?.products.len() as i64)
    }

    async fn count_low_stock(&self) -> AppResult<i64> {
        Ok(self
            .lock()?
            .products
            .values()
            .filter(|p| p.is_low_stock())
            .count() as i64)
    }

    async fn count_sales(&self) -> AppResult<i64> {
        Ok(self.lock()?.sales.len() as i64)
    }

    async fn total_sales_amount(&self) -> AppResult<Decimal> {
        Ok(self.lock()?.sales.iter().map(|s| s.sale.total_amount).sum())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::sales::repo_types::PaymentMethod;

    use super::*;

    async fn seed(store: &MemoryStore, sku: &str, stock: i32, alert: i32) -> Product {
        store
            .create_product(NewProduct {
                name: format!("Product {sku}"),
                description: String::new(),
                price: Decimal::new(1050, 2),
                cost_price: Decimal::new(700, 2),
                sku: sku.into(),
                category: "general".into(),
                stock,
                low_stock_alert: alert,
            })
            .await
            .unwrap()
    }

    fn sale_of(lines: Vec<(Uuid, i32)>) -> NewSale {
        NewSale {
            payment_method: PaymentMethod::Cash,
            lines,
            idempotency_key: None,
            created_by: None,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_sales_never_oversell() {
        let store = Arc::new(MemoryStore::new());
        let id = seed(&store, "RACE", 5, 1).await.id;

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_sale(sale_of(vec![(id, 3)])).await })
            })
            .collect();
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(AppError::InsufficientStock { available: 2, .. }))));
        assert_eq!(store.get_product(id).await.unwrap().stock, 2);
        assert_eq!(store.count_sales().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_sale_changes_nothing() {
        let store = MemoryStore::new();
        let a = seed(&store, "A", 10, 1).await;
        let b = seed(&store, "B", 1, 1).await;

        let err = store
            .record_sale(sale_of(vec![(a.id, 3), (b.id, 2)]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { product_id, .. } if product_id == b.id));
        assert_eq!(store.get_product(a.id).await.unwrap().stock, 10);
        assert_eq!(store.count_sales().await.unwrap(), 0);
        assert_eq!(store.total_sales_amount().await.unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn low_stock_is_ordered_by_stock() {
        let store = MemoryStore::new();
        let five = seed(&store, "FIVE", 5, 6).await;
        let two = seed(&store, "TWO", 2, 3).await;
        seed(&store, "EIGHT", 8, 3).await;

        let low = store.list_low_stock().await.unwrap();
        assert_eq!(low.iter().map(|p| p.id).collect::<Vec<_>>(), vec![two.id, five.id]);
        assert_eq!(store.count_low_stock().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sku_stays_unique_across_updates() {
        let store = MemoryStore::new();
        seed(&store, "A", 1, 0).await;
        let b = seed(&store, "B", 1, 0).await;
        let patch = ProductPatch {
            sku: Some("A".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_product(b.id, patch).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn unknown_product_update_is_not_found_even_with_taken_sku() {
        let store = MemoryStore::new();
        seed(&store, "A", 1, 0).await;
        let patch = ProductPatch {
            sku: Some("A".into()),
            ..Default::default()
        };
        assert!(matches!(
            store.update_product(Uuid::new_v4(), patch).await,
            Err(AppError::NotFound { resource: "product", .. })
        ));
    }
}
