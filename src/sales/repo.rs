use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{unique_violation, AppError, AppResult};
use crate::sales::repo_types::{NewSale, RecordedSale, Sale, SaleLine, SaleRow, SaleWithLines};
use crate::sales::services::{self, StockSnapshot};

const SALE_COLUMNS: &str = "id, payment_method, total_amount, created_by, created_at";
const LINE_COLUMNS: &str =
    "id, sale_id, product_id, product_name, sku, quantity, unit_price, subtotal";

#[derive(Debug, FromRow)]
struct LockedProduct {
    id: Uuid,
    name: String,
    sku: String,
    price: Decimal,
    stock: i32,
}

/// Records a sale, replaying the stored one if its idempotency key was seen before.
pub async fn record_sale(db: &PgPool, new: &NewSale) -> AppResult<RecordedSale> {
    if let Some(key) = new.idempotency_key.as_deref() {
        if let Some(sale) = find_by_idempotency_key(db, key).await? {
            services::ensure_replay_matches(&sale, new)?;
            debug!(sale_id = %sale.sale.id, "idempotent replay");
            return Ok(RecordedSale {
                sale,
                replayed: true,
            });
        }
    }

    match insert_sale(db, new).await {
        Ok(sale) => Ok(RecordedSale {
            sale,
            replayed: false,
        }),
        // Lost the race against a concurrent request with the same key.
        Err(AppError::Conflict(_)) if new.idempotency_key.is_some() => {
            let key = new.idempotency_key.as_deref().unwrap_or_default();
            let sale = find_by_idempotency_key(db, key)
                .await?
                .ok_or_else(|| AppError::Conflict("idempotency key in use".into()))?;
            services::ensure_replay_matches(&sale, new)?;
            Ok(RecordedSale {
                sale,
                replayed: true,
            })
        }
        Err(e) => Err(e),
    }
}

/// Locks every product involved in id order, checks and prices the lines,
/// then writes the header, the lines and the decrements. Any early return
/// drops `tx` uncommitted, which rolls the whole sale back.
async fn insert_sale(db: &PgPool, new: &NewSale) -> AppResult<SaleWithLines> {
    let mut tx: Transaction<'_, Postgres> = db.begin().await?;

    let mut ids: Vec<Uuid> = new.lines.iter().map(|(id, _)| *id).collect();
    ids.sort_unstable();

    let locked = sqlx::query_as::<_, LockedProduct>(
        r#"
        SELECT id, name, sku, price, stock
          FROM products
         WHERE id = ANY($1)
         ORDER BY id
           FOR UPDATE
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *tx)
    .await?;

    let snapshots: HashMap<Uuid, StockSnapshot> = locked
        .into_iter()
        .map(|p| {
            (
                p.id,
                StockSnapshot {
                    name: p.name,
                    sku: p.sku,
                    price: p.price,
                    stock: p.stock,
                },
            )
        })
        .collect();

    let plan = services::plan_sale(&new.lines, &snapshots)?;

    let sale_row = sqlx::query_as::<_, SaleRow>(&format!(
        r#"
        INSERT INTO sales (id, payment_method, total_amount, idempotency_key, created_by)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SALE_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(new.payment_method.as_str())
    .bind(plan.total)
    .bind(new.idempotency_key.as_deref())
    .bind(new.created_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match unique_violation(&e) {
        Some(_) => AppError::Conflict("idempotency key already used".into()),
        None => e.into(),
    })?;
    let sale = Sale::try_from(sale_row)?;

    let mut lines = Vec::with_capacity(plan.lines.len());
    for (position, line) in plan.lines.iter().enumerate() {
        let stored = sqlx::query_as::<_, SaleLine>(&format!(
            r#"
            INSERT INTO sale_lines (id, sale_id, product_id, product_name, sku, quantity, unit_price, subtotal, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {LINE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(sale.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(&line.sku)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .bind(position as i32)
        .fetch_one(&mut *tx)
        .await?;
        lines.push(stored);

        decrement_stock(&mut tx, line.product_id, line.quantity).await?;
    }

    tx.commit().await?;
    info!(
        sale_id = %sale.id,
        total = %sale.total_amount,
        lines = lines.len(),
        "sale recorded"
    );
    Ok(SaleWithLines { sale, lines })
}

/// Compare-and-decrement. Zero rows means the stock moved under us.
async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
           SET stock = stock - $2,
               updated_at = now()
         WHERE id = $1 AND stock >= $2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let available: Option<i32> = sqlx::query_scalar("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;
        warn!(%product_id, quantity, ?available, "conditional decrement matched no row");
        return Err(match available {
            Some(available) => AppError::InsufficientStock {
                product_id,
                requested: quantity,
                available,
            },
            None => AppError::ProductNotFound(product_id),
        });
    }
    Ok(())
}

async fn find_by_idempotency_key(db: &PgPool, key: &str) -> AppResult<Option<SaleWithLines>> {
    let row = sqlx::query_as::<_, SaleRow>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE idempotency_key = $1"
    ))
    .bind(key)
    .fetch_optional(db)
    .await?;
    match row {
        Some(row) => Ok(Some(attach_lines(db, vec![Sale::try_from(row)?]).await?.remove(0))),
        None => Ok(None),
    }
}

pub async fn get_by_id(db: &PgPool, id: Uuid) -> AppResult<SaleWithLines> {
    let row = sqlx::query_as::<_, SaleRow>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("sale", id))?;
    Ok(attach_lines(db, vec![Sale::try_from(row)?]).await?.remove(0))
}

/// Newest first.
pub async fn list(db: &PgPool, limit: i64, offset: i64) -> AppResult<Vec<SaleWithLines>> {
    let rows = sqlx::query_as::<_, SaleRow>(&format!(
        r#"
        SELECT {SALE_COLUMNS}
          FROM sales
         ORDER BY created_at DESC, id
         LIMIT $1 OFFSET $2
        "#
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    let sales = rows
        .into_iter()
        .map(Sale::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    attach_lines(db, sales).await
}

async fn attach_lines(db: &PgPool, sales: Vec<Sale>) -> AppResult<Vec<SaleWithLines>> {
    let ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
    let lines = sqlx::query_as::<_, SaleLine>(&format!(
        r#"
        SELECT {LINE_COLUMNS}
          FROM sale_lines
         WHERE sale_id = ANY($1)
         ORDER BY sale_id, position
        "#
    ))
    .bind(&ids)
    .fetch_all(db)
    .await?;

    let mut by_sale: HashMap<Uuid, Vec<SaleLine>> = HashMap::new();
    for line in lines {
        by_sale.entry(line.sale_id).or_default().push(line);
    }
    Ok(sales
        .into_iter()
        .map(|sale| SaleWithLines {
            lines: by_sale.remove(&sale.id).unwrap_or_default(),
            sale,
        })
        .collect())
}
