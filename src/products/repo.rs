use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{unique_violation, AppError, AppResult};
use crate::products::repo_types::{NewProduct, Product, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, name, description, price, cost_price, sku, category, \
                               stock, low_stock_alert, created_at, updated_at";

fn sku_conflict(e: sqlx::Error) -> AppError {
    match unique_violation(&e) {
        Some(_) => AppError::Conflict("SKU already exists".into()),
        None => e.into(),
    }
}

pub async fn create(db: &PgPool, new: &NewProduct) -> AppResult<Product> {
    let product = sqlx::query_as::<_, Product>(&format!(
        r#"
        INSERT INTO products (id, name, description, price, cost_price, sku, category, stock, low_stock_alert)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.cost_price)
    .bind(&new.sku)
    .bind(&new.category)
    .bind(new.stock)
    .bind(new.low_stock_alert)
    .fetch_one(db)
    .await
    .map_err(sku_conflict)?;
    Ok(product)
}

pub async fn get_by_id(db: &PgPool, id: Uuid) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::not_found("product", id))
}

pub async fn list(db: &PgPool) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_low_stock(db: &PgPool) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(&format!(
        r#"
        SELECT {PRODUCT_COLUMNS}
          FROM products
         WHERE stock <= low_stock_alert
         ORDER BY stock ASC, name, id
        "#
    ))
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Partial update: NULL parameters keep the current column value.
pub async fn update(db: &PgPool, id: Uuid, patch: &ProductPatch) -> AppResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
           SET name            = COALESCE($2, name),
               description     = COALESCE($3, description),
               price           = COALESCE($4, price),
               cost_price      = COALESCE($5, cost_price),
               sku             = COALESCE($6, sku),
               category        = COALESCE($7, category),
               stock           = COALESCE($8, stock),
               low_stock_alert = COALESCE($9, low_stock_alert),
               updated_at      = now()
         WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.price)
    .bind(patch.cost_price)
    .bind(&patch.sku)
    .bind(&patch.category)
    .bind(patch.stock)
    .bind(patch.low_stock_alert)
    .fetch_optional(db)
    .await
    .map_err(sku_conflict)?
    .ok_or_else(|| AppError::not_found("product", id))
}

/// Hard delete. Sale lines keep their snapshots and lose the reference.
pub async fn delete(db: &PgPool, id: Uuid) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("product", id));
    }
    Ok(())
}
