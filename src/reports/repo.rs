use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::auth::repo_types::{Role, User, UserRow};
use crate::error::AppResult;

pub async fn count_users(db: &PgPool, include_admins: bool) -> AppResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE $1 OR role <> 'ADMIN'")
        .bind(include_admins)
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn count_products(db: &PgPool) -> AppResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn count_low_stock(db: &PgPool) -> AppResult<i64> {
    let n: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= low_stock_alert")
            .fetch_one(db)
            .await?;
    Ok(n)
}

pub async fn count_sales(db: &PgPool) -> AppResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
        .fetch_one(db)
        .await?;
    Ok(n)
}

pub async fn total_sales_amount(db: &PgPool) -> AppResult<Decimal> {
    let sum: Decimal = sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0) FROM sales")
        .fetch_one(db)
        .await?;
    Ok(sum)
}

/// One page of users with the given role, oldest first, plus the total match count.
pub async fn list_users_by_role(
    db: &PgPool,
    role: Role,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<User>, i64)> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT id, name, username, email, password_hash, role, created_at, updated_at
          FROM users
         WHERE role = $1
         ORDER BY created_at, id
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(role.as_str())
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
        .bind(role.as_str())
        .fetch_one(db)
        .await?;

    let users = rows
        .into_iter()
        .map(User::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    Ok((users, total))
}
