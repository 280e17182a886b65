use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User, UserRow};
use crate::error::{unique_violation, AppError, AppResult};

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, role, created_at, updated_at";

/// Find a user by email.
pub async fn find_by_email(db: &PgPool, email: &str) -> AppResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;
    row.map(User::try_from).transpose()
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> AppResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    row.map(User::try_from).transpose()
}

/// Create a new user with hashed password.
pub async fn create(db: &PgPool, new: &NewUser) -> AppResult<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        r#"
        INSERT INTO users (id, name, username, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(&new.name)
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(new.role.as_str())
    .fetch_one(db)
    .await
    .map_err(|e| match unique_violation(&e) {
        Some("users_username_key") => AppError::Conflict("Username already taken".into()),
        Some(_) => AppError::Conflict("Email already registered".into()),
        None => e.into(),
    })?;
    User::try_from(row)
}
