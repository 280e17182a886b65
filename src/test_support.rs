//! Fixtures shared by the handler tests.

use axum::{body::Body, http::Request, response::Response};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::auth::repo_types::{Role, User};
use crate::auth::services::{prepare_new_user, JwtKeys};
use crate::products::repo_types::{NewProduct, Product};
use crate::state::AppState;

pub const PASSWORD: &str = "s3cret-pass";

pub async fn seed_user(state: &AppState, email: &str, role: Role) -> User {
    let username = email.split('@').next().unwrap_or(email);
    let new = prepare_new_user("Test User", username, email, PASSWORD, role).unwrap();
    state.store.create_user(new).await.unwrap()
}

pub fn bearer(state: &AppState, user: &User) -> String {
    let keys: JwtKeys = axum::extract::FromRef::from_ref(state);
    format!("Bearer {}", keys.sign_access(user.id, user.role).unwrap())
}

pub fn authed(
    state: &AppState,
    user: &User,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", bearer(state, user));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn read_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn seed_product(state: &AppState, sku: &str, stock: i32, low_stock_alert: i32) -> Product {
    state
        .store
        .create_product(NewProduct {
            name: format!("Product {sku}"),
            description: String::new(),
            price: Decimal::new(999, 2),
            cost_price: Decimal::new(500, 2),
            sku: sku.into(),
            category: "general".into(),
            stock,
            low_stock_alert,
        })
        .await
        .unwrap()
}
