use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, CreateUserRequest, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        extractors::{AdminUser, AuthUser},
        repo_types::{Role, User},
        services::{normalize_email, prepare_new_user, verify_password, JwtKeys},
    },
    error::{AppError, AppResult},
    extract::ApiJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/auth/users", post(create_user))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let (access_token, refresh_token) = keys.sign_pair(&user)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

/// Public signup. Always creates a USER account.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let new = prepare_new_user(
        &payload.name,
        &payload.username,
        &payload.email,
        &payload.password,
        Role::User,
    )
    .inspect_err(|e| warn!(error = %e, "register rejected"))?;

    let user = state.store.create_user(new).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        warn!(%email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(%email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    // Reload so the new pair carries the current role.
    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = state
        .store
        .find_user_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    Ok(Json(user.into()))
}

/// Admin-only account creation with an explicit role.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<PublicUser>)> {
    let new = prepare_new_user(
        &payload.name,
        &payload.username,
        &payload.email,
        &payload.password,
        payload.role,
    )?;
    let user = state.store.create_user(new).await?;
    info!(user_id = %user.id, role = %user.role, created_by = %admin.id, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}
