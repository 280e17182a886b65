use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use crate::{
    auth::{
        extractors::{AdminUser, AuthUser},
        repo_types::Role,
    },
    error::AppResult,
    extract::ApiQuery,
    reports::{
        dto::{DashboardQuery, DashboardStats, UsersPage, UsersQuery},
        services,
    },
    state::AppState,
};

pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/users", get(list_users))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    _user: AuthUser,
    ApiQuery(q): ApiQuery<DashboardQuery>,
) -> AppResult<Json<DashboardStats>> {
    let stats = services::dashboard(state.store.as_ref(), q.include_admins).await?;
    debug!(?stats, "dashboard computed");
    Ok(Json(stats))
}

/// Paged listing of USER accounts. Pages are 1-based.
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiQuery(q): ApiQuery<UsersQuery>,
) -> AppResult<Json<UsersPage>> {
    let page_size = state.config.users_page_size;
    let offset = services::page_offset(q.page, page_size)?;
    let (users, total_users) = state
        .store
        .list_users(Role::User, page_size, offset)
        .await?;
    Ok(Json(UsersPage {
        users: users.into_iter().map(Into::into).collect(),
        page: q.page,
        page_size,
        total_users,
        total_pages: services::total_pages(total_users, page_size),
    }))
}
