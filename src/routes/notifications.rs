use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};

use crate::{
    error::AppResult,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::notification_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/{id}/mark_read", patch(mark_read))
}

#[utoipa::path(get, path = "/api/notifications", security(("bearer_auth" = [])), tag = "Notifications")]
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = notification_service::list_notifications(&state.pool, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/notifications/{id}/mark_read", security(("bearer_auth" = [])), tag = "Notifications")]
pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = notification_service::mark_read(&state.pool, &user, id).await?;
    Ok(Json(resp))
}
