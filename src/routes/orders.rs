use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::orders::UpdateOrderRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}", get(get_order).patch(update_order))
}

#[utoipa::path(post, path = "/api/checkout", security(("bearer_auth" = [])), tag = "Orders")]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::checkout(&state, &user).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(get, path = "/api/orders", security(("bearer_auth" = [])), tag = "Orders")]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/orders/{id}", security(("bearer_auth" = [])), tag = "Orders")]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::get_order(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(patch, path = "/api/orders/{id}", request_body = UpdateOrderRequest, security(("bearer_auth" = [])), tag = "Orders")]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::update_order(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(get, path = "/api/summary", security(("bearer_auth" = [])), tag = "Orders")]
pub async fn summary(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::summary(&state, &user).await?;
    Ok(Json(resp))
}
