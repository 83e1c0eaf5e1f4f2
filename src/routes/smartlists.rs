use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::smartlists::{
        AddListItemRequest, CreateSmartListRequest, RemoveListItemRequest, SmartListDetail,
        UpdateListItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::{order_service, smartlist_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_smartlists).post(create_smartlist))
        .route("/{id}", get(get_smartlist).delete(delete_smartlist))
        .route("/{id}/add_item", post(add_item))
        .route("/{id}/update_item", post(update_item))
        .route("/{id}/remove_item", post(remove_item))
        .route("/{id}/order_all", post(order_all))
}

#[utoipa::path(get, path = "/api/smartlists", security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn list_smartlists(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::list_smartlists(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/smartlists",
    request_body = CreateSmartListRequest,
    responses(
        (status = 201, description = "Created", body = ApiResponse<SmartListDetail>),
        (status = 200, description = "Existing list with that name", body = ApiResponse<SmartListDetail>),
    ),
    security(("bearer_auth" = [])),
    tag = "Smart Lists"
)]
pub async fn create_smartlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSmartListRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SmartListDetail>>)> {
    let (created, resp) = smartlist_service::create_smartlist(&state, &user, payload).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(resp)))
}

#[utoipa::path(get, path = "/api/smartlists/{id}", security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn get_smartlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::get_smartlist(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(delete, path = "/api/smartlists/{id}", security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn delete_smartlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::delete_smartlist(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/smartlists/{id}/add_item", request_body = AddListItemRequest, security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddListItemRequest>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::add_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/smartlists/{id}/update_item", request_body = UpdateListItemRequest, security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateListItemRequest>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::update_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/smartlists/{id}/remove_item", request_body = RemoveListItemRequest, security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RemoveListItemRequest>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = smartlist_service::remove_item(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(post, path = "/api/smartlists/{id}/order_all", security(("bearer_auth" = [])), tag = "Smart Lists")]
pub async fn order_all(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<impl axum::response::IntoResponse> {
    let resp = order_service::order_all(&state, &user, id).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
