//! Smart lists: named, persistent shopping lists.
//!
//! Unlike the cart, smart-list mutations never touch product stock — a list
//! is a wish list, not an inventory hold. The order-all path in
//! `order_service` keeps the same property.

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    dto::smartlists::{
        AddListItemRequest, CreateSmartListRequest, RemoveListItemRequest, SmartListDetail,
        SmartListItemDto, SmartListList, UpdateListItemRequest,
    },
    entity::{
        products::Entity as Products,
        smart_list_items::{self, Column as ListItemCol, Entity as SmartListItems},
        smart_lists::{self, Column as ListCol, Entity as SmartLists},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::product_service::{product_brief, resolve_or_not_found},
    state::AppState,
};

const DEFAULT_LIST_NAME: &str = "Default List";

pub async fn list_smartlists(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SmartListList>> {
    let lists = SmartLists::find()
        .filter(ListCol::UserId.eq(user.user_id))
        .order_by_desc(ListCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(lists.len());
    for list in lists {
        items.push(load_detail(&state.orm, list, &state.config.media_base_url).await?);
    }

    Ok(ApiResponse::success(
        "OK",
        SmartListList { items },
        Some(Meta::empty()),
    ))
}

/// Get-or-create by (user, name). Returns `true` when a new list was made,
/// so the route can answer 201 vs 200.
pub async fn create_smartlist(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSmartListRequest,
) -> AppResult<(bool, ApiResponse<SmartListDetail>)> {
    let name = payload
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_LIST_NAME.to_string());

    if let Some(existing) = find_by_name(&state.orm, user.user_id, &name).await? {
        let detail = load_detail(&state.orm, existing, &state.config.media_base_url).await?;
        return Ok((false, ApiResponse::success("Smart list", detail, None)));
    }

    let list = smart_lists::ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        name: Set(name),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let detail = load_detail(&state.orm, list, &state.config.media_base_url).await?;
    Ok((true, ApiResponse::success("Smart list created", detail, None)))
}

pub async fn get_smartlist(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<SmartListDetail>> {
    let list = find_owned(&state.orm, user.user_id, id).await?;
    let detail = load_detail(&state.orm, list, &state.config.media_base_url).await?;
    Ok(ApiResponse::success("OK", detail, None))
}

pub async fn delete_smartlist(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = SmartLists::delete_many()
        .filter(ListCol::Id.eq(id))
        .filter(ListCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Smart list not found."));
    }

    Ok(ApiResponse::success(
        "Smartlist deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    list_id: i64,
    payload: AddListItemRequest,
) -> AppResult<ApiResponse<SmartListItemDto>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let list = find_owned(&state.orm, user.user_id, list_id).await?;
    let product = resolve_or_not_found(
        &state.orm,
        &payload.product_id,
        state.config.resolver_match_policy,
    )
    .await?;

    // Accumulating upsert against UNIQUE (smart_list_id, product_id); no
    // stock arithmetic on this path.
    let item = SmartListItems::insert(smart_list_items::ActiveModel {
        id: NotSet,
        smart_list_id: Set(list.id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
    })
    .on_conflict(
        OnConflict::columns([ListItemCol::SmartListId, ListItemCol::ProductId])
            .value(
                ListItemCol::Quantity,
                Expr::col((SmartListItems, ListItemCol::Quantity)).add(payload.quantity),
            )
            .to_owned(),
    )
    .exec_with_returning(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Item added",
        SmartListItemDto {
            id: item.id,
            product: Some(product_brief(&product, &state.config.media_base_url)),
            quantity: item.quantity,
        },
        None,
    ))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    list_id: i64,
    payload: UpdateListItemRequest,
) -> AppResult<ApiResponse<SmartListItemDto>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let list = find_owned(&state.orm, user.user_id, list_id).await?;
    let item = SmartListItems::find_by_id(payload.item_id)
        .filter(ListItemCol::SmartListId.eq(list.id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))?;

    let product = Products::find_by_id(item.product_id).one(&state.orm).await?;

    let mut active: smart_list_items::ActiveModel = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Item updated",
        SmartListItemDto {
            id: item.id,
            product: product
                .as_ref()
                .map(|p| product_brief(p, &state.config.media_base_url)),
            quantity: item.quantity,
        },
        None,
    ))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    list_id: i64,
    payload: RemoveListItemRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let list = find_owned(&state.orm, user.user_id, list_id).await?;
    let result = SmartListItems::delete_many()
        .filter(ListItemCol::Id.eq(payload.item_id))
        .filter(ListItemCol::SmartListId.eq(list.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Item not found"));
    }

    Ok(ApiResponse::success(
        "Item removed successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Fetch a list scoped to its owner; anyone else sees a 404.
pub(crate) async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: i64,
) -> Result<smart_lists::Model, AppError> {
    SmartLists::find_by_id(id)
        .filter(ListCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Smart list not found."))
}

async fn find_by_name<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    name: &str,
) -> Result<Option<smart_lists::Model>, AppError> {
    Ok(SmartLists::find()
        .filter(ListCol::UserId.eq(user_id))
        .filter(ListCol::Name.eq(name))
        .order_by_asc(ListCol::Id)
        .one(conn)
        .await?)
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    list: smart_lists::Model,
    media_base: &str,
) -> Result<SmartListDetail, AppError> {
    let rows = SmartListItems::find()
        .filter(ListItemCol::SmartListId.eq(list.id))
        .find_also_related(Products)
        .order_by_asc(ListItemCol::Id)
        .all(conn)
        .await?;

    let items = rows
        .into_iter()
        .map(|(item, product)| SmartListItemDto {
            id: item.id,
            product: product.as_ref().map(|p| product_brief(p, media_base)),
            quantity: item.quantity,
        })
        .collect();

    Ok(SmartListDetail {
        id: list.id,
        name: list.name,
        created_at: list.created_at.with_timezone(&Utc),
        items,
    })
}
