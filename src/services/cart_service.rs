//! Cart operations.
//!
//! The cart reserves inventory: adding a line deducts product stock at add
//! time, and quantity updates settle the difference. Removing a line or
//! clearing the cart does NOT restock — checkout assumes the reservation
//! already happened, and abandoned removals keep the deduction (known gap,
//! kept for compatibility with the existing storefront).

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddToCartRequest, CartDetail, CartLine, CartMutation, ClearedCart, RemoveFromCartRequest,
        UpdateCartItemRequest,
    },
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{self, Column as CartCol, Entity as Carts},
        products::{Column as ProductCol, Entity as Products, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::product_service::{product_brief, resolve_or_not_found},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartDetail>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let detail = load_cart_detail(&state.orm, &cart, &state.config.media_base_url).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartMutation>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let product = resolve_or_not_found(
        &state.orm,
        &payload.product_id,
        state.config.resolver_match_policy,
    )
    .await?;
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;

    // Conditional decrement: the WHERE clause is the stock check, so two
    // concurrent adds can never both pass it and drive stock negative.
    let updated = Products::update_many()
        .col_expr(
            ProductCol::Stock,
            Expr::col(ProductCol::Stock).sub(payload.quantity),
        )
        .filter(ProductCol::Id.eq(product.id))
        .filter(ProductCol::Stock.gte(payload.quantity))
        .exec(&txn)
        .await?;
    if updated.rows_affected == 0 {
        let remaining = Products::find_by_id(product.id)
            .one(&txn)
            .await?
            .map(|p| p.stock)
            .unwrap_or(0);
        return Err(AppError::InsufficientStock {
            name: product.name.clone(),
            remaining,
        });
    }

    // Single-statement upsert against UNIQUE (cart_id, product_id):
    // repeated adds accumulate instead of duplicating rows.
    let item = CartItems::insert(cart_items::ActiveModel {
        id: NotSet,
        cart_id: Set(cart.id),
        product_id: Set(product.id),
        quantity: Set(payload.quantity),
    })
    .on_conflict(
        OnConflict::columns([CartItemCol::CartId, CartItemCol::ProductId])
            .value(
                CartItemCol::Quantity,
                Expr::col((CartItems, CartItemCol::Quantity)).add(payload.quantity),
            )
            .to_owned(),
    )
    .exec_with_returning(&txn)
    .await?;

    let stock_after = Products::find_by_id(product.id)
        .one(&txn)
        .await?
        .map(|p| p.stock)
        .unwrap_or(0);

    txn.commit().await?;

    let stock_balance = match state.config.stock_display_sentinel {
        Some(sentinel) if stock_after == sentinel => None,
        _ => Some(stock_after),
    };

    let message = format!("Added {} x {} to cart", payload.quantity, product.name);
    let line = cart_line(&item, &product, &state.config.media_base_url);
    Ok(ApiResponse::success(
        message,
        CartMutation {
            item: line,
            stock_balance,
        },
        None,
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveFromCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let product = resolve_or_not_found(
        &state.orm,
        &payload.product_id,
        state.config.resolver_match_policy,
    )
    .await?;
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found."))?;

    // No restock here: the reservation taken at add time stays deducted.
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Item not found"));
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartMutation>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".into()));
    }

    let product = resolve_or_not_found(
        &state.orm,
        &payload.product_id,
        state.config.resolver_match_policy,
    )
    .await?;
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;

    let item = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("This product is not in your cart"))?;

    let diff = payload.quantity - item.quantity;
    if diff > 0 {
        // Growing the line reserves more stock, same conditional check as add.
        let updated = Products::update_many()
            .col_expr(ProductCol::Stock, Expr::col(ProductCol::Stock).sub(diff))
            .filter(ProductCol::Id.eq(product.id))
            .filter(ProductCol::Stock.gte(diff))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            let remaining = Products::find_by_id(product.id)
                .one(&txn)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            return Err(AppError::InsufficientStock {
                name: product.name.clone(),
                remaining,
            });
        }
    } else if diff < 0 {
        // Shrinking the line returns the difference to the shelf.
        Products::update_many()
            .col_expr(
                ProductCol::Stock,
                Expr::col(ProductCol::Stock).add(diff.abs()),
            )
            .filter(ProductCol::Id.eq(product.id))
            .exec(&txn)
            .await?;
    }

    let mut active: cart_items::ActiveModel = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&txn).await?;

    let stock_after = Products::find_by_id(product.id)
        .one(&txn)
        .await?
        .map(|p| p.stock)
        .unwrap_or(0);

    txn.commit().await?;

    let message = format!("Updated {} to quantity {}", product.name, item.quantity);
    let line = cart_line(&item, &product, &state.config.media_base_url);
    Ok(ApiResponse::success(
        message,
        CartMutation {
            item: line,
            stock_balance: Some(stock_after),
        },
        None,
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<ClearedCart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    // Clearing does not restock either; see the module docs.
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        format!("Cleared cart. Removed {} items.", result.rows_affected),
        ClearedCart {
            removed: result.rows_affected,
        },
        Some(Meta::empty()),
    ))
}

/// Every user has at most one cart, created lazily on first touch.
pub(crate) async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> Result<carts::Model, AppError> {
    if let Some(cart) = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(cart);
    }

    let inserted = carts::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        created_at: NotSet,
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(cart) => Ok(cart),
        // Lost a create race; the unique user_id row exists now.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Carts::find()
                .filter(CartCol::UserId.eq(user_id))
                .one(conn)
                .await?
                .ok_or_else(|| AppError::not_found("Cart not found."))
        }
        Err(err) => Err(err.into()),
    }
}

async fn load_cart_detail<C: ConnectionTrait>(
    conn: &C,
    cart: &carts::Model,
    media_base: &str,
) -> Result<CartDetail, AppError> {
    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .find_also_related(Products)
        .order_by_asc(CartItemCol::Id)
        .all(conn)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    let mut total = Decimal::ZERO;
    for (item, product) in rows {
        // Lines cascade away with their product, so a missing join row only
        // happens mid-delete; skip rather than fail the read.
        let Some(product) = product else { continue };
        let line = cart_line(&item, &product, media_base);
        total += line.total_price;
        items.push(line);
    }

    Ok(CartDetail {
        id: cart.id,
        items,
        total_price: total,
    })
}

fn cart_line(item: &cart_items::Model, product: &ProductModel, media_base: &str) -> CartLine {
    CartLine {
        id: item.id,
        product: product_brief(product, media_base),
        quantity: item.quantity,
        total_price: product.price * Decimal::from(item.quantity),
    }
}
