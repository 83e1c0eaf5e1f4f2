//! Checkout and order-all: the pipeline that freezes a cart or smart list
//! into an immutable order.
//!
//! Stock handling is intentionally asymmetric and mirrors the storefront it
//! serves: cart lines reserved stock when they were added, so checkout does
//! not deduct again; smart lists never reserve, so order-all neither checks
//! nor deducts. Do not unify the two without a product decision.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutReceipt, OrderList, OrderSummary, OrderWithItems, UpdateOrderRequest},
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::{Column as ProductCol, Entity as Products},
        smart_list_items::{self, Column as ListItemCol, Entity as SmartListItems},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, OrderSource, OrderStatus},
    notify::{OrderEvent, notify_order_event},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service::product_brief,
    services::smartlist_service::find_owned,
    state::AppState,
};

/// One source line joined with the product it points at, read under
/// FOR UPDATE so prices and quantities hold still for the duration of the
/// conversion.
#[derive(Debug, FromQueryResult)]
struct SourceLine {
    product_id: i64,
    quantity: i32,
    price: Decimal,
}

pub async fn checkout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CheckoutReceipt>> {
    let txn = state.orm.begin().await?;

    // Checkout requires an existing cart; it does not create one.
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found."))?;

    let lines = SourceLine::from_cart(&txn, cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCollection("Cart"));
    }

    // Prices are read now and frozen into the order; stock was already
    // deducted when each line entered the cart.
    let total: Decimal = lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum();

    let order = insert_order(&txn, user.user_id, total, OrderSource::Cart).await?;
    insert_order_lines(&txn, order.id, &lines).await?;

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) =
        notify_order_event(&state.orm, user.user_id, &order.order_id, OrderEvent::Placed).await
    {
        tracing::warn!(error = %err, order = %order.order_id, "order notification failed");
    }

    tracing::info!(order = %order.order_id, lines = lines.len(), "checkout complete");

    Ok(ApiResponse::success(
        "Order placed successfully!",
        CheckoutReceipt {
            order_id: order.order_id,
            status: order.status,
            progress: order.progress,
            source: order.source,
        },
        Some(Meta::empty()),
    ))
}

pub async fn order_all(
    state: &AppState,
    user: &AuthUser,
    list_id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let list = find_owned(&txn, user.user_id, list_id).await?;

    let lines = SourceLine::from_smart_list(&txn, list.id).await?;
    if lines.is_empty() {
        return Err(AppError::EmptyCollection("Smart list"));
    }

    let total: Decimal = lines
        .iter()
        .map(|line| line.price * Decimal::from(line.quantity))
        .sum();

    let order = insert_order(&txn, user.user_id, total, OrderSource::Smartlist).await?;
    insert_order_lines(&txn, order.id, &lines).await?;

    // The items move into the order; the list itself survives, emptied.
    SmartListItems::delete_many()
        .filter(ListItemCol::SmartListId.eq(list.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if let Err(err) =
        notify_order_event(&state.orm, user.user_id, &order.order_id, OrderEvent::Placed).await
    {
        tracing::warn!(error = %err, order = %order.order_id, "order notification failed");
    }

    let items = load_order_items(&state.orm, order.id, &state.config.media_base_url).await?;
    let message = format!(
        "All items from '{}' have been ordered successfully.",
        list.name
    );
    Ok(ApiResponse::success(
        message,
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    // Newest orders first so the storefront shows the latest on top.
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        let lines = load_order_items(&state.orm, order.id, &state.config.media_base_url).await?;
        items.push(OrderWithItems {
            order: order_from_entity(order),
            items: lines,
        });
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_owned_order(&state.orm, user.user_id, id).await?;
    let items = load_order_items(&state.orm, order.id, &state.config.media_base_url).await?;
    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Status and progress are the only mutable fields of an order. There is no
/// enforced transition graph; callers set the status directly.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let status = match payload.status.as_deref() {
        Some(raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("Invalid status '{raw}'")))?,
        ),
        None => None,
    };
    if let Some(progress) = payload.progress {
        if progress < 0 {
            return Err(AppError::BadRequest("Progress must not be negative".into()));
        }
    }

    let order = find_owned_order(&state.orm, user.user_id, id).await?;
    let previous_status = order.status.clone();

    let mut active: OrderActive = order.into();
    if let Some(status) = status {
        active.status = Set(status.as_str().to_string());
    }
    if let Some(progress) = payload.progress {
        active.progress = Set(progress);
    }
    let order = active.update(&state.orm).await?;

    if order.status != previous_status {
        let event = match OrderStatus::parse(&order.status) {
            Some(OrderStatus::Shipped) => Some(OrderEvent::Shipped),
            Some(OrderStatus::Delivered) => Some(OrderEvent::Delivered),
            _ => None,
        };
        if let Some(event) = event {
            if let Err(err) =
                notify_order_event(&state.orm, user.user_id, &order.order_id, event).await
            {
                tracing::warn!(error = %err, order = %order.order_id, "order notification failed");
            }
        }
    }

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn summary(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderSummary>> {
    let total_orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await? as i64;

    #[derive(Debug, FromQueryResult)]
    struct SpentRow {
        total_spent: Option<Decimal>,
    }

    // Sums the frozen order totals; item prices are never re-aggregated.
    let total_spent = Orders::find()
        .select_only()
        .column_as(OrderCol::Total.sum(), "total_spent")
        .filter(OrderCol::UserId.eq(user.user_id))
        .into_model::<SpentRow>()
        .one(&state.orm)
        .await?
        .and_then(|row| row.total_spent)
        .unwrap_or(Decimal::ZERO);

    Ok(ApiResponse::success(
        "OK",
        OrderSummary {
            total_orders,
            total_spent,
        },
        Some(Meta::empty()),
    ))
}

impl SourceLine {
    async fn from_cart<C: ConnectionTrait>(conn: &C, cart_id: i64) -> Result<Vec<Self>, AppError> {
        let lines = CartItems::find()
            .select_only()
            .column_as(CartItemCol::ProductId, "product_id")
            .column_as(CartItemCol::Quantity, "quantity")
            .column_as(ProductCol::Price, "price")
            .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
            .filter(CartItemCol::CartId.eq(cart_id))
            .order_by_asc(CartItemCol::Id)
            .lock(LockType::Update)
            .into_model::<SourceLine>()
            .all(conn)
            .await?;
        Ok(lines)
    }

    async fn from_smart_list<C: ConnectionTrait>(
        conn: &C,
        list_id: i64,
    ) -> Result<Vec<Self>, AppError> {
        let lines = SmartListItems::find()
            .select_only()
            .column_as(ListItemCol::ProductId, "product_id")
            .column_as(ListItemCol::Quantity, "quantity")
            .column_as(ProductCol::Price, "price")
            .join(JoinType::InnerJoin, smart_list_items::Relation::Products.def())
            .filter(ListItemCol::SmartListId.eq(list_id))
            .order_by_asc(ListItemCol::Id)
            .lock(LockType::Update)
            .into_model::<SourceLine>()
            .all(conn)
            .await?;
        Ok(lines)
    }
}

async fn insert_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    total: Decimal,
    source: OrderSource,
) -> Result<OrderModel, AppError> {
    let business_name = Users::find_by_id(user_id)
        .one(conn)
        .await?
        .map(|u| u.business_name)
        .unwrap_or_default();
    let order_code = generate_order_code(conn, &business_name).await?;

    let order = OrderActive {
        id: NotSet,
        user_id: Set(user_id),
        order_id: Set(order_code),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        progress: Set(1),
        total: Set(total),
        source: Set(source.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(order)
}

async fn insert_order_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    lines: &[SourceLine],
) -> Result<(), AppError> {
    for line in lines {
        order_items::ActiveModel {
            id: NotSet,
            order_id: Set(order_id),
            product_id: Set(Some(line.product_id)),
            quantity: Set(line.quantity),
            price: Set(line.price),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

/// Pick an order code nobody uses yet. The 7-hex token makes collisions
/// vanishingly rare; the UNIQUE constraint on orders.order_id arbitrates
/// whatever races past this check.
async fn generate_order_code<C: ConnectionTrait>(
    conn: &C,
    business_name: &str,
) -> Result<String, AppError> {
    let mut candidate = build_order_code(business_name);
    for _ in 0..3 {
        let taken = Orders::find()
            .filter(OrderCol::OrderId.eq(candidate.as_str()))
            .one(conn)
            .await?
            .is_some();
        if !taken {
            return Ok(candidate);
        }
        candidate = build_order_code(business_name);
    }
    Ok(candidate)
}

fn build_order_code(business_name: &str) -> String {
    let year = Utc::now().format("%Y");
    let initial = business_name
        .chars()
        .next()
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('X');
    let token: String = Uuid::new_v4().simple().to_string()[..7].to_uppercase();
    format!("ORD-{year}-{initial}{token}")
}

async fn find_owned_order<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: i64,
) -> Result<OrderModel, AppError> {
    Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found."))
}

async fn load_order_items<C: ConnectionTrait>(
    conn: &C,
    order_id: i64,
    media_base: &str,
) -> Result<Vec<OrderItem>, AppError> {
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .find_also_related(Products)
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(item, product)| OrderItem {
            id: item.id,
            // None once the product is deleted; the frozen price remains.
            product: product.as_ref().map(|p| product_brief(p, media_base)),
            quantity: item.quantity,
            price: item.price,
        })
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        order_id: model.order_id,
        status: model.status,
        progress: model.progress,
        total: model.total,
        source: model.source,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::build_order_code;

    fn assert_code_shape(code: &str, expected_initial: char) {
        let parts: Vec<&str> = code.splitn(3, '-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 4);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 8);
        assert_eq!(parts[2].chars().next().unwrap(), expected_initial);
        assert!(
            parts[2][1..]
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        );
    }

    #[test]
    fn order_codes_match_the_documented_shape() {
        assert_code_shape(&build_order_code("Chiamo Foods"), 'C');
        assert_code_shape(&build_order_code("acme"), 'A');
    }

    #[test]
    fn empty_business_names_fall_back_to_x() {
        assert_code_shape(&build_order_code(""), 'X');
    }

    #[test]
    fn codes_are_effectively_unique() {
        let a = build_order_code("Acme");
        let b = build_order_code("Acme");
        assert_ne!(a, b);
    }
}
