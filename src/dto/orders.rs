use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem};

/// Returned by checkout: the generated order code plus the fields the
/// storefront uses to render the confirmation step.
#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub status: String,
    pub progress: i32,
    pub source: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}

/// Orders are immutable after creation except for these two fields.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub progress: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderSummary {
    pub total_orders: i64,
    pub total_spent: Decimal,
}
