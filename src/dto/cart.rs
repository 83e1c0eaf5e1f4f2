use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::ProductBrief, resolver::ProductKey};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductKey,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductKey,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductKey,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: i64,
    pub product: ProductBrief,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartDetail {
    pub id: i64,
    pub items: Vec<CartLine>,
    pub total_price: Decimal,
}

/// Result of an add/update mutation. `stock_balance` is None when the
/// configured display sentinel suppresses it.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartMutation {
    pub item: CartLine,
    pub stock_balance: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClearedCart {
    pub removed: u64,
}
