use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{models::ProductBrief, resolver::ProductKey};

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSmartListRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddListItemRequest {
    #[serde(alias = "productId")]
    pub product_id: ProductKey,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateListItemRequest {
    pub item_id: i64,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveListItemRequest {
    pub item_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SmartListItemDto {
    pub id: i64,
    pub product: Option<ProductBrief>,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SmartListDetail {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SmartListItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SmartListList {
    pub items: Vec<SmartListDetail>,
}
