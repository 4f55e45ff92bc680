use crate::entities::{order_entity, order_item_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub movie_id: i64,
    #[schema(example = 1)]
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i64,
    pub movie_id: i64,
    pub movie_name: String,
    pub price: i64,
    pub quantity: i32,
}

impl OrderItemResponse {
    pub fn from_model(m: order_item_entity::Model, movie_name: String) -> Self {
        Self {
            id: m.id,
            movie_id: m.movie_id,
            movie_name,
            price: m.price,
            quantity: m.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub total: i64,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItemResponse>,
}

impl OrderResponse {
    pub fn from_model(m: order_entity::Model, items: Vec<OrderItemResponse>) -> Self {
        Self {
            id: m.id,
            total: m.total,
            date: m.date,
            items,
        }
    }
}
