use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::common::IdValue, models::OrderDetail};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub id: Option<IdValue>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub order_id: i64,
    pub total_sum: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderDetail>,
}
