use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{
    contacts,
    enums::{ContactType, OrderStatus, UserType},
    users,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub position: String,
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserProfile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            company: user.company,
            position: user.position,
            username: user.username,
            user_type: user.user_type,
            is_active: user.is_active,
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShopRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductParameterView {
    pub parameter: String,
    pub value: String,
}

/// A single shop's offer for a product.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductListing {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub model: String,
    pub price: i64,
    pub price_rrc: i64,
    pub quantity: i32,
    pub shop: ShopRef,
    pub product_parameters: Vec<ProductParameterView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductWithListings {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    pub products_info: Vec<ProductListing>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithProducts {
    pub id: i64,
    pub category: String,
    pub products: Vec<ProductWithListings>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItemView {
    pub id: i64,
    /// ProductInfo id
    pub product_id: i64,
    pub quantity: i32,
    pub product: Option<ProductListing>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    pub id: i64,
    pub dt: DateTime<Utc>,
    pub user_id: i64,
    pub status: OrderStatus,
    pub ordered_items: Vec<OrderItemView>,
    pub total_sum: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactView {
    pub id: i64,
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub value: String,
}

impl From<contacts::Model> for ContactView {
    fn from(contact: contacts::Model) -> Self {
        Self {
            id: contact.id,
            contact_type: contact.contact_type,
            value: contact.value,
        }
    }
}
