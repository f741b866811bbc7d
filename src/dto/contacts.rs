use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{dto::common::IdValue, entity::enums::ContactType, models::ContactView};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContactRequest {
    #[serde(rename = "type")]
    pub contact_type: ContactType,
    pub value: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateContactRequest {
    pub id: Option<IdValue>,
    #[serde(rename = "type")]
    pub contact_type: Option<ContactType>,
    pub value: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactList {
    pub items: Vec<ContactView>,
}
