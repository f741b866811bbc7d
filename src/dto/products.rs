use serde::Serialize;
use utoipa::ToSchema;

use crate::models::CategoryWithProducts;

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<CategoryWithProducts>)]
    pub items: Vec<CategoryWithProducts>,
}
