use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::products::CategoryList,
    error::AppResult,
    models::ProductWithListings,
    response::ApiResponse,
    routes::{extract::ApiQuery, params::ProductQuery},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/product/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("name" = Option<String>, Query, description = "Exact category name"),
        ("shop" = Option<String>, Query, description = "Exact shop name"),
        ("search" = Option<String>, Query, description = "Substring of the category name"),
    ),
    responses(
        (status = 200, description = "Categories with their products and shop listings", body = ApiResponse<CategoryList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = product_service::list_categories(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(
        ("id" = i64, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product with every shop's listing", body = ApiResponse<ProductWithListings>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<ProductWithListings>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}
