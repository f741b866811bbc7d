use axum::{Json, Router, extract::State, routing::get};
use serde_json::Value;

use crate::{
    dto::{
        basket::{BasketItemRequest, CreatedCount, DeletedCount, UpdatedCount},
        common::DeleteItemsRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::OrderDetail,
    response::ApiResponse,
    routes::extract::ApiJson,
    services::basket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/basket",
        get(view_basket)
            .post(add_to_basket)
            .put(update_basket)
            .delete(remove_from_basket),
    )
}

#[utoipa::path(
    get,
    path = "/api/basket",
    responses(
        (status = 200, description = "Current basket, `data` is null when there is none", body = ApiResponse<OrderDetail>),
        (status = 403, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn view_basket(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Option<OrderDetail>>>> {
    let resp = basket_service::view_basket(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/basket",
    request_body = Vec<BasketItemRequest>,
    responses(
        (status = 200, description = "Items added", body = ApiResponse<CreatedCount>),
        (status = 400, description = "Unknown listing, bad quantity or not enough stock"),
        (status = 409, description = "Listing already in basket")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn add_to_basket(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(items): ApiJson<Vec<BasketItemRequest>>,
) -> AppResult<Json<ApiResponse<CreatedCount>>> {
    let resp = basket_service::add_items(&state, &user, items).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/basket",
    request_body = Vec<BasketItemRequest>,
    responses(
        (status = 200, description = "Quantities updated; non-integer entries are skipped", body = ApiResponse<UpdatedCount>),
        (status = 400, description = "Quantity out of range")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn update_basket(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(items): ApiJson<Vec<Value>>,
) -> AppResult<Json<ApiResponse<UpdatedCount>>> {
    let resp = basket_service::update_items(&state, &user, items).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/basket",
    request_body = DeleteItemsRequest,
    responses(
        (status = 200, description = "Items removed", body = ApiResponse<DeletedCount>),
        (status = 400, description = "No valid ids or nothing matched")
    ),
    security(("bearer_auth" = [])),
    tag = "Basket"
)]
pub async fn remove_from_basket(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<DeleteItemsRequest>,
) -> AppResult<Json<ApiResponse<DeletedCount>>> {
    let resp = basket_service::remove_items(&state, &user, payload).await?;
    Ok(Json(resp))
}
