use std::collections::HashSet;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde_json::Value;

use crate::{
    audit,
    dto::{
        basket::{BasketItemRequest, CreatedCount, DeletedCount, UpdatedCount},
        common::DeleteItemsRequest,
    },
    entity::{
        enums::OrderStatus,
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_infos::Entity as ProductInfos,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::OrderDetail,
    response::ApiResponse,
    services::order_service::load_order_details,
    state::AppState,
};

pub const ALREADY_IN_BASKET: &str = "Товар уже находится в корзине";
const NOT_ENOUGH_STOCK: &str = "Такого количества нет в наличии";
const QUANTITY_TOO_SMALL: &str = "Нельзя заказать товар в количестве меньше 1";
const PRODUCT_NOT_FOUND: &str = "Товар не найден";

pub async fn view_basket(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Option<OrderDetail>>> {
    let basket = match find_basket(&state.orm, user.user_id).await? {
        Some(basket) => basket,
        None => return Ok(ApiResponse::success("OK", None, None)),
    };
    let detail = load_order_details(&state.orm, vec![basket]).await?.pop();
    Ok(ApiResponse::success("OK", detail, None))
}

/// Add listings to the basket. All-or-nothing: the first invalid item
/// aborts the request and nothing is written.
pub async fn add_items(
    state: &AppState,
    user: &AuthUser,
    items: Vec<BasketItemRequest>,
) -> AppResult<ApiResponse<CreatedCount>> {
    if items.is_empty() {
        return Err(AppError::missing_arguments());
    }

    let txn = state.orm.begin().await?;
    let basket = get_or_create_basket(&txn, user.user_id).await?;

    let mut in_basket: HashSet<i64> = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(basket.id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|item| item.product_info_id)
        .collect();

    let mut created = 0_u64;
    for item in &items {
        if item.quantity < 1 {
            return Err(AppError::validation(QUANTITY_TOO_SMALL));
        }
        let info = ProductInfos::find_by_id(item.product)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::validation(PRODUCT_NOT_FOUND))?;
        check_quantity(item.quantity, info.quantity)?;

        if !in_basket.insert(item.product) {
            return Err(AppError::Conflict(ALREADY_IN_BASKET.into()));
        }

        order_items::ActiveModel {
            id: NotSet,
            order_id: Set(basket.id),
            product_info_id: Set(item.product),
            quantity: Set(item.quantity),
        }
        .insert(&txn)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                AppError::Conflict(ALREADY_IN_BASKET.into())
            } else {
                err.into()
            }
        })?;
        created += 1;
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "basket_add",
        "order_items",
        serde_json::json!({ "order_id": basket.id, "created": created }),
    )
    .await;

    Ok(ApiResponse::success(
        "Товары добавлены",
        CreatedCount { created },
        None,
    ))
}

/// Change quantities of items already in the basket.
///
/// Entries whose `product` or `quantity` is not a JSON integer are skipped
/// without error and are not counted.
pub async fn update_items(
    state: &AppState,
    user: &AuthUser,
    items: Vec<Value>,
) -> AppResult<ApiResponse<UpdatedCount>> {
    if items.is_empty() {
        return Err(AppError::missing_arguments());
    }

    let txn = state.orm.begin().await?;
    let Some(basket) = find_basket(&txn, user.user_id).await? else {
        return Ok(ApiResponse::success("OK", UpdatedCount { updated: 0 }, None));
    };

    let mut updated = 0_u64;
    for entry in &items {
        let Some((product, quantity)) = integer_pair(entry) else {
            tracing::debug!(user_id = user.user_id, entry = %entry, "skipping non-integer basket update");
            continue;
        };

        let info = ProductInfos::find_by_id(product)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::validation(PRODUCT_NOT_FOUND))?;
        check_quantity(quantity, info.quantity)?;

        let result = OrderItems::update_many()
            .col_expr(OrderItemCol::Quantity, Expr::value(quantity))
            .filter(OrderItemCol::OrderId.eq(basket.id))
            .filter(OrderItemCol::ProductInfoId.eq(product))
            .exec(&txn)
            .await?;
        updated += result.rows_affected;
    }

    txn.commit().await?;
    Ok(ApiResponse::success(
        "Корзина обновлена",
        UpdatedCount { updated },
        None,
    ))
}

pub async fn remove_items(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteItemsRequest,
) -> AppResult<ApiResponse<DeletedCount>> {
    let ids = payload.ids();
    if ids.is_empty() {
        return Err(AppError::missing_arguments());
    }

    let nothing_deleted = || AppError::validation("Укажите корректные товары для удаления");
    let basket = find_basket(&state.orm, user.user_id)
        .await?
        .ok_or_else(nothing_deleted)?;

    let result = OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(basket.id))
        .filter(OrderItemCol::ProductInfoId.is_in(ids))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(nothing_deleted());
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "basket_remove",
        "order_items",
        serde_json::json!({ "order_id": basket.id, "deleted": result.rows_affected }),
    )
    .await;

    Ok(ApiResponse::success(
        "Товары удалены",
        DeletedCount {
            deleted: result.rows_affected,
        },
        None,
    ))
}

pub(crate) async fn find_basket<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> AppResult<Option<OrderModel>> {
    let basket = Orders::find()
        .filter(OrderCol::UserId.eq(user_id))
        .filter(OrderCol::Status.eq(OrderStatus::Basket))
        .one(conn)
        .await?;
    Ok(basket)
}

/// The partial unique index on `orders(user_id) WHERE status = 'basket'`
/// makes concurrent callers converge on a single row.
pub(crate) async fn get_or_create_basket<C: ConnectionTrait>(
    conn: &C,
    user_id: i64,
) -> AppResult<OrderModel> {
    if let Some(basket) = find_basket(conn, user_id).await? {
        return Ok(basket);
    }

    Orders::insert(orders::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        status: Set(OrderStatus::Basket),
        created_at: NotSet,
        updated_at: NotSet,
    })
    .on_conflict(OnConflict::new().do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    find_basket(conn, user_id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("basket for user {user_id} not created")))
}

fn check_quantity(quantity: i32, stock: i32) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::validation(QUANTITY_TOO_SMALL));
    }
    if quantity > stock {
        return Err(AppError::validation(NOT_ENOUGH_STOCK));
    }
    Ok(())
}

fn integer_pair(entry: &Value) -> Option<(i64, i32)> {
    let product = entry.get("product")?.as_i64()?;
    let quantity = entry.get("quantity")?.as_i64()?;
    Some((product, i32::try_from(quantity).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quantity_must_be_positive_and_in_stock() {
        assert!(check_quantity(2, 5).is_ok());
        assert!(check_quantity(5, 5).is_ok());
        assert!(matches!(
            check_quantity(10, 5),
            Err(AppError::Validation(msg)) if msg == NOT_ENOUGH_STOCK
        ));
        assert!(matches!(
            check_quantity(0, 5),
            Err(AppError::Validation(msg)) if msg == QUANTITY_TOO_SMALL
        ));
    }

    #[test]
    fn only_integer_entries_are_updates() {
        assert_eq!(integer_pair(&json!({"product": 3, "quantity": 2})), Some((3, 2)));
        assert_eq!(integer_pair(&json!({"product": "3", "quantity": 2})), None);
        assert_eq!(integer_pair(&json!({"product": 3, "quantity": 2.5})), None);
        assert_eq!(integer_pair(&json!({"product": 3})), None);
        assert_eq!(integer_pair(&json!([1, 2])), None);
    }
}
