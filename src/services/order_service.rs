use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::{
        common::IdValue,
        orders::{CheckoutRequest, CheckoutResponse, OrderList},
    },
    entity::{
        contacts::{Column as ContactCol, Entity as Contacts},
        enums::{ContactType, OrderStatus},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        product_infos::{Column as InfoCol, Entity as ProductInfos},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderDetail, OrderItemView, ProductListing},
    notify::Notification,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::product_service::load_listings,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all()
        .add(OrderCol::UserId.eq(user.user_id))
        .add(OrderCol::Status.ne(OrderStatus::Basket));
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_order_details(&state.orm, orders).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

/// Turn the caller's basket into a placed order (`basket` -> `new`).
///
/// Preconditions are checked before the status changes and inside the same
/// transaction, so a rejected checkout leaves the basket untouched.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    let order_id = payload
        .id
        .as_ref()
        .and_then(IdValue::as_id)
        .ok_or_else(AppError::missing_arguments)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(order_id))
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Status.eq(OrderStatus::Basket)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::validation("Неправильно указаны аргументы"))?;

    let phone = Contacts::find()
        .filter(ContactCol::UserId.eq(user.user_id))
        .filter(ContactCol::ContactType.eq(ContactType::Phone))
        .order_by_asc(ContactCol::Id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::validation("Укажите контактный номер для связи"))?;

    let detail = load_order_details(&txn, vec![order.clone()])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order {order_id} has no detail")))?;
    if detail.ordered_items.is_empty() {
        return Err(AppError::validation("Корзина пуста"));
    }

    let customer = Users::find_by_id(user.user_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: OrderActive = order.into();
    active.status = Set(OrderStatus::New);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    txn.commit().await?;

    state.notifier.send(Notification::NewOrder {
        email: customer.email.clone(),
        order_id: order.id,
        total_sum: detail.total_sum,
    });

    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_sum": detail.total_sum }),
    )
    .await;

    Ok(ApiResponse::success(
        "Заказ оформлен",
        CheckoutResponse {
            order_id: order.id,
            total_sum: detail.total_sum,
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: phone.value,
        },
        Some(Meta::empty()),
    ))
}

/// Σ quantity × listing price, saturating at `i64::MAX`.
pub fn total_sum(items: &[OrderItemView]) -> i64 {
    items.iter().fold(0i64, |total, item| {
        let price = item.product.as_ref().map_or(0, |p| p.price);
        total.saturating_add(i64::from(item.quantity).saturating_mul(price))
    })
}

/// Expand orders with their items and computed totals, preserving order.
pub(crate) async fn load_order_details<C: ConnectionTrait>(
    conn: &C,
    orders: Vec<OrderModel>,
) -> AppResult<Vec<OrderDetail>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;

    let info_ids: Vec<i64> = items.iter().map(|i| i.product_info_id).collect();
    let infos = if info_ids.is_empty() {
        Vec::new()
    } else {
        ProductInfos::find()
            .filter(InfoCol::Id.is_in(info_ids))
            .all(conn)
            .await?
    };
    let listings: HashMap<i64, ProductListing> = load_listings(conn, infos)
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();

    let mut by_order: HashMap<i64, Vec<OrderItemView>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(OrderItemView {
            id: item.id,
            product_id: item.product_info_id,
            quantity: item.quantity,
            product: listings.get(&item.product_info_id).cloned(),
        });
    }

    Ok(orders
        .into_iter()
        .map(|order| {
            let ordered_items = by_order.remove(&order.id).unwrap_or_default();
            OrderDetail {
                total_sum: total_sum(&ordered_items),
                id: order.id,
                dt: order.created_at.with_timezone(&Utc),
                user_id: order.user_id,
                status: order.status,
                ordered_items,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShopRef;

    fn item(quantity: i32, price: Option<i64>) -> OrderItemView {
        OrderItemView {
            id: 1,
            product_id: 1,
            quantity,
            product: price.map(|price| ProductListing {
                id: 1,
                product_id: 1,
                product_name: "Чехол".into(),
                model: String::new(),
                price,
                price_rrc: price,
                quantity: 10,
                shop: ShopRef {
                    id: 1,
                    name: "Связной".into(),
                },
                product_parameters: Vec::new(),
            }),
        }
    }

    #[test]
    fn total_of_empty_basket_is_zero() {
        assert_eq!(total_sum(&[]), 0);
    }

    #[test]
    fn total_multiplies_quantity_by_price() {
        assert_eq!(total_sum(&[item(2, Some(100))]), 200);
        assert_eq!(total_sum(&[item(2, Some(100)), item(3, Some(15))]), 245);
    }

    #[test]
    fn missing_listing_contributes_nothing() {
        assert_eq!(total_sum(&[item(4, None), item(1, Some(99))]), 99);
    }

    #[test]
    fn huge_totals_saturate() {
        assert_eq!(total_sum(&[item(2, Some(i64::MAX))]), i64::MAX);
        assert_eq!(
            total_sum(&[item(1, Some(i64::MAX)), item(1, Some(1))]),
            i64::MAX
        );
    }
}
