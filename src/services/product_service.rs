use std::collections::HashMap;

use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::{
    dto::products::CategoryList,
    entity::{
        categories::{self, Entity as Categories, Model as CategoryModel},
        parameters::{Column as ParamCol, Entity as Parameters},
        product_infos::{Column as InfoCol, Entity as ProductInfos, Model as ProductInfoModel},
        product_parameters::{Column as ProductParamCol, Entity as ProductParameters},
        products::{Column as ProdCol, Entity as Products, Model as ProductModel},
        shops::{self, Entity as Shops},
    },
    error::{AppError, AppResult},
    models::{
        CategoryWithProducts, ProductListing, ProductParameterView, ProductWithListings, ShopRef,
    },
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    state::AppState,
};

pub async fn list_categories(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<CategoryList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(name) = query.name.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(categories::Column::Name.eq(name.clone()));
    }
    if let Some(search) = query.search.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(Expr::col((Categories, categories::Column::Name)).ilike(pattern));
    }

    let mut finder = Categories::find();
    if let Some(shop) = query.shop.as_ref().filter(|s| !s.is_empty()) {
        finder = finder
            .inner_join(Shops)
            .filter(shops::Column::Name.eq(shop.clone()))
            .distinct();
    }
    let finder = finder
        .filter(condition)
        .order_by_asc(categories::Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let categories = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = expand_categories(&state.orm, categories).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Products",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<ApiResponse<ProductWithListings>> {
    let product = match Products::find_by_id(id).one(&state.orm).await? {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut expanded = expand_products(&state.orm, vec![product]).await?;
    let product = expanded.pop().ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Product", product, None))
}

async fn expand_categories<C: ConnectionTrait>(
    conn: &C,
    categories: Vec<CategoryModel>,
) -> AppResult<Vec<CategoryWithProducts>> {
    if categories.is_empty() {
        return Ok(Vec::new());
    }
    let category_ids: Vec<i64> = categories.iter().map(|c| c.id).collect();
    let products = Products::find()
        .filter(ProdCol::CategoryId.is_in(category_ids))
        .order_by_asc(ProdCol::Id)
        .all(conn)
        .await?;

    let mut by_category: HashMap<i64, Vec<ProductWithListings>> = HashMap::new();
    for product in expand_products(conn, products).await? {
        by_category
            .entry(product.category_id)
            .or_default()
            .push(product);
    }

    Ok(categories
        .into_iter()
        .map(|category| CategoryWithProducts {
            products: by_category.remove(&category.id).unwrap_or_default(),
            id: category.id,
            category: category.name,
        })
        .collect())
}

async fn expand_products<C: ConnectionTrait>(
    conn: &C,
    products: Vec<ProductModel>,
) -> AppResult<Vec<ProductWithListings>> {
    if products.is_empty() {
        return Ok(Vec::new());
    }
    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let infos = ProductInfos::find()
        .filter(InfoCol::ProductId.is_in(product_ids))
        .order_by_asc(InfoCol::Id)
        .all(conn)
        .await?;

    let mut by_product: HashMap<i64, Vec<ProductListing>> = HashMap::new();
    for listing in load_listings(conn, infos).await? {
        by_product.entry(listing.product_id).or_default().push(listing);
    }

    Ok(products
        .into_iter()
        .map(|product| ProductWithListings {
            products_info: by_product.remove(&product.id).unwrap_or_default(),
            id: product.id,
            name: product.name,
            category_id: product.category_id,
        })
        .collect())
}

/// Expand ProductInfo rows with product name, shop and parameters,
/// preserving input order. Shared by catalog, basket and order views.
pub(crate) async fn load_listings<C: ConnectionTrait>(
    conn: &C,
    infos: Vec<ProductInfoModel>,
) -> AppResult<Vec<ProductListing>> {
    if infos.is_empty() {
        return Ok(Vec::new());
    }

    let info_ids: Vec<i64> = infos.iter().map(|i| i.id).collect();
    let product_ids: Vec<i64> = infos.iter().map(|i| i.product_id).collect();
    let shop_ids: Vec<i64> = infos.iter().map(|i| i.shop_id).collect();

    let product_names: HashMap<i64, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();

    let shop_names: HashMap<i64, String> = Shops::find()
        .filter(shops::Column::Id.is_in(shop_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s.name))
        .collect();

    let values = ProductParameters::find()
        .filter(ProductParamCol::ProductInfoId.is_in(info_ids))
        .order_by_asc(ProductParamCol::Id)
        .all(conn)
        .await?;

    let parameter_ids: Vec<i64> = values.iter().map(|v| v.parameter_id).collect();
    let parameter_names: HashMap<i64, String> = if parameter_ids.is_empty() {
        HashMap::new()
    } else {
        Parameters::find()
            .filter(ParamCol::Id.is_in(parameter_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect()
    };

    let mut params_by_info: HashMap<i64, Vec<ProductParameterView>> = HashMap::new();
    for value in values {
        params_by_info
            .entry(value.product_info_id)
            .or_default()
            .push(ProductParameterView {
                parameter: parameter_names
                    .get(&value.parameter_id)
                    .cloned()
                    .unwrap_or_default(),
                value: value.value,
            });
    }

    Ok(infos
        .into_iter()
        .map(|info| ProductListing {
            product_name: product_names.get(&info.product_id).cloned().unwrap_or_default(),
            shop: ShopRef {
                id: info.shop_id,
                name: shop_names.get(&info.shop_id).cloned().unwrap_or_default(),
            },
            product_parameters: params_by_info.remove(&info.id).unwrap_or_default(),
            id: info.id,
            product_id: info.product_id,
            model: info.model,
            price: info.price,
            price_rrc: info.price_rrc,
            quantity: info.quantity,
        })
        .collect())
}
