use std::{collections::HashMap, path::Path};

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use url::Url;
use uuid::Uuid;

use crate::{
    audit,
    catalog::{ShopCatalog, parse_catalog},
    dto::catalog::ImportSummary,
    entity::{
        categories::{self, Entity as Categories},
        parameters::{self, Entity as Parameters},
        product_infos::{self, Entity as ProductInfos},
        product_parameters,
        products::{self, Entity as Products},
        shop_categories::{self, Entity as ShopCategories},
        shops::{self, Entity as Shops, Model as ShopModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_shop},
    response::ApiResponse,
    state::AppState,
};

/// Where a catalog came from; recorded on the shop row.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopSource {
    Url(String),
    File(String),
}

pub async fn import_from_url(
    state: &AppState,
    user: &AuthUser,
    raw_url: &str,
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_shop(user)?;
    let url = validate_url(raw_url)?;

    tracing::info!(user_id = user.user_id, %url, "fetching catalog");
    let response = state
        .http
        .get(url.clone())
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|err| AppError::Upstream(err.to_string()))?;
    let body = read_capped(response, state.config.max_upload_bytes).await?;

    let catalog = parse_catalog(&body)?;
    let summary = import_catalog(
        &state.orm,
        user.user_id,
        &catalog,
        &ShopSource::Url(url.to_string()),
    )
    .await?;

    record_import(state, user, &summary, "url").await;
    Ok(ApiResponse::success("Каталог загружен", summary, None))
}

pub async fn import_from_upload(
    state: &AppState,
    user: &AuthUser,
    original_name: &str,
    bytes: &[u8],
) -> AppResult<ApiResponse<ImportSummary>> {
    ensure_shop(user)?;

    let media_dir = &state.config.media_dir;
    tokio::fs::create_dir_all(media_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to create media dir: {e}")))?;

    let stored_name = format!(
        "{}_{}",
        Uuid::new_v4().simple(),
        sanitize_filename(original_name)
    );
    let path = media_dir.join(&stored_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to save upload: {e}")))?;

    let imported = import_saved_file(state, user, &path, stored_name).await;
    let summary = match imported {
        Ok(summary) => summary,
        Err(err) => {
            if let Err(io) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %io, "failed to remove rejected upload");
            }
            return Err(err);
        }
    };

    record_import(state, user, &summary, "file").await;
    Ok(ApiResponse::success("Каталог загружен", summary, None))
}

async fn import_saved_file(
    state: &AppState,
    user: &AuthUser,
    path: &Path,
    stored_name: String,
) -> AppResult<ImportSummary> {
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to read upload: {e}")))?;
    let catalog = parse_catalog(&content)?;
    import_catalog(
        &state.orm,
        user.user_id,
        &catalog,
        &ShopSource::File(stored_name),
    )
    .await
}

/// Read a response body, refusing anything larger than `limit` bytes.
async fn read_capped(mut response: reqwest::Response, limit: usize) -> AppResult<Vec<u8>> {
    let too_large = || AppError::validation(format!("Файл каталога больше {limit} байт"));
    if response
        .content_length()
        .is_some_and(|len| len > limit as u64)
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|err| AppError::Upstream(err.to_string()))?
    {
        append_capped(&mut body, &chunk, limit).map_err(|_| too_large())?;
    }
    Ok(body)
}

fn append_capped(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), usize> {
    let len = body.len() + chunk.len();
    if len > limit {
        return Err(len);
    }
    body.extend_from_slice(chunk);
    Ok(())
}

/// Replace the owner's shop listings with the catalog contents.
///
/// Runs in a single transaction: categories, products and parameters are
/// upserted (they are shared between shops), the shop's previous
/// ProductInfo rows are dropped together with their parameters, and the
/// new listings are inserted. Any failure leaves the previous state intact.
pub async fn import_catalog(
    conn: &DatabaseConnection,
    owner_id: i64,
    catalog: &ShopCatalog,
    source: &ShopSource,
) -> AppResult<ImportSummary> {
    let txn = conn.begin().await?;

    let shop = upsert_shop(&txn, owner_id, &catalog.shop, source).await?;

    for category in &catalog.categories {
        Categories::insert(categories::ActiveModel {
            id: Set(category.id),
            name: Set(category.name.clone()),
        })
        .on_conflict(
            OnConflict::column(categories::Column::Id)
                .update_column(categories::Column::Name)
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        ShopCategories::insert(shop_categories::ActiveModel {
            shop_id: Set(shop.id),
            category_id: Set(category.id),
        })
        .on_conflict(
            OnConflict::columns([
                shop_categories::Column::ShopId,
                shop_categories::Column::CategoryId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
    }

    let removed = ProductInfos::delete_many()
        .filter(product_infos::Column::ShopId.eq(shop.id))
        .exec(&txn)
        .await?;

    let mut parameter_ids: HashMap<&str, i64> = HashMap::new();
    for good in &catalog.goods {
        let product_id = upsert_product(&txn, &good.name, good.category).await?;

        let info = product_infos::ActiveModel {
            id: NotSet,
            product_id: Set(product_id),
            shop_id: Set(shop.id),
            model: Set(good.model.clone()),
            price: Set(good.price),
            price_rrc: Set(good.price_rrc),
            quantity: Set(good.quantity),
        }
        .insert(&txn)
        .await?;

        for (name, value) in &good.parameters {
            let parameter_id = match parameter_ids.get(name.as_str()) {
                Some(id) => *id,
                None => {
                    let id = upsert_parameter(&txn, name).await?;
                    parameter_ids.insert(name.as_str(), id);
                    id
                }
            };

            product_parameters::ActiveModel {
                id: NotSet,
                product_info_id: Set(info.id),
                parameter_id: Set(parameter_id),
                value: Set(value.to_string()),
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    tracing::info!(
        shop_id = shop.id,
        replaced = removed.rows_affected,
        goods = catalog.goods.len(),
        "catalog imported"
    );

    Ok(ImportSummary {
        shop_id: shop.id,
        shop: shop.name,
        categories: catalog.categories.len(),
        goods: catalog.goods.len(),
        parameters: catalog.parameter_count(),
    })
}

pub fn validate_url(raw: &str) -> AppResult<Url> {
    let invalid = || AppError::validation("Введите правильный URL.");
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(url)
}

fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("catalog.yaml");
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.trim_matches('.').is_empty() {
        "catalog.yaml".to_string()
    } else {
        cleaned
    }
}

async fn upsert_shop<C: ConnectionTrait>(
    conn: &C,
    owner_id: i64,
    name: &str,
    source: &ShopSource,
) -> AppResult<ShopModel> {
    let (url, filename) = match source {
        ShopSource::Url(url) => (Some(url.clone()), None),
        ShopSource::File(filename) => (None, Some(filename.clone())),
    };

    Shops::insert(shops::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        url: Set(url.clone()),
        filename: Set(filename.clone()),
        owner_id: Set(owner_id),
        created_at: NotSet,
    })
    .on_conflict(
        OnConflict::columns([shops::Column::Name, shops::Column::OwnerId])
            .update_columns([shops::Column::Url, shops::Column::Filename])
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Shops::find()
        .filter(shops::Column::Name.eq(name))
        .filter(shops::Column::OwnerId.eq(owner_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("shop {name} vanished after upsert")))
}

async fn upsert_product<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    category_id: i64,
) -> AppResult<i64> {
    let find = || {
        Products::find()
            .filter(products::Column::Name.eq(name))
            .filter(products::Column::CategoryId.eq(category_id))
            .one(conn)
    };
    if let Some(product) = find().await? {
        return Ok(product.id);
    }

    Products::insert(products::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        category_id: Set(category_id),
    })
    .on_conflict(
        OnConflict::columns([products::Column::Name, products::Column::CategoryId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    find()
        .await?
        .map(|p| p.id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("product {name} vanished after upsert")))
}

async fn upsert_parameter<C: ConnectionTrait>(conn: &C, name: &str) -> AppResult<i64> {
    Parameters::insert(parameters::ActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
    })
    .on_conflict(
        OnConflict::column(parameters::Column::Name)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    Parameters::find()
        .filter(parameters::Column::Name.eq(name))
        .one(conn)
        .await?
        .map(|p| p.id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("parameter {name} vanished after upsert")))
}

async fn record_import(state: &AppState, user: &AuthUser, summary: &ImportSummary, via: &str) {
    audit::record(
        &state.pool,
        Some(user.user_id),
        "catalog_import",
        "shops",
        serde_json::json!({
            "shop_id": summary.shop_id,
            "goods": summary.goods,
            "via": via,
        }),
    )
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_urls_only() {
        assert!(validate_url("https://example.com/shop1.yaml").is_ok());
        assert!(validate_url("http://localhost:8000/feed").is_ok());
        assert!(matches!(validate_url("not a url"), Err(AppError::Validation(_))));
        assert!(matches!(validate_url("ftp://example.com/x"), Err(AppError::Validation(_))));
        assert!(matches!(validate_url("file:///etc/passwd"), Err(AppError::Validation(_))));
    }

    #[test]
    fn fetched_body_stops_at_the_limit() {
        let mut body = Vec::new();
        assert!(append_capped(&mut body, b"shop: ", 8).is_ok());
        assert!(append_capped(&mut body, b"ab", 8).is_ok());
        assert_eq!(append_capped(&mut body, b"c", 8), Err(9));
        assert_eq!(body, b"shop: ab");
    }

    #[test]
    fn upload_names_are_flattened() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("shop 1.yaml"), "shop_1.yaml");
        assert_eq!(sanitize_filename(""), "catalog.yaml");
        assert_eq!(sanitize_filename(".."), "catalog.yaml");
    }
}
