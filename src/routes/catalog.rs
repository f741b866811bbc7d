use axum::{Json, Router, extract::DefaultBodyLimit, extract::State, routing::post};

use crate::{
    dto::catalog::{CatalogUrlRequest, ImportSummary},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::extract::CatalogSource,
    services::catalog_service,
    state::AppState,
};

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

/// Import a shop catalog from a URL or an uploaded YAML file.
///
/// Replaces all listings of the caller's shop with the feed contents.
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(
        content = CatalogUrlRequest,
        description = "JSON {url} or multipart/form-data with a `file` part"
    ),
    responses(
        (status = 200, description = "Catalog imported", body = ApiResponse<ImportSummary>),
        (status = 400, description = "No source, bad URL or malformed YAML"),
        (status = 403, description = "Caller is not a shop"),
        (status = 502, description = "Catalog URL could not be fetched")
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    source: CatalogSource,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let resp = match source {
        CatalogSource::Url(url) => catalog_service::import_from_url(&state, &user, &url).await?,
        CatalogSource::File { name, bytes } => {
            catalog_service::import_from_upload(&state, &user, &name, &bytes).await?
        }
    };
    Ok(Json(resp))
}
