//! Extractors that reject with the JSON error envelope instead of axum's
//! plain-text defaults.

use axum::{
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Multipart, Request},
    http::header::CONTENT_TYPE,
};

use crate::{
    dto::catalog::CatalogUrlRequest,
    error::{AppError, AppResult, INVALID_FORMAT},
};

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

pub const NO_CATALOG_SOURCE: &str =
    "Укажите url с файлом каталога магазина или прикрепите yaml файл.";

pub const FILE_NEEDS_MULTIPART: &str =
    "Файл каталога передается multipart-формой в поле file.";

/// Body of `POST /upload`: either a JSON `{"url": ...}` or a multipart form
/// with a `file` part (or a `url` text part). Exactly one source is allowed.
#[derive(Debug)]
pub enum CatalogSource {
    Url(String),
    File { name: String, bytes: Bytes },
}

impl CatalogSource {
    fn pick(url: Option<String>, file: Option<(String, Bytes)>) -> AppResult<Self> {
        let url = url.filter(|u| !u.trim().is_empty());
        match (url, file) {
            (Some(url), None) => Ok(CatalogSource::Url(url)),
            (None, Some((name, bytes))) => Ok(CatalogSource::File { name, bytes }),
            (None, None) => Err(AppError::validation(NO_CATALOG_SOURCE)),
            (Some(_), Some(_)) => Err(AppError::validation(
                "Укажите либо url, либо файл каталога, но не оба сразу",
            )),
        }
    }
}

impl<S> FromRequest<S> for CatalogSource
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state).await?;
            let mut url = None;
            let mut file = None;
            while let Some(field) = multipart.next_field().await? {
                match field.name() {
                    Some("file") => {
                        let name = field.file_name().unwrap_or("catalog.yaml").to_string();
                        let bytes = field.bytes().await?;
                        file = Some((name, bytes));
                    }
                    Some("url") => url = Some(field.text().await?),
                    _ => {}
                }
            }
            return Self::pick(url, file);
        }

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|_| AppError::validation(INVALID_FORMAT))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Self::pick(None, None);
        }
        let request: CatalogUrlRequest =
            serde_json::from_slice(&body).map_err(|_| AppError::validation(INVALID_FORMAT))?;
        if request.filename.is_some() {
            return Err(AppError::validation(FILE_NEEDS_MULTIPART));
        }
        Self::pick(request.url, None)
    }
}
