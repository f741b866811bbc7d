use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// JSON form of `POST /upload`. The file form is multipart with a `file` part.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CatalogUrlRequest {
    pub url: Option<String>,
    /// Rejected: a file must be sent as the multipart `file` part.
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportSummary {
    pub shop_id: i64,
    pub shop: String,
    pub categories: usize,
    pub goods: usize,
    pub parameters: usize,
}
