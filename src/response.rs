use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Success envelope. `Status` is always `true` here; failures use [`ErrorResponse`].
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    #[serde(rename = "Status")]
    pub status: bool,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            data: None,
            meta: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[serde(rename = "Status")]
    pub status: bool,
    #[serde(rename = "Errors")]
    pub errors: String,
}

impl ErrorResponse {
    pub fn new(errors: impl Into<String>) -> Self {
        Self {
            status: false,
            errors: errors.into(),
        }
    }
}
