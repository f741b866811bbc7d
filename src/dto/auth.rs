use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::enums::UserType;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    pub username: Option<String>,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct ConfirmAccountRequest {
    pub email: String,
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub password: String,
}

/// Partial profile update; absent fields keep their value.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub user_type: UserType,
    pub exp: usize,
}
