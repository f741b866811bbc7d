use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use crate::{dto::auth::Claims, entity::enums::UserType, error::AppError, state::AppState};

const AUTH_REQUIRED: &str = "Только для авторизованных пользователей";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub user_type: UserType,
}

pub fn ensure_user_type(user: &AuthUser, user_type: UserType) -> Result<(), AppError> {
    if user.user_type != user_type {
        return Err(AppError::Forbidden(match user_type {
            UserType::Shop => "Только для магазинов".to_string(),
            UserType::Customer => "Только для покупателей".to_string(),
        }));
    }
    Ok(())
}

pub fn ensure_shop(user: &AuthUser) -> Result<(), AppError> {
    ensure_user_type(user, UserType::Shop)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_str = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Forbidden(AUTH_REQUIRED.into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Forbidden(AUTH_REQUIRED.into()))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Forbidden("Недействительный или просроченный токен".into()))?;

        let user_id = decoded
            .claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Forbidden("Недействительный токен".into()))?;

        Ok(AuthUser {
            user_id,
            user_type: decoded.claims.user_type,
        })
    }
}
