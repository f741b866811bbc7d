use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::auth::{
        Claims, ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
        PasswordResetRequest, RegisterRequest, UpdateProfileRequest,
    },
    entity::{
        confirm_email_tokens::{self, Entity as ConfirmEmailTokens},
        enums::UserType,
        password_reset_tokens::{self, Entity as PasswordResetTokens},
        users::{self, ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::UserProfile,
    notify::Notification,
    response::{ApiResponse, Meta},
    state::AppState,
};

const EMAIL_TAKEN: &str = "Пользователь с таким email уже существует";
const LOGIN_FAILED: &str = "Не удалось войти.";

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let email = normalize_email(&payload.email)?;
    if payload.password != payload.password2 {
        return Err(AppError::validation("Пароли не совпадают"));
    }
    validate_password(&payload.password)?;

    let exists = Users::find()
        .filter(users::Column::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let token = Uuid::new_v4().simple().to_string();

    let txn = state.orm.begin().await?;
    let user = users::ActiveModel {
        id: NotSet,
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(payload.first_name.trim().to_string()),
        last_name: Set(payload.last_name.trim().to_string()),
        company: Set(payload.company),
        position: Set(payload.position),
        username: Set(payload.username.filter(|u| !u.trim().is_empty())),
        user_type: Set(payload.user_type),
        is_active: Set(false),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict(EMAIL_TAKEN.into())
        } else {
            err.into()
        }
    })?;

    confirm_email_tokens::ActiveModel {
        id: NotSet,
        user_id: Set(user.id),
        key: Set(token.clone()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    state.notifier.send(Notification::ConfirmRegistration {
        email: user.email.clone(),
        token,
    });

    audit::record(
        &state.pool,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id, "type": user.user_type.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Пользователь создан",
        UserProfile::from(user),
        None,
    ))
}

pub async fn confirm_account(
    state: &AppState,
    payload: ConfirmAccountRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let invalid = || AppError::validation("Неправильно указан токен или email");
    let email = normalize_email(&payload.email).map_err(|_| invalid())?;

    let record = ConfirmEmailTokens::find()
        .filter(confirm_email_tokens::Column::Key.eq(payload.token.trim()))
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    let (token, user) = match record {
        Some((token, Some(user))) if user.email == email => (token, user),
        _ => return Err(invalid()),
    };

    let txn = state.orm.begin().await?;
    let mut active: UserActive = user.into();
    active.is_active = Set(true);
    let user = active.update(&txn).await?;
    token.delete(&txn).await?;
    txn.commit().await?;

    tracing::info!(user_id = user.id, "account confirmed");
    Ok(ApiResponse::success(
        "Аккаунт подтвержден",
        UserProfile::from(user),
        None,
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = Users::find()
        .filter(users::Column::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::validation(LOGIN_FAILED))?;

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
        || !user.is_active
    {
        return Err(AppError::validation(LOGIN_FAILED));
    }

    let token = issue_token(
        &state.config.jwt_secret,
        state.config.jwt_ttl_hours,
        user.id,
        user.user_type,
    )?;

    audit::record(
        &state.pool,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
        },
        Some(Meta::empty()),
    ))
}

/// Always answers with success so the endpoint does not reveal which
/// addresses are registered.
pub async fn request_password_reset(
    state: &AppState,
    payload: PasswordResetRequest,
) -> AppResult<ApiResponse<()>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(&state.orm)
        .await?;

    if let Some(user) = user {
        let token = Uuid::new_v4().simple().to_string();
        password_reset_tokens::ActiveModel {
            id: NotSet,
            user_id: Set(user.id),
            key: Set(token.clone()),
            created_at: NotSet,
        }
        .insert(&state.orm)
        .await?;

        state.notifier.send(Notification::PasswordReset {
            email: user.email,
            token,
        });
    } else {
        tracing::debug!("password reset requested for unknown email");
    }

    Ok(ApiResponse::empty(
        "Если адрес зарегистрирован, на него отправлено письмо",
    ))
}

pub async fn confirm_password_reset(
    state: &AppState,
    payload: PasswordResetConfirmRequest,
) -> AppResult<ApiResponse<()>> {
    validate_password(&payload.password)?;

    let record = PasswordResetTokens::find()
        .filter(password_reset_tokens::Column::Key.eq(payload.token.trim()))
        .find_also_related(Users)
        .one(&state.orm)
        .await?;
    let user = match record {
        Some((_, Some(user))) => user,
        _ => return Err(AppError::validation("Неправильно указан токен")),
    };

    let password_hash = hash_password(&payload.password)?;
    let user_id = user.id;

    let txn = state.orm.begin().await?;
    let mut active: UserActive = user.into();
    active.password_hash = Set(password_hash);
    active.update(&txn).await?;
    PasswordResetTokens::delete_many()
        .filter(password_reset_tokens::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user_id),
        "password_reset",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::empty("Пароль изменен"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<UserProfile>> {
    let user = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("OK", UserProfile::from(user), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<UserProfile>> {
    let existing = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(password) = payload.password {
        validate_password(&password)?;
        active.password_hash = Set(hash_password(&password)?);
    }
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name.trim().to_string());
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name.trim().to_string());
    }
    if let Some(company) = payload.company {
        active.company = Set(company);
    }
    if let Some(position) = payload.position {
        active.position = Set(position);
    }
    if let Some(username) = payload.username {
        active.username = Set(Some(username).filter(|u| !u.trim().is_empty()));
    }

    let updated = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Профиль обновлен",
        UserProfile::from(updated),
        None,
    ))
}

pub fn issue_token(
    secret: &str,
    ttl_hours: i64,
    user_id: i64,
    user_type: UserType,
) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        user_type,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < 8 {
        return Err(AppError::validation(
            "Пароль слишком короткий. Он должен содержать не менее 8 символов.",
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("Пароль состоит только из цифр."));
    }
    Ok(())
}

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::validation(
            "Введите правильный адрес электронной почты.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    #[test]
    fn password_rules() {
        assert!(validate_password("s3cret-pass").is_ok());
        assert!(validate_password("short").is_err());
        assert!(matches!(
            validate_password("1234567890"),
            Err(AppError::Validation(msg)) if msg == "Пароль состоит только из цифр."
        ));
    }

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(normalize_email(" Buyer@Example.COM ").unwrap(), "buyer@example.com");
        assert!(normalize_email("buyer.example.com").is_err());
        assert!(normalize_email("@example.com").is_err());
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let token = issue_token("test-secret", 1, 42, UserType::Shop).unwrap();
        let decoded = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(b"test-secret"),
            &Validation::default(),
        )
        .unwrap();
        assert_eq!(decoded.claims.sub, "42");
        assert_eq!(decoded.claims.user_type, UserType::Shop);
    }

    #[test]
    fn hashes_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"s3cret-pass", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"other-pass", &parsed).is_err());
    }
}
