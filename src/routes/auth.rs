use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{
        ConfirmAccountRequest, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
        PasswordResetRequest, RegisterRequest, UpdateProfileRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::UserProfile,
    response::ApiResponse,
    routes::extract::ApiJson,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/registration", post(register))
        .route("/register/confirm", post(confirm))
        .route("/login", post(login))
        .route("/password_reset", post(password_reset))
        .route("/password_reset/confirm", post(password_reset_confirm))
        .route("/user/details", get(details).put(update_details))
}

#[utoipa::path(
    post,
    path = "/api/registration",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Inactive user created, confirmation token sent", body = ApiResponse<UserProfile>),
        (status = 400, description = "Invalid fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::register_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/register/confirm",
    request_body = ConfirmAccountRequest,
    responses(
        (status = 200, description = "Account activated", body = ApiResponse<UserProfile>),
        (status = 400, description = "Wrong token or email")
    ),
    tag = "Auth"
)]
pub async fn confirm(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ConfirmAccountRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::confirm_account(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials or inactive account")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_user(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/password_reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset token sent if the email is registered")
    ),
    tag = "Auth"
)]
pub async fn password_reset(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PasswordResetRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = auth_service::request_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/password_reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Wrong token or weak password")
    ),
    tag = "Auth"
)]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PasswordResetConfirmRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = auth_service::confirm_password_reset(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/user/details",
    responses(
        (status = 200, description = "Current user's profile", body = ApiResponse<UserProfile>),
        (status = 403, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn details(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/user/details",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserProfile>),
        (status = 400, description = "Weak password"),
        (status = 403, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_details(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserProfile>>> {
    let resp = auth_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}
