use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        basket::DeletedCount,
        common::DeleteItemsRequest,
        contacts::{ContactList, CreateContactRequest, UpdateContactRequest},
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::ContactView,
    response::ApiResponse,
    routes::extract::ApiJson,
    services::contact_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/contacts",
        get(list_contacts)
            .post(create_contact)
            .put(update_contact)
            .delete(delete_contacts),
    )
}

#[utoipa::path(
    get,
    path = "/api/contacts",
    responses(
        (status = 200, description = "Contacts of the current user", body = ApiResponse<ContactList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn list_contacts(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ContactList>>> {
    let resp = contact_service::list_contacts(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 200, description = "Contact created", body = ApiResponse<ContactView>),
        (status = 400, description = "Malformed phone or address"),
        (status = 409, description = "Contact already exists")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn create_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<CreateContactRequest>,
) -> AppResult<Json<ApiResponse<ContactView>>> {
    let resp = contact_service::create_contact(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/contacts",
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ApiResponse<ContactView>),
        (status = 400, description = "Missing or unknown id, malformed value")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn update_contact(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<UpdateContactRequest>,
) -> AppResult<Json<ApiResponse<ContactView>>> {
    let resp = contact_service::update_contact(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/contacts",
    request_body = DeleteItemsRequest,
    responses(
        (status = 200, description = "Contacts removed", body = ApiResponse<DeletedCount>),
        (status = 400, description = "No valid ids")
    ),
    security(("bearer_auth" = [])),
    tag = "Contacts"
)]
pub async fn delete_contacts(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<DeleteItemsRequest>,
) -> AppResult<Json<ApiResponse<DeletedCount>>> {
    let resp = contact_service::delete_contacts(&state, &user, payload).await?;
    Ok(Json(resp))
}
