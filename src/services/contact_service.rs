use std::sync::LazyLock;

use regex::Regex;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::{
    dto::{
        basket::DeletedCount,
        common::{DeleteItemsRequest, IdValue},
        contacts::{ContactList, CreateContactRequest, UpdateContactRequest},
    },
    entity::{
        contacts::{self, ActiveModel as ContactActive, Column as ContactCol, Entity as Contacts},
        enums::ContactType,
    },
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::ContactView,
    response::ApiResponse,
    state::AppState,
};

const CONTACT_EXISTS: &str = "Контакт уже существует";

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((8|\+7)[\- ]?)?(\(?\d{3}\)?[\- ]?)?[\d\- ]{7,10}").expect("Invalid regex")
});

const ADDRESS_KEYWORDS: [&str; 4] = ["город", "улица", "дом", "квартира"];

/// Phones must match the permissive Russian pattern and carry at least seven
/// digits; addresses must mention one of the address keywords as a word.
pub fn validate_contact(contact_type: ContactType, value: &str) -> AppResult<()> {
    let value = value.trim();
    match contact_type {
        ContactType::Phone => {
            let digits = value.chars().filter(char::is_ascii_digit).count();
            if digits < 7 || !PHONE_RE.is_match(value) {
                return Err(AppError::validation("Некорректный формат номера"));
            }
        }
        ContactType::Address => {
            let has_keyword = value.split_whitespace().any(|token| {
                let word = token
                    .trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase();
                ADDRESS_KEYWORDS.contains(&word.as_str())
            });
            if !has_keyword {
                return Err(AppError::validation("Некорректный формат адреса"));
            }
        }
    }
    Ok(())
}

pub async fn list_contacts(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ContactList>> {
    let items = Contacts::find()
        .filter(ContactCol::UserId.eq(user.user_id))
        .order_by_asc(ContactCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(ContactView::from)
        .collect();
    Ok(ApiResponse::success("OK", ContactList { items }, None))
}

pub async fn create_contact(
    state: &AppState,
    user: &AuthUser,
    payload: CreateContactRequest,
) -> AppResult<ApiResponse<ContactView>> {
    let value = payload.value.trim().to_string();
    validate_contact(payload.contact_type, &value)?;

    let contact = contacts::ActiveModel {
        id: NotSet,
        user_id: Set(user.user_id),
        contact_type: Set(payload.contact_type),
        value: Set(value),
    }
    .insert(&state.orm)
    .await
    .map_err(conflict_on_duplicate)?;

    Ok(ApiResponse::success(
        "Контакт добавлен",
        ContactView::from(contact),
        None,
    ))
}

pub async fn update_contact(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateContactRequest,
) -> AppResult<ApiResponse<ContactView>> {
    let id = payload
        .id
        .as_ref()
        .and_then(IdValue::as_id)
        .ok_or_else(AppError::missing_arguments)?;

    let existing = Contacts::find_by_id(id)
        .filter(ContactCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(AppError::missing_arguments)?;

    let contact_type = payload.contact_type.unwrap_or(existing.contact_type);
    let value = payload
        .value
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| existing.value.clone());
    validate_contact(contact_type, &value)?;

    let mut active: ContactActive = existing.into();
    active.contact_type = Set(contact_type);
    active.value = Set(value);
    let contact = active
        .update(&state.orm)
        .await
        .map_err(conflict_on_duplicate)?;

    Ok(ApiResponse::success(
        "Контакт обновлен",
        ContactView::from(contact),
        None,
    ))
}

pub async fn delete_contacts(
    state: &AppState,
    user: &AuthUser,
    payload: DeleteItemsRequest,
) -> AppResult<ApiResponse<DeletedCount>> {
    let ids = payload.ids();
    if ids.is_empty() {
        return Err(AppError::missing_arguments());
    }

    let result = Contacts::delete_many()
        .filter(ContactCol::UserId.eq(user.user_id))
        .filter(ContactCol::Id.is_in(ids))
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Контакты удалены",
        DeletedCount {
            deleted: result.rows_affected,
        },
        None,
    ))
}

fn conflict_on_duplicate(err: sea_orm::DbErr) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(CONTACT_EXISTS.into())
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_numbers() {
        assert!(validate_contact(ContactType::Phone, "+7 123 456 78 90").is_ok());
        assert!(validate_contact(ContactType::Phone, "8 (999) 123-45-67").is_ok());
        assert!(validate_contact(ContactType::Phone, "1234567").is_ok());
        assert!(validate_contact(ContactType::Phone, "abc").is_err());
        assert!(validate_contact(ContactType::Phone, "       ").is_err());
        assert!(validate_contact(ContactType::Phone, "12-34").is_err());
    }

    #[test]
    fn addresses_need_a_keyword() {
        assert!(validate_contact(ContactType::Address, "город Москва, улица Ленина, дом 1").is_ok());
        assert!(validate_contact(ContactType::Address, "Улица Мира 5").is_ok());
        assert!(matches!(
            validate_contact(ContactType::Address, "Москва Ленина 1"),
            Err(AppError::Validation(msg)) if msg == "Некорректный формат адреса"
        ));
        assert!(validate_contact(ContactType::Address, "пригород").is_err());
    }
}
