use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::response::FieldErrors;
use crate::state::AppState;
use crate::users::dto::UpdatedUser;
use crate::users::extractors::parse_user_id;
use crate::users::password::hash_password;
use crate::users::repo::StoreError;
use crate::users::repo_types::{NewUser, User, UserChanges};
use crate::users::rules::{Action, RuleSet};
use crate::users::validation::{
    as_text, disallowed_fields, empty_required_fields, is_empty_value, missing_fields,
    unique_message, validate, ValidateError,
};

type Fields = Map<String, Value>;

const CREATE_FAILED: &str = "Failed to create user";
const UPDATE_FAILED: &str = "Failed to update user";
const DELETE_FAILED: &str = "Failed to delete user";

pub async fn list_users(state: &AppState) -> Result<Vec<User>, ApiError> {
    state
        .store
        .list()
        .await
        .map_err(|e| ApiError::failed("Failed to retrieve users", e))
}

pub async fn get_user(state: &AppState, raw_id: &str) -> Result<User, ApiError> {
    let id = parse_user_id(raw_id)?;
    existing(state, id).await
}

pub async fn create_user(state: &AppState, fields: Fields) -> Result<Uuid, ApiError> {
    let rules = state.rules.for_action(Action::Create);

    if fields.is_empty() {
        return Err(ApiError::EmptyBody {
            message: "No parameters provided",
            info: rules.validation_info("You must provide all required parameters"),
        });
    }
    reject_disallowed(rules, &fields)?;

    let missing = missing_fields(rules, &fields);
    if !missing.is_empty() {
        return Err(ApiError::MissingParameters {
            fields: missing,
            info: rules.validation_info("The following parameters are required but missing"),
        });
    }
    let empty = empty_required_fields(rules, &fields);
    if !empty.is_empty() {
        return Err(ApiError::EmptyParameters {
            fields: empty,
            info: rules.validation_info("The following parameters cannot be empty"),
        });
    }

    let id = Uuid::new_v4();
    check_content(state, rules, &fields, None, CREATE_FAILED).await?;

    let password = text(&fields, "password").unwrap_or_default();
    let password_hash = hash_password(&password).map_err(|e| ApiError::failed(CREATE_FAILED, e))?;

    let user = NewUser {
        id,
        fullname: text(&fields, "fullname").unwrap_or_default(),
        email: text(&fields, "email").unwrap_or_default(),
        phone: text(&fields, "phone").unwrap_or_default(),
        gender: text(&fields, "gender"),
        password_hash,
        image: text(&fields, "image"),
        has_membership: flag(&fields, "has_membership"),
        qr_code: text(&fields, "qr_code"),
    };
    state
        .store
        .insert(&user)
        .await
        .map_err(|e| write_error(rules, CREATE_FAILED, e))?;

    info!(user_id = %id, email = %user.email, "user created");
    Ok(id)
}

pub async fn update_user(
    state: &AppState,
    raw_id: &str,
    mut fields: Fields,
) -> Result<UpdatedUser, ApiError> {
    let id = parse_user_id(raw_id)?;
    existing(state, id).await?;

    let rules = state.rules.for_action(Action::Update);

    // The id is immutable; a client-supplied one is ignored.
    fields.shift_remove("id");
    if fields.get("password").is_some_and(is_empty_value) {
        fields.shift_remove("password");
    }
    if fields.is_empty() {
        return Err(ApiError::EmptyBody {
            message: "No data provided for update",
            info: rules.validation_info("Provide at least one field to update"),
        });
    }
    reject_disallowed(rules, &fields)?;
    check_content(state, rules, &fields, Some(id), UPDATE_FAILED).await?;

    let changes = changes_from(&fields)?;
    let updated = state
        .store
        .update(id, &changes)
        .await
        .map_err(|e| write_error(rules, UPDATE_FAILED, e))?;
    if !updated {
        return Err(ApiError::NotFound);
    }

    let updated_fields: Vec<String> = fields.keys().cloned().collect();
    info!(user_id = %id, fields = ?updated_fields, "user updated");
    Ok(UpdatedUser { id, updated_fields })
}

pub async fn delete_user(state: &AppState, raw_id: &str) -> Result<(), ApiError> {
    let id = parse_user_id(raw_id)?;
    existing(state, id).await?;

    let removed = state
        .store
        .delete(id)
        .await
        .map_err(|e| ApiError::failed(DELETE_FAILED, e))?;
    if !removed {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %id, "user deleted");
    Ok(())
}

async fn existing(state: &AppState, id: Uuid) -> Result<User, ApiError> {
    let user = state
        .store
        .find(id)
        .await
        .map_err(|e| ApiError::failed("Failed to retrieve user", e))?;
    match user {
        Some(user) => Ok(user),
        None => {
            debug!(user_id = %id, "user lookup missed");
            Err(ApiError::NotFound)
        }
    }
}

fn reject_disallowed(rules: &RuleSet, fields: &Fields) -> Result<(), ApiError> {
    let unallowed = disallowed_fields(rules, fields);
    if unallowed.is_empty() {
        return Ok(());
    }
    Err(ApiError::DisallowedParameters {
        fields: unallowed,
        info: rules.validation_info("The following parameters are not allowed"),
    })
}

async fn check_content(
    state: &AppState,
    rules: &RuleSet,
    fields: &Fields,
    exclude: Option<Uuid>,
    failure: &'static str,
) -> Result<(), ApiError> {
    match validate(rules, fields, state.store.as_ref(), exclude).await {
        Ok(()) => Ok(()),
        Err(ValidateError::Invalid(errors)) => Err(ApiError::Validation {
            errors,
            info: rules.validation_info("One or more fields failed validation"),
        }),
        Err(ValidateError::Store(e)) => Err(ApiError::failed(failure, e)),
    }
}

/// A unique violation raised by the store itself means a concurrent request
/// won the race past the pre-check; report it like the pre-check would.
fn write_error(rules: &RuleSet, message: &'static str, err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(field) => {
            let mut errors = FieldErrors::new();
            errors.insert(field.column().to_string(), Value::String(unique_message(field.column())));
            ApiError::Validation {
                errors,
                info: rules.validation_info("One or more fields failed validation"),
            }
        }
        other => ApiError::failed(message, other),
    }
}

fn changes_from(fields: &Fields) -> Result<UserChanges, ApiError> {
    let password_hash = match text(fields, "password") {
        Some(plain) => Some(hash_password(&plain).map_err(|e| ApiError::failed(UPDATE_FAILED, e))?),
        None => None,
    };
    let has = |name: &str| fields.contains_key(name);

    Ok(UserChanges {
        fullname: text(fields, "fullname"),
        email: text(fields, "email"),
        phone: text(fields, "phone"),
        gender: has("gender").then(|| text(fields, "gender")),
        password_hash,
        image: has("image").then(|| text(fields, "image")),
        has_membership: has("has_membership").then(|| flag(fields, "has_membership")),
        qr_code: has("qr_code").then(|| text(fields, "qr_code")),
    })
}

/// Text of a present, non-empty field.
fn text(fields: &Fields, name: &str) -> Option<String> {
    fields
        .get(name)
        .filter(|v| !is_empty_value(v))
        .and_then(as_text)
}

fn flag(fields: &Fields, name: &str) -> Option<i16> {
    text(fields, name).and_then(|t| t.parse().ok())
}
