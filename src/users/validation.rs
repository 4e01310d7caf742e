use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::response::FieldErrors;
use crate::users::repo::{StoreError, UserStore};
use crate::users::rules::{Rule, RuleSet, UniqueField};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref DIGITS_RE: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Null, empty string, empty array and empty object count as empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Scalar JSON values rendered as text; arrays and objects have no text form.
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Request fields the table does not know, in request order.
pub fn disallowed_fields(rules: &RuleSet, body: &Map<String, Value>) -> Vec<String> {
    body.keys()
        .filter(|k| !rules.is_allowed(k))
        .cloned()
        .collect()
}

pub fn missing_fields(rules: &RuleSet, body: &Map<String, Value>) -> Vec<String> {
    rules
        .required_fields()
        .into_iter()
        .filter(|f| !body.contains_key(*f))
        .map(str::to_string)
        .collect()
}

pub fn empty_required_fields(rules: &RuleSet, body: &Map<String, Value>) -> Vec<String> {
    rules
        .required_fields()
        .into_iter()
        .filter(|f| body.get(*f).is_some_and(is_empty_value))
        .map(str::to_string)
        .collect()
}

pub fn unique_message(field: &str) -> String {
    format!("The {} field must contain a unique value.", field)
}

#[derive(Debug)]
pub enum ValidateError {
    Invalid(FieldErrors),
    Store(StoreError),
}

impl From<StoreError> for ValidateError {
    fn from(err: StoreError) -> Self {
        ValidateError::Store(err)
    }
}

/// Runs every present field through its rules. The first failing rule of a
/// field wins; failures across fields are collected.
pub async fn validate(
    rules: &RuleSet,
    body: &Map<String, Value>,
    store: &dyn UserStore,
    exclude: Option<Uuid>,
) -> Result<(), ValidateError> {
    let mut errors = FieldErrors::new();
    for field_rules in rules.fields() {
        let Some(value) = body.get(field_rules.field) else {
            continue;
        };
        if let Some(message) = check_field(field_rules.field, &field_rules.rules, value, store, exclude).await? {
            errors.insert(field_rules.field.to_string(), Value::String(message));
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Invalid(errors))
    }
}

async fn check_field(
    field: &str,
    rules: &[Rule],
    value: &Value,
    store: &dyn UserStore,
    exclude: Option<Uuid>,
) -> Result<Option<String>, StoreError> {
    let empty = is_empty_value(value);
    if empty && rules.contains(&Rule::PermitEmpty) {
        return Ok(None);
    }
    // Required and filled also reject text that is blank once trimmed.
    let blank = empty || value.as_str().is_some_and(|s| s.trim().is_empty());
    if blank && rules.contains(&Rule::Required) {
        return Ok(Some(format!("The {} field is required.", field)));
    }
    if blank && rules.contains(&Rule::Filled) {
        return Ok(Some(format!("The {} field cannot be empty.", field)));
    }
    let Some(text) = as_text(value) else {
        return Ok(Some(format!("The {} field must be a string.", field)));
    };

    for rule in rules {
        let failure = match rule {
            Rule::Required | Rule::Filled | Rule::PermitEmpty => None,
            Rule::ValidEmail => (!is_valid_email(&text))
                .then(|| format!("The {} field must contain a valid email address.", field)),
            Rule::Numeric => (!DIGITS_RE.is_match(&text))
                .then(|| format!("The {} field must contain only numbers.", field)),
            Rule::MinLength(n) => (text.chars().count() < *n)
                .then(|| format!("The {} field must be at least {} characters in length.", field, n)),
            Rule::MaxLength(n) => (text.chars().count() > *n)
                .then(|| format!("The {} field cannot exceed {} characters in length.", field, n)),
            Rule::InList(items) => (!items.contains(&text.as_str()))
                .then(|| format!("The {} field must be one of: {}.", field, items.join(","))),
            Rule::IsUnique(unique) => {
                if taken(store, *unique, &text, exclude).await? {
                    Some(unique_message(field))
                } else {
                    None
                }
            }
        };
        if failure.is_some() {
            return Ok(failure);
        }
    }
    Ok(None)
}

async fn taken(
    store: &dyn UserStore,
    field: UniqueField,
    value: &str,
    exclude: Option<Uuid>,
) -> Result<bool, StoreError> {
    store.exists_with(field, value, exclude).await
}
