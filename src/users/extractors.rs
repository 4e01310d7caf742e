use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::ApiError;

lazy_static! {
    static ref UUID_RE: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[1-5][0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$"
    )
    .unwrap();
}

/// Parses a path segment as a user id, accepting only the canonical
/// hyphenated form with RFC 4122 version and variant bits.
pub fn parse_user_id(raw: &str) -> Result<Uuid, ApiError> {
    if !UUID_RE.is_match(raw) {
        return Err(ApiError::InvalidIdentifier);
    }
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidIdentifier)
}

/// Decoded request body as a field map. A missing body, whitespace or JSON
/// `null` yields an empty map.
#[derive(Debug, Default)]
pub struct RequestFields(pub Map<String, Value>);

impl RequestFields {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ApiError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            Value::Array(items) if items.is_empty() => Ok(Self::default()),
            _ => Err(ApiError::MalformedBody("expected a JSON object".into())),
        }
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestFields
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::MalformedBody(e.body_text()))?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_v4_ids() {
        let id = Uuid::new_v4();
        assert_eq!(parse_user_id(&id.to_string()).unwrap(), id);
        assert!(parse_user_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in [
            "not-a-uuid",
            "",
            "550e8400e29b41d4a716446655440000",
            "550e8400-e29b-01d4-a716-446655440000",
            "550e8400-e29b-41d4-c716-446655440000",
            "{550e8400-e29b-41d4-a716-446655440000}",
        ] {
            assert!(
                matches!(parse_user_id(raw), Err(ApiError::InvalidIdentifier)),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn blank_bodies_are_empty_maps() {
        assert!(RequestFields::from_slice(b"").unwrap().0.is_empty());
        assert!(RequestFields::from_slice(b"  \n").unwrap().0.is_empty());
        assert!(RequestFields::from_slice(b"null").unwrap().0.is_empty());
        assert!(RequestFields::from_slice(b"{}").unwrap().0.is_empty());
    }

    #[test]
    fn object_keys_keep_request_order() {
        let fields = RequestFields::from_slice(br#"{"phone":"1","email":"a@b.co","fullname":"x"}"#)
            .unwrap()
            .0;
        let keys: Vec<_> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, ["phone", "email", "fullname"]);
    }

    #[test]
    fn non_objects_are_malformed() {
        assert!(matches!(
            RequestFields::from_slice(b"[1,2]"),
            Err(ApiError::MalformedBody(_))
        ));
        assert!(matches!(
            RequestFields::from_slice(b"{\"fullname\":"),
            Err(ApiError::MalformedBody(_))
        ));
    }
}
