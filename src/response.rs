use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Per-field validation messages, keyed by field name in rule-table order.
pub type FieldErrors = Map<String, Value>;

/// Guidance block telling clients what a valid request looks like.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_parameters: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_parameters: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_rules: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_request: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_format: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
}

impl ValidationInfo {
    pub fn identifier_format() -> Self {
        Self {
            required_format: Some("UUID v4"),
            example: Some("550e8400-e29b-41d4-a716-446655440000"),
            ..Self::default()
        }
    }
}

/// Uniform response body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_parameters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unallowed_parameters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_parameters: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_info: Option<ValidationInfo>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(success: bool, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success,
            code: status.as_u16(),
            message: message.into(),
            data: None,
            errors: None,
            error: None,
            missing_parameters: None,
            unallowed_parameters: None,
            empty_parameters: None,
            validation_info: None,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::success(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::success(StatusCode::CREATED, data, message)
    }

    pub fn success(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        let mut res = Self::new(true, status, message);
        res.data = Some(data);
        res
    }
}

impl ApiResponse<()> {
    pub fn message_only(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status.is_success(), status, message)
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(false, status, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
