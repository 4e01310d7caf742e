use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::response::{ApiResponse, FieldErrors, ValidationInfo};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid UUID format")]
    InvalidIdentifier,

    #[error("User not found")]
    NotFound,

    #[error("Malformed JSON body")]
    MalformedBody(String),

    #[error("{message}")]
    EmptyBody {
        message: &'static str,
        info: ValidationInfo,
    },

    #[error("Invalid parameters provided")]
    DisallowedParameters {
        fields: Vec<String>,
        info: ValidationInfo,
    },

    #[error("Missing required parameters")]
    MissingParameters {
        fields: Vec<String>,
        info: ValidationInfo,
    },

    #[error("Empty values for required parameters")]
    EmptyParameters {
        fields: Vec<String>,
        info: ValidationInfo,
    },

    #[error("Validation failed")]
    Validation {
        errors: FieldErrors,
        info: ValidationInfo,
    },

    #[error("{message}")]
    Failed {
        message: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn failed(message: &'static str, source: impl Into<anyhow::Error>) -> Self {
        ApiError::Failed {
            message,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidIdentifier
            | ApiError::MalformedBody(_)
            | ApiError::EmptyBody { .. }
            | ApiError::DisallowedParameters { .. }
            | ApiError::MissingParameters { .. }
            | ApiError::EmptyParameters { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Failed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ApiResponse::failure(status, self.to_string());

        match self {
            ApiError::InvalidIdentifier => {
                body.validation_info = Some(ValidationInfo::identifier_format());
            }
            ApiError::NotFound => {}
            ApiError::MalformedBody(detail) => {
                body.error = Some(detail);
            }
            ApiError::EmptyBody { info, .. } => {
                body.validation_info = Some(info);
            }
            ApiError::DisallowedParameters { fields, info } => {
                body.unallowed_parameters = Some(fields);
                body.validation_info = Some(info);
            }
            ApiError::MissingParameters { fields, info } => {
                body.missing_parameters = Some(fields);
                body.validation_info = Some(info);
            }
            ApiError::EmptyParameters { fields, info } => {
                body.empty_parameters = Some(fields);
                body.validation_info = Some(info);
            }
            ApiError::Validation { errors, info } => {
                body.errors = Some(errors);
                body.validation_info = Some(info);
            }
            ApiError::Failed { source, .. } => {
                error!(error = %source, message = %body.message, "request failed");
                body.error = Some(source.to_string());
            }
        }

        if status.is_client_error() {
            warn!(%status, message = %body.message, "request rejected");
        }
        body.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_category() {
        assert_eq!(ApiError::InvalidIdentifier.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation {
                errors: FieldErrors::new(),
                info: ValidationInfo::default()
            }
            .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::failed("Failed to create user", anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn failure_message_is_the_envelope_message() {
        let err = ApiError::failed("Failed to delete user", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Failed to delete user");
    }
}
