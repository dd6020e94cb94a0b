use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::models::ErrorResponse;
use crate::error::TranslatorError;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
    pub(crate) hint: Option<String>,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            hint: None,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
            hint: None,
        }
    }
}

impl From<TranslatorError> for ServerError {
    fn from(err: TranslatorError) -> Self {
        let status = match &err {
            TranslatorError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TranslatorError::Configuration(_) => StatusCode::PRECONDITION_FAILED,
            TranslatorError::Network(_)
            | TranslatorError::InvalidResponse(_)
            | TranslatorError::Provider { .. } => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
            hint: Some(err.remediation_hint().to_string()),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            hint: self.hint,
        };
        (self.status, Json(body)).into_response()
    }
}
