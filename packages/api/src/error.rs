use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use promptgate_core::ServiceError;

use crate::models::ErrorBody;

/// Error returned by every handler.
#[derive(Debug)]
pub enum ApiError {
    /// The request body could not be read as the expected JSON.
    Rejected { status: StatusCode, message: String },
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Rejected { status, message } => (*status, "invalid_argument", message.clone()),
            ApiError::Service(ServiceError::InvalidArgument(message)) => {
                (StatusCode::BAD_REQUEST, "invalid_argument", message.clone())
            }
            ApiError::Service(err) if err.is_model_invocation() => {
                (StatusCode::BAD_GATEWAY, "model_invocation", err.to_string())
            }
            ApiError::Service(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                err.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %message, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %message, "request rejected");
        }

        (
            status,
            Json(ErrorBody {
                error: code,
                message,
            }),
        )
            .into_response()
    }
}
