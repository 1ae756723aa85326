use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::mqtt::PublishError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Required fields: serial, id_sensor")]
    MissingRequiredField,

    #[error("Invalid serial. Valid values: 0x001C (humidity), 0x001D (light)")]
    InvalidSerial,

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Timed out connecting to MQTT broker")]
    ConnectTimeout,

    #[error("MQTT connection error: {0}")]
    ConnectionError(String),

    #[error("MQTT publish failed: {0}")]
    PublishFailed(String),
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::ConnectTimeout(_) => Self::ConnectTimeout,
            PublishError::Connection(e) => Self::ConnectionError(e.to_string()),
            PublishError::Publish(e) => Self::PublishFailed(e.to_string()),
            PublishError::Serialize(e) => Self::PublishFailed(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::MethodNotAllowed | Self::MissingRequiredField | Self::InvalidSerial => {
                json!({ "error": self.to_string() })
            }
            Self::InvalidBody(msg) => json!({
                "error": "Invalid request body",
                "message": msg,
            }),
            Self::ConnectTimeout | Self::ConnectionError(_) | Self::PublishFailed(_) => {
                tracing::error!("Error publishing configuration: {self}");
                json!({
                    "error": "Failed to publish configuration",
                    "message": self.to_string(),
                })
            }
        };

        (self.status_code(), Json(body)).into_response()
    }
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::MissingRequiredField | Self::InvalidSerial | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ConnectTimeout | Self::ConnectionError(_) | Self::PublishFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
