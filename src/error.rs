use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Methods every resource endpoint answers to.
pub const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE";

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Body of every successful mutation.
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub message: String,
}

impl ApiResponse {
    pub fn created(id: String, message: &str) -> Self {
        Self {
            id: Some(id),
            message: message.to_string(),
        }
    }

    pub fn message(message: &str) -> Self {
        Self {
            id: None,
            message: message.to_string(),
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            AppError::Persistence(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            AppError::MethodNotAllowed(method) => {
                tracing::warn!("Rejected method {}", method);
                (
                    StatusCode::METHOD_NOT_ALLOWED,
                    format!("Method {} Not Allowed", method),
                )
            }
        };

        let body = Json(ErrorBody {
            code: status.as_u16(),
            error: message,
        });
        let mut response = (status, body).into_response();
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS));
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
