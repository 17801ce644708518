pub mod file;
pub mod partner;

use axum::http::Method;

use crate::error::AppError;

/// Fallback for every method a resource route does not serve
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}
