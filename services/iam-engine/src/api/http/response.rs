//! 错误响应
//!
//! 所有错误以 RFC 7807 Problem Details 返回，`code` 字段携带业务错误码。

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use iam_errors::AppError;
use tracing::error;

use crate::error::AuthError;

#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self(e)
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        Self(AuthError::Infrastructure(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        let app_error = AppError::from(self.0);
        if app_error.is_server_error() {
            error!(code, error = %app_error, "Request failed");
        }

        let problem = app_error.to_problem_details().with_code(code);
        let status =
            StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            problem.to_json(),
        )
            .into_response()
    }
}
