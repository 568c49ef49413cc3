use super::error::{Error, ErrorType};
use super::response::Response;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
};

use std::fmt::{Debug, Display, Formatter};

#[derive(Debug)]
pub struct ErrorResponse {
    status: StatusCode,
    info: String,
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> AxumResponse {
        (self.status, Response::from_msg(self.info.as_str())).into_response()
    }
}

impl Display for ErrorResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl From<Error> for ErrorResponse {
    fn from(e: Error) -> Self {
        let status = match e.error_type {
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::Validation => StatusCode::BAD_REQUEST,
            ErrorType::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::Environment => StatusCode::SERVICE_UNAVAILABLE,
            ErrorType::SystemError => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ErrorResponse::from(status, e.error)
    }
}

impl From<anyhow::Error> for ErrorResponse {
    fn from(e: anyhow::Error) -> Self {
        ErrorResponse::server_error_with_str(format!("{}", e).as_str())
    }
}

impl ErrorResponse {
    pub fn from(status: StatusCode, info: String) -> Self {
        Self { status, info }
    }
    pub fn status(&self) -> StatusCode {
        self.status
    }
    pub fn not_found_with_str(err: &str) -> Self {
        ErrorResponse::from(StatusCode::NOT_FOUND, err.to_string())
    }
    pub fn server_error_with_str(err: &str) -> Self {
        ErrorResponse::from(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
    pub fn forbidden_with_str(err: &str) -> Self {
        ErrorResponse::from(StatusCode::FORBIDDEN, err.to_string())
    }
    pub fn unauthorized_with_str(err: &str) -> Self {
        ErrorResponse::from(StatusCode::UNAUTHORIZED, err.to_string())
    }
    pub fn bad_request_with_str(err: &str) -> Self {
        ErrorResponse::from(StatusCode::BAD_REQUEST, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (Error::not_found("x"), StatusCode::NOT_FOUND),
            (Error::validation("x"), StatusCode::BAD_REQUEST),
            (Error::permission_denied("x"), StatusCode::FORBIDDEN),
            (Error::unauthorized("x"), StatusCode::UNAUTHORIZED),
            (Error::environment("x"), StatusCode::SERVICE_UNAVAILABLE),
            (Error::system_error("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            let resp: ErrorResponse = err.into();
            assert_eq!(resp.status(), status);
        }
    }
}
