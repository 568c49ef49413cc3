use crate::types::error_response::ErrorResponse;
use crate::utils::jwt::UserToken;
use axum::{extract::Request, middleware::Next, response::IntoResponse};

pub async fn auth_login(req: Request, next: Next) -> impl IntoResponse {
    match req.extensions().get::<UserToken>() {
        Some(_) => Ok(next.run(req).await),
        None => Err(ErrorResponse::unauthorized_with_str("Please log in first")),
    }
}
