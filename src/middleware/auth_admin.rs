use crate::types::error_response::ErrorResponse;
use crate::utils::jwt::UserToken;
use axum::{extract::Request, middleware::Next, response::IntoResponse};

pub async fn auth_admin(req: Request, next: Next) -> impl IntoResponse {
    match req.extensions().get::<UserToken>() {
        Some(token_data) if token_data.is_admin() => Ok(next.run(req).await),
        Some(_) => Err(ErrorResponse::forbidden_with_str("Admin access required")),
        None => Err(ErrorResponse::unauthorized_with_str("Please log in first")),
    }
}
