use crate::utils::jwt::{self, UserToken};
use axum::{extract::Request, middleware::Next, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::debug;

/// Attaches the decoded `UserToken` to the request when a valid bearer token
/// is present. Never rejects.
pub async fn token_decode(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(TypedHeader(auth)) = bearer {
        match jwt::decode::<UserToken>(auth.token()) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
            }
            Err(kind) => debug!(?kind, "ignoring bad token"),
        }
    }
    next.run(req).await
}
