use crate::constants;
use crate::dao::user_dao as ud;
use crate::model::{traits::Model, user::User};
use crate::service::forms::{LoginForm, RegisterForm};
use crate::types::error::Error;
use crate::types::{links::ResponseResult, response::Response};
use crate::utils::jwt;
use crate::AppState;
use axum::{
    extract::{Extension, Json, State},
    http::HeaderValue,
    response::IntoResponse,
};
use tracing::info;
use validator::Validate;

pub async fn register(State(state): State<AppState>, Json(rf): Json<RegisterForm>) -> ResponseResult {
    rf.validate().map_err(Error::from)?;
    let user = ud::create_student(&state.store, &rf.name, &rf.email, &rf.password).await?;
    info!(id = %user.id, "registered");
    account_info_response(user, None)
}

pub async fn login(State(state): State<AppState>, Json(lf): Json<LoginForm>) -> ResponseResult {
    lf.validate().map_err(Error::from)?;
    let user = ud::authenticate(&state.store, &lf.email, &lf.password).await?;
    info!(id = %user.id, passkey = ?lf.passkey, "logged in");
    account_info_response(user, lf.passkey)
}

/// Re-reads the caller and issues a fresh token with the same passkey.
pub async fn autologin(
    State(state): State<AppState>,
    Extension(token_data): Extension<jwt::UserToken>,
) -> ResponseResult {
    let user = ud::get(&state.store, &token_data.id)
        .await
        .ok_or_else(|| Error::unauthorized("Account no longer exists"))?;
    account_info_response(user, token_data.passkey)
}

pub fn account_info_response(user: User, passkey: Option<String>) -> ResponseResult {
    let token = jwt::encode(&jwt::UserToken::from(&user, passkey))?;
    let mut resp = Response::from(user.public_map()).into_response();
    resp.headers_mut().insert(
        constants::HEAD_TOKEN_NAME,
        HeaderValue::from_str(token.as_str()).map_err(anyhow::Error::from)?,
    );
    Ok(resp)
}
