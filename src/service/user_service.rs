use crate::constants;
use crate::dao::{problem_dao as pd, user_dao as ud};
use crate::model::problem::Difficulty;
use crate::model::traits::Model;
use crate::model::user::Role;
use crate::service::forms::ProblemQuery;
use crate::types::error::Error;
use crate::types::{links::ResponseResult, response::Response};
use crate::utils::jwt::UserToken;
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};

pub async fn get_problems(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Query(q): Query<ProblemQuery>,
) -> ResponseResult {
    let difficulty = match q.difficulty {
        Some(d) => Some(d.parse::<Difficulty>().map_err(|e| Error::validation(&e))?),
        None => None,
    };
    let list = pd::list(
        &state.store,
        token_data.role,
        token_data.passkey.as_deref(),
        difficulty,
    )
    .await;
    Ok(Response::from(list).into_response())
}

pub async fn get_problem(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(pid): Path<u32>,
) -> ResponseResult {
    let p = pd::get_by_id(&state.store, pid)
        .await
        .ok_or_else(|| Error::not_found("Problem not found"))?;
    if token_data.is_admin() {
        return Ok(Response::from(p).into_response());
    }
    if !p.unlocked_by(token_data.passkey.as_deref()) {
        return Err(Error::permission_denied("Problem is locked for this passkey").into());
    }
    Ok(Response::from(p.student_view()).into_response())
}

pub async fn get_leaderboard(State(state): State<AppState>) -> ResponseResult {
    Ok(Response::from(ud::leaderboard(&state.store, None).await).into_response())
}

pub async fn get_round_leaderboard(
    State(state): State<AppState>,
    Path(round): Path<String>,
) -> ResponseResult {
    if !constants::ROUNDS.contains(&round) {
        return Err(Error::not_found("No such round").into());
    }
    Ok(Response::from(ud::leaderboard(&state.store, Some(&round)).await).into_response())
}

/// The caller's own profile with submission history.
pub async fn get_me(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
) -> ResponseResult {
    let u = ud::get(&state.store, &token_data.id)
        .await
        .ok_or_else(|| Error::not_found("User not found"))?;
    let mut mp = u.public_map();
    if token_data.role == Role::Student {
        mp.insert("passkey".into(), serde_json::json!(token_data.passkey));
    }
    Ok(Response::from(mp).into_response())
}
