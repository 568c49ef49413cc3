use crate::constants;
use crate::dao::{problem_dao as pd, seed, user_dao as ud};
use crate::model::problem::Problem;
use crate::model::traits::Model;
use crate::service::forms::ParticipantForm;
use crate::types::error::Error;
use crate::types::{
    links::{JsonMap, ResponseResult},
    response::Response,
};
use crate::AppState;
use axum::{
    extract::{Json as AxumJson, Path, State},
    response::IntoResponse,
};
use validator::Validate;

pub async fn get_users(State(state): State<AppState>) -> ResponseResult {
    let users: Vec<JsonMap> = ud::get_all(&state.store)
        .await
        .into_iter()
        .map(|u| u.public_map())
        .collect();
    Ok(Response::from(users).into_response())
}

pub async fn add_participant(
    State(state): State<AppState>,
    AxumJson(pf): AxumJson<ParticipantForm>,
) -> ResponseResult {
    pf.validate().map_err(Error::from)?;
    let u = ud::create_student(
        &state.store,
        &pf.name,
        &pf.email,
        constants::DEFAULT_PARTICIPANT_PASSWORD,
    )
    .await?;
    Ok(Response::from(u.public_map()).into_response())
}

pub async fn remove_participant(State(state): State<AppState>, Path(uid): Path<String>) -> ResponseResult {
    if !ud::remove_participant(&state.store, &uid).await? {
        return Err(Error::not_found("User not found").into());
    }
    Ok(Response::from_msg("ok").into_response())
}

pub async fn create_problem(
    State(state): State<AppState>,
    AxumJson(mp): AxumJson<JsonMap>,
) -> ResponseResult {
    if let Some(k) = mp.keys().find(|k| !Problem::has_field(k)) {
        return Err(Error::validation(format!("unknown problem field {}", k).as_str()).into());
    }
    let mut problem: Problem = serde_json::from_value(serde_json::Value::Object(mp)).map_err(Error::from)?;
    problem.normalize();
    problem.validate().map_err(Error::from)?;
    Ok(Response::from(pd::add(&state.store, problem).await).into_response())
}

pub async fn update_problem(
    State(state): State<AppState>,
    Path(pid): Path<u32>,
    AxumJson(patch): AxumJson<JsonMap>,
) -> ResponseResult {
    if seed::is_seed_id(pid) {
        return Err(Error::permission_denied("Built-in problems cannot be edited").into());
    }
    match pd::update(&state.store, pid, patch).await? {
        Some(p) => Ok(Response::from(p).into_response()),
        None => Err(Error::not_found("Problem not found").into()),
    }
}

pub async fn delete_problem(State(state): State<AppState>, Path(pid): Path<u32>) -> ResponseResult {
    if seed::is_seed_id(pid) {
        return Err(Error::permission_denied("Built-in problems cannot be deleted").into());
    }
    if !pd::delete(&state.store, pid).await {
        return Err(Error::not_found("Problem not found").into());
    }
    Ok(Response::from_msg("ok").into_response())
}
