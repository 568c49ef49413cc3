use crate::dao::problem_dao as pd;
use crate::model::session::{SessionView, TerminalView};
use crate::proctor::driver::{self, Attempt};
use crate::proctor::registry::SessionEntry;
use crate::proctor::signals::DirectiveSignals;
use crate::service::forms::{CodeBody, SignalBody, StartSessionBody};
use crate::types::error::{Error, Result};
use crate::types::{links::ResponseResult, response::Response};
use crate::utils::jwt::UserToken;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path, State},
    response::IntoResponse,
};
use std::sync::Arc;
use validator::Validate;

async fn owned_session(state: &AppState, sid: &str, token_data: &UserToken) -> Result<Arc<SessionEntry>> {
    state
        .sessions
        .get(sid, &token_data.id)
        .await
        .ok_or_else(|| Error::not_found("Session not found"))
}

/// Loads the problem, requests lockdown and starts the countdown. A client
/// without lockdown support still gets a session; the reason is in `msg`.
pub async fn start_session(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(pid): Path<u32>,
    Json(body): Json<StartSessionBody>,
) -> ResponseResult {
    body.validate().map_err(Error::from)?;
    let problem = pd::get_by_id(&state.store, pid)
        .await
        .ok_or_else(|| Error::not_found("Problem not found"))?;
    if !token_data.is_admin() && !problem.unlocked_by(token_data.passkey.as_deref()) {
        return Err(Error::permission_denied("Problem is locked for this passkey").into());
    }

    let signals = Arc::new(DirectiveSignals::new(body.lockdown_supported));
    let handle = driver::start(
        Attempt {
            user_id: token_data.id.clone(),
            code: problem.starter_code.clone(),
            lang: body.lang,
            elapsed_secs: 0,
            budget_secs: state.proctor.session_budget_secs,
            problem,
        },
        state.proctor.clone(),
        signals.clone(),
        state.engine.clone(),
    );
    let msg = match handle.lockdown_error() {
        Some(e) => e.to_string(),
        None => "ok".to_string(),
    };
    let entry = state
        .sessions
        .insert(&token_data.id, pid, handle, signals)
        .await;
    Ok(Response::new(&msg, SessionView::from(&entry, token_data.role)).into_response())
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(sid): Path<String>,
) -> ResponseResult {
    let entry = owned_session(&state, &sid, &token_data).await?;
    Ok(Response::from(SessionView::from(&entry, token_data.role)).into_response())
}

pub async fn update_code(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(sid): Path<String>,
    Json(body): Json<CodeBody>,
) -> ResponseResult {
    let entry = owned_session(&state, &sid, &token_data).await?;
    if !entry.handle.update_code(body.code) {
        return Err(Error::validation("Session is over").into());
    }
    Ok(Response::from_msg("ok").into_response())
}

/// Focus loss, lockdown loss or a clipboard attempt reported by the client.
pub async fn report_signal(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(sid): Path<String>,
    Json(body): Json<SignalBody>,
) -> ResponseResult {
    let entry = owned_session(&state, &sid, &token_data).await?;
    if !entry.handle.signal(body.signal) {
        return Err(Error::validation("Session is over").into());
    }
    Ok(Response::from_msg("ok").into_response())
}

/// Manual submit. Waits for the verdict; if the session already ended on its
/// own, answers with that session's verdict instead.
pub async fn submit(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(sid): Path<String>,
) -> ResponseResult {
    let entry = owned_session(&state, &sid, &token_data).await?;
    entry.handle.submit();
    let ev = entry
        .handle
        .wait_terminal()
        .await
        .ok_or_else(|| Error::not_found("Session was cancelled"))?;
    Ok(Response::from(TerminalView::from(&ev, token_data.role)).into_response())
}

/// Leaves the attempt without submitting.
pub async fn cancel(
    State(state): State<AppState>,
    Extension(token_data): Extension<UserToken>,
    Path(sid): Path<String>,
) -> ResponseResult {
    let entry = owned_session(&state, &sid, &token_data).await?;
    entry.handle.cancel();
    entry.handle.navigated().await;
    state.sessions.remove(&sid).await;
    Ok(Response::from_msg("ok").into_response())
}
