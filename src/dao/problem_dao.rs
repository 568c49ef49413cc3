use super::seed;
use super::store::Store;
use crate::constants::CUSTOM_PROBLEM_ID_OFFSET;
use crate::model::problem::{Difficulty, Problem};
use crate::model::traits::Model;
use crate::model::user::Role;
use crate::types::error::{Error, Result};
use crate::types::links::JsonMap;
use serde_json::Value as Json;
use tracing::info;
use validator::Validate;

fn next_custom_id(custom: &[Problem]) -> u32 {
    custom
        .iter()
        .map(|p| p.id)
        .max()
        .map_or(CUSTOM_PROBLEM_ID_OFFSET, |m| (m + 1).max(CUSTOM_PROBLEM_ID_OFFSET))
}

/// Stores an admin-authored problem under a fresh custom id.
pub async fn add(store: &Store, mut problem: Problem) -> Problem {
    problem.normalize();
    let stored = store
        .mutate(move |t| {
            problem.id = next_custom_id(&t.custom_problems);
            t.custom_problems.push(problem.clone());
            problem
        })
        .await;
    info!(id = stored.id, title = %stored.title, "problem added");
    stored
}

/// Merges `patch` into a custom problem. `Ok(None)` when `id` is not a
/// custom problem.
pub async fn update(store: &Store, id: u32, patch: JsonMap) -> Result<Option<Problem>> {
    if patch.contains_key("id") {
        return Err(Error::validation("problem id cannot be changed"));
    }
    if let Some(k) = patch.keys().find(|k| !Problem::has_field(k)) {
        return Err(Error::validation(format!("unknown problem field {}", k).as_str()));
    }
    let updated = store
        .mutate(|t| -> Result<Option<Problem>> {
            let slot = match t.custom_problems.iter_mut().find(|p| p.id == id) {
                Some(p) => p,
                None => return Ok(None),
            };
            let mut mp: JsonMap = slot.clone().into();
            mp.extend(patch);
            let mut merged: Problem = serde_json::from_value(Json::Object(mp))?;
            merged.id = id;
            merged.normalize();
            merged.validate()?;
            *slot = merged.clone();
            Ok(Some(merged))
        })
        .await?;
    if updated.is_some() {
        info!(id, "problem updated");
    }
    Ok(updated)
}

/// Removes a custom problem. Seed and unknown ids are refused with `false`.
pub async fn delete(store: &Store, id: u32) -> bool {
    if seed::is_seed_id(id) {
        return false;
    }
    let removed = store
        .mutate(|t| {
            let before = t.custom_problems.len();
            t.custom_problems.retain(|p| p.id != id);
            before != t.custom_problems.len()
        })
        .await;
    if removed {
        info!(id, "problem deleted");
    }
    removed
}

pub async fn get_by_id(store: &Store, id: u32) -> Option<Problem> {
    let t = store.read().await;
    t.seed_problems
        .iter()
        .chain(t.custom_problems.iter())
        .find(|p| p.id == id)
        .cloned()
}

pub async fn get_all(store: &Store) -> Vec<Problem> {
    let t = store.read().await;
    t.seed_problems
        .iter()
        .chain(t.custom_problems.iter())
        .cloned()
        .collect()
}

/// The catalogue as a caller may see it: admins get everything, students
/// only what their passkey unlocks, without hidden test cases.
pub async fn list(
    store: &Store,
    role: Role,
    passkey: Option<&str>,
    difficulty: Option<Difficulty>,
) -> Vec<Problem> {
    get_all(store)
        .await
        .into_iter()
        .filter(|p| difficulty.map_or(true, |d| p.difficulty == d))
        .filter_map(|p| match role {
            Role::Admin => Some(p),
            Role::Student if p.unlocked_by(passkey) => Some(p.student_view()),
            Role::Student => None,
        })
        .collect()
}
