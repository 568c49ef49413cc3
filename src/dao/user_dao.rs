use super::store::{Store, Tables};
use crate::constants;
use crate::model::user::{LeaderboardRow, Role, User};
use crate::types::error::{Error, Result};
use tracing::{info, warn};

fn email_taken(t: &Tables, email: &str) -> bool {
    t.users.iter().any(|u| u.email.eq_ignore_ascii_case(email))
}

/// Creates a student account. Emails are unique, compared case-insensitively.
pub async fn create_student(store: &Store, name: &str, email: &str, password: &str) -> Result<User> {
    let created = store
        .mutate(|t| {
            if email_taken(t, email) || email.eq_ignore_ascii_case(constants::ADMIN_LOGIN.as_str()) {
                return Err(Error::validation("User with this email already exists"));
            }
            let u = User::student(t.allocate_user_id(), name, email, password);
            t.users.push(u.clone());
            Ok(u)
        })
        .await?;
    info!(id = %created.id, email = %created.email, "student created");
    Ok(created)
}

/// An empty configured password matches nothing.
fn admin_password_ok(configured: &str, given: &str) -> bool {
    !configured.is_empty() && given == configured
}

/// Resolves a login. The admin account only accepts the configured admin
/// password; an empty one disables admin login altogether.
pub async fn authenticate(store: &Store, email: &str, password: &str) -> Result<User> {
    let t = store.read().await;
    let user = t
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .ok_or_else(|| Error::unauthorized("Invalid email or password"))?;
    let ok = match user.role {
        Role::Admin => admin_password_ok(constants::ADMIN_PASSWORD.as_str(), password),
        Role::Student => user.password == password,
    };
    if !ok {
        warn!(email, "rejected login");
        return Err(Error::unauthorized("Invalid email or password"));
    }
    Ok(user.clone())
}

pub async fn get(store: &Store, id: &str) -> Option<User> {
    store.read().await.users.iter().find(|u| u.id == id).cloned()
}

pub async fn get_all(store: &Store) -> Vec<User> {
    store.read().await.users.clone()
}

/// Removes a student. The admin account cannot be removed.
pub async fn remove_participant(store: &Store, id: &str) -> Result<bool> {
    let removed = store
        .mutate(|t| {
            match t.users.iter().position(|u| u.id == id) {
                Some(i) if t.users[i].is_admin() => {
                    Err(Error::permission_denied("the admin account cannot be removed"))
                }
                Some(i) => Ok(Some(t.users.remove(i))),
                None => Ok(None),
            }
        })
        .await?;
    match removed {
        Some(u) => {
            info!(id = %u.id, name = %u.name, "participant removed");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Students ranked by total score, or by one round's score when `round` is
/// given. Ties are broken by name.
pub async fn leaderboard(store: &Store, round: Option<&str>) -> Vec<LeaderboardRow> {
    let t = store.read().await;
    let score_of = |u: &User| match round {
        Some(r) => u.round_score(r),
        None => u.score,
    };
    let mut students: Vec<&User> = t.users.iter().filter(|u| !u.is_admin()).collect();
    students.sort_by(|a, b| score_of(b).cmp(&score_of(a)).then_with(|| a.name.cmp(&b.name)));
    students
        .into_iter()
        .enumerate()
        .map(|(i, u)| LeaderboardRow {
            rank: i + 1,
            id: u.id.clone(),
            name: u.name.clone(),
            score: score_of(u),
            problems_solved: u.problems_solved,
        })
        .collect()
}
