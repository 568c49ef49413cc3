use super::submission::Submission;
use super::traits::Model;
use crate::constants;
use blind_judge_derive::{GetFieldNames, IntoJsonMap};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Student,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, GetFieldNames, IntoJsonMap)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String, // login identifier
    #[serde(default)]
    pub password: String,
    pub role: Role,
    pub score: u64,
    pub rounds: BTreeMap<String, u64>,
    pub problems_solved: u32,
    pub last_submission: Option<String>,
    pub submissions: Vec<Submission>,
}

impl User {
    pub fn student(id: String, name: &str, email: &str, password: &str) -> Self {
        User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Student,
            rounds: constants::ROUNDS.iter().map(|r| (r.clone(), 0)).collect(),
            ..Default::default()
        }
    }

    pub fn admin(login: &str) -> Self {
        User {
            id: constants::ADMIN_ID.to_string(),
            name: constants::ADMIN_NAME.to_string(),
            email: login.to_string(),
            role: Role::Admin,
            ..Default::default()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn round_score(&self, round: &str) -> u64 {
        self.rounds.get(round).copied().unwrap_or(0)
    }
}

impl Model for User {
    type Id = String;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn private_fields() -> &'static [&'static str] {
        &["password"]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub score: u64,
    pub problems_solved: u32,
}
