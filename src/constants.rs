use crate::config::env;
use lazy_static::lazy_static;

lazy_static! {
    // empty disables admin login
    pub static ref ADMIN_PASSWORD: String = env::get_or("ADMIN_PASSWORD", String::new());
    pub static ref ADMIN_LOGIN: String = env::get_or("ADMIN_LOGIN", DEFAULT_ADMIN_LOGIN.to_string());
    pub static ref CURRENT_ROUND: String = env::get_or("CURRENT_ROUND", DEFAULT_ROUND.to_string());
    pub static ref ROUNDS: Vec<String> = env::get_or("ROUNDS", DEFAULT_ROUNDS.to_string())
        .split(',')
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect();
    pub static ref MAX_JUDGE_TASKS: usize = env::get_or("MAX_JUDGE_TASKS", 2usize);
}

// http
pub const AUTHORIZATION: &str = "Authorization";
pub const HEAD_TOKEN_NAME: &str = "token";

// accounts
pub const ADMIN_ID: &str = "1";
pub const ADMIN_NAME: &str = "Admin User";
pub const DEFAULT_ADMIN_LOGIN: &str = "Nexus_admin";
pub const DEFAULT_PARTICIPANT_PASSWORD: &str = "password123";

// rounds
pub const DEFAULT_ROUND: &str = "1";
pub const DEFAULT_ROUNDS: &str = "1,2,3";

// problems
pub const CUSTOM_PROBLEM_ID_OFFSET: u32 = 100;
pub const DEFAULT_TIME_LIMIT_MS: u64 = 2000;
pub const PASSKEYS: [&str; 3] = ["easy", "medium", "hard"];

// scoring
pub const BASE_SCORE_EASY: u64 = 10;
pub const BASE_SCORE_MEDIUM: u64 = 20;
pub const BASE_SCORE_HARD: u64 = 30;

// proctoring
pub const DEFAULT_SESSION_BUDGET_SECS: u64 = 25 * 60;
pub const DEFAULT_MAX_VIOLATIONS: u32 = 3;
pub const DEFAULT_GRACE_DELAY_SECS: u64 = 3;
pub const SESSION_ID_LEN: usize = 24;

// snapshot layout version, bump on any shape change of users or problems
pub const SCHEMA_VERSION: u32 = 1;
