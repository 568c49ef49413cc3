pub mod persistence;
pub mod problem_dao;
pub mod seed;
pub mod store;
pub mod submission_dao;
pub mod user_dao;
