pub mod problem;
pub mod session;
pub mod submission;
pub mod traits;
pub mod user;
pub mod verdict;
