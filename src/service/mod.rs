pub mod account_service;
pub mod admin_service;
pub mod forms;
pub mod session_service;
pub mod user_service;
