pub mod auth_admin;
pub mod auth_login;
pub mod token_decode;
