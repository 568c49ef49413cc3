use crate::{
    middleware::{auth_admin::auth_admin, auth_login::auth_login, token_decode::token_decode},
    service::{account_service, admin_service, session_service, user_service},
    AppState,
};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};

fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/autologin",
            get(account_service::autologin).route_layer(from_fn(auth_login)),
        )
        .route("/register", post(account_service::register))
        .route("/login", post(account_service::login))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin_service::get_users))
        .route("/add_participant", post(admin_service::add_participant))
        .route("/remove_participant/:uid", post(admin_service::remove_participant))
        .route("/create_problem", post(admin_service::create_problem))
        .route("/update_problem/:pid", post(admin_service::update_problem))
        .route("/delete_problem/:pid", post(admin_service::delete_problem))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/problems", get(user_service::get_problems))
        .route("/problem/:pid", get(user_service::get_problem))
        .route("/leaderboard", get(user_service::get_leaderboard))
        .route("/leaderboard/:round", get(user_service::get_round_leaderboard))
        .route("/user/me", get(user_service::get_me))
        .route_layer(from_fn(auth_login))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/start/:pid", post(session_service::start_session))
        .route("/:sid", get(session_service::get_session))
        .route("/:sid/code", post(session_service::update_code))
        .route("/:sid/signal", post(session_service::report_signal))
        .route("/:sid/submit", post(session_service::submit))
        .route("/:sid/cancel", post(session_service::cancel))
        .route_layer(from_fn(auth_login))
}

pub fn config_routes(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .nest("/admin", admin_routes().route_layer(from_fn(auth_admin)))
                .nest("/session", session_routes())
                .merge(user_routes())
                .merge(account_routes()),
        )
        .layer(from_fn(token_decode))
        .with_state(state)
}
