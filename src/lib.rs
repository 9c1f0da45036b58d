use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod validation;

use auth::oauth::GoogleOAuth;
use config::Config;
use db::DocumentStore;
use services::personality::PersonalityAnalyzer;
use services::pillars::PillarCalculator;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
    pub analyzer: Option<Arc<dyn PersonalityAnalyzer>>,
    pub pillars: Arc<dyn PillarCalculator>,
    pub oauth: Option<Arc<GoogleOAuth>>,
}

/// Every registered (verbs, path), logged at startup.
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/health"),
    ("GET", "/readyz"),
    ("GET", "/logs"),
    ("POST", "/log"),
    ("PUT, DELETE", "/log/:log_id"),
    ("POST", "/user_action"),
    ("GET, POST", "/orsa/user_profile"),
    ("GET", "/user_profile/:user_id"),
    ("POST", "/chat-history"),
    ("GET", "/login"),
    ("GET", "/callback"),
    ("GET", "/me"),
];

pub fn build_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(hv) => Some(hv),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        // Logs
        .route("/logs", get(handlers::logs::list_logs))
        .route("/log", post(handlers::logs::create_log))
        .route(
            "/log/:log_id",
            put(handlers::logs::update_log).delete(handlers::logs::delete_log),
        )
        .route("/user_action", post(handlers::logs::user_action))
        // Profiles
        .route(
            "/orsa/user_profile",
            get(handlers::profiles::create_profile).post(handlers::profiles::create_profile),
        )
        .route("/user_profile/:user_id", get(handlers::profiles::get_profile))
        // Chat analysis
        .route("/chat-history", post(handlers::chat::save_chat))
        // Google login
        .route("/login", get(handlers::auth::login))
        .route("/callback", get(handlers::auth::callback))
        .route("/me", get(handlers::auth::me))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
