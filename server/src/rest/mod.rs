//! REST-Interface fuer Torwache

pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use torwache_auth::AuthService;
use torwache_db::SqliteDb;

/// Der im Server verwendete Auth-Service
pub type TorwacheAuth = AuthService<SqliteDb, SqliteDb>;

/// Einstellungen fuer das Refresh-Token-Cookie
#[derive(Debug, Clone)]
pub struct CookieKonfig {
    pub secure: bool,
    /// Lebensdauer in Sekunden (entspricht der Refresh-Token-Gueltigkeit)
    pub max_age_sek: i64,
}

/// Axum-State fuer die REST-API
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<TorwacheAuth>,
    pub cookie: CookieKonfig,
}

impl AppState {
    pub fn neu(auth: Arc<TorwacheAuth>, cookie: CookieKonfig) -> Self {
        Self { auth, cookie }
    }
}

/// Erstellt den vollstaendigen Router inklusive Trace- und CORS-Layer
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    // CORS konfigurieren: entweder spezifische Origins oder Any
    let cors = if cors_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/v1/auth/register", post(handlers::register))
        .route("/v1/auth/login", post(handlers::login))
        .route("/v1/auth/refresh", post(handlers::refresh))
        .route("/v1/auth/logout", post(handlers::logout))
        .route("/v1/auth/logout-all", post(handlers::logout_all))
        .route("/v1/permissions", get(handlers::permissions))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
