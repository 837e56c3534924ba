pub mod auth;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod profile;

use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse, Responder};

use crate::helpers::session_manager::{SessionManager, SharedSession};
use error::ApiError;

pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// The caller's live session, or 401 with a redirect to the login page
pub async fn require_session(
    req: &HttpRequest,
    sessions: &SessionManager,
) -> Result<SharedSession, ApiError> {
    let token = bearer_token(req).ok_or_else(ApiError::unauthorized)?;
    sessions.get(&token).await.ok_or_else(|| {
        tracing::debug!("Unknown or expired session token");
        ApiError::unauthorized()
    })
}

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy"
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/auth/sign-in", web::post().to(auth::sign_in))
        .route("/api/auth/sign-up", web::post().to(auth::sign_up))
        .route("/api/auth/sign-out", web::post().to(auth::sign_out))
        .route("/api/session", web::get().to(auth::get_session))
        .route("/api/dashboard", web::get().to(dashboard::get_dashboard))
        .route("/api/dashboard/refresh", web::post().to(dashboard::refresh_dashboard))
        .route("/api/dashboard/search", web::put().to(dashboard::set_search))
        .route("/api/dashboard/filters", web::put().to(dashboard::update_filter))
        .route("/api/dashboard/reset", web::post().to(dashboard::reset_dashboard))
        .route("/api/events", web::post().to(events::create_event))
        .route("/api/profile", web::get().to(profile::get_profile))
        .route("/api/profile", web::put().to(profile::update_profile))
        .route("/api/profile/avatar", web::post().to(profile::upload_avatar));
}
