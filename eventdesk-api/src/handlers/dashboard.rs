use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use shared_types::{DashboardResponse, SearchRequest, UpdateFilterRequest};

use super::error::ApiError;
use super::require_session;
use crate::gateway::{Gateway, SharedGateway};
use crate::helpers::session_manager::{Session, SharedSession, SessionManager};

#[derive(Deserialize)]
pub struct DashboardQuery {
    date: Option<String>,
}

fn dashboard_response(session: &Session) -> DashboardResponse {
    let dashboard = &session.dashboard;
    DashboardResponse {
        user_name: session.user_name.clone(),
        total: dashboard.store().len(),
        events: dashboard.visible(Utc::now()),
        search: dashboard.search().to_string(),
        filters: dashboard.filters().clone(),
    }
}

/// Fetches the user's events and hands them to the session store. The
/// session lock is released while the gateway call is in flight; a fetch
/// that completes after a newer one is dropped by the store.
pub(crate) async fn fetch_events(
    session: &SharedSession,
    gateway: &dyn Gateway,
) -> Result<(), ApiError> {
    let (token, access_token, user_id) = {
        let mut session = session.lock().await;
        let token = session.dashboard.store_mut().begin_fetch();
        (token, session.access_token.clone(), session.user.id.clone())
    };

    let events = gateway
        .list_events(&access_token, &user_id)
        .await
        .map_err(ApiError::from_gateway_read)?;

    let count = events.len();
    let mut session = session.lock().await;
    if session.dashboard.store_mut().complete_fetch(token, events) {
        tracing::debug!("Loaded {} events for {}", count, user_id);
    }

    Ok(())
}

pub async fn get_dashboard(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    query: web::Query<DashboardQuery>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;

    let needs_load = !session.lock().await.dashboard.store().is_loaded();
    if needs_load {
        fetch_events(&session, gateway.get_ref().as_ref()).await?;
    }

    let mut session = session.lock().await;
    if let Some(date) = query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            Ok(day) => session.dashboard.select_date(day),
            Err(_) => {
                session.dashboard.apply_filter("date", date);
            }
        }
    }

    Ok(HttpResponse::Ok().json(dashboard_response(&session)))
}

pub async fn refresh_dashboard(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    fetch_events(&session, gateway.get_ref().as_ref()).await?;

    let session = session.lock().await;
    Ok(HttpResponse::Ok().json(dashboard_response(&session)))
}

pub async fn set_search(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
    request: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let mut session = session.lock().await;
    session.dashboard.set_search(request.into_inner().term);

    Ok(HttpResponse::Ok().json(dashboard_response(&session)))
}

pub async fn update_filter(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
    request: web::Json<UpdateFilterRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let update = request.into_inner();

    let mut session = session.lock().await;
    session.dashboard.apply_filter(&update.category, &update.value);

    Ok(HttpResponse::Ok().json(dashboard_response(&session)))
}

pub async fn reset_dashboard(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let mut session = session.lock().await;
    session.dashboard.reset();

    Ok(HttpResponse::Ok().json(dashboard_response(&session)))
}
