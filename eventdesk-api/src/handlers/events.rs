use actix_web::{web, HttpRequest, HttpResponse};
use shared_types::{parse_calendar_date, CreateEventRequest, CreateEventResponse, NewEvent};

use super::dashboard::fetch_events;
use super::error::ApiError;
use super::require_session;
use crate::gateway::SharedGateway;
use crate::helpers::session_manager::SessionManager;

/// Trimmed, non-blank, first occurrence wins
pub fn normalize_rooms(rooms: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(rooms.len());
    for room in rooms {
        let room = room.trim();
        if !room.is_empty() && !normalized.iter().any(|r| r == room) {
            normalized.push(room.to_string());
        }
    }
    normalized
}

pub fn validate_event(req: &CreateEventRequest) -> Result<NewEvent, ApiError> {
    let name = req.name.trim();
    let date = req.date.trim();
    let duration = req.duration.trim();
    let rooms = normalize_rooms(&req.rooms);

    if name.is_empty() || date.is_empty() || duration.is_empty() || rooms.is_empty() {
        return Err(ApiError::Validation(
            "Please fill in all fields and add at least one room".to_string(),
        ));
    }

    let date = parse_calendar_date(date)
        .ok_or_else(|| ApiError::Validation(format!("Invalid date: {}", date)))?;

    Ok(NewEvent {
        name: name.to_string(),
        date,
        duration: duration.to_string(),
        rooms,
    })
}

pub async fn create_event(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    request: web::Json<CreateEventRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let event = validate_event(&request)?;

    let (access_token, user_id) = {
        let session = session.lock().await;
        (session.access_token.clone(), session.user.id.clone())
    };

    let id = gateway
        .create_event(&access_token, &user_id, &event)
        .await
        .map_err(ApiError::from_gateway_write)?;

    gateway
        .attach_rooms(&access_token, &id, &event.rooms)
        .await
        .map_err(|e| {
            tracing::error!("Event {} was created but its rooms were not attached", id);
            ApiError::from_gateway_write(e)
        })?;

    tracing::info!("Created event {} with {} rooms", id, event.rooms.len());

    // The dashboard should show the new event on the next visit
    if let Err(e) = fetch_events(&session, gateway.get_ref().as_ref()).await {
        tracing::warn!("Could not refresh events after create: {}", e);
    }

    Ok(HttpResponse::Created().json(CreateEventResponse { id }))
}
