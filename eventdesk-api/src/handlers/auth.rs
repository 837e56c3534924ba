use actix_web::{web, HttpRequest, HttpResponse};
use shared_types::{SessionInfo, SignInRequest, SignInResponse, SignUpRequest};

use super::error::ApiError;
use super::{bearer_token, require_session};
use crate::gateway::{AuthSession, GatewayError, SharedGateway};
use crate::helpers::session_manager::SessionManager;

async fn open_session(
    gateway: &SharedGateway,
    sessions: &SessionManager,
    auth: AuthSession,
) -> SignInResponse {
    // The profile name wins over the name stored on the auth record
    let profile_name = match gateway.get_profile(&auth.access_token, &auth.user.id).await {
        Ok(profile) => profile
            .full_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        Err(e) => {
            tracing::debug!("No profile for {} yet: {}", auth.user.id, e);
            None
        }
    };

    let session = sessions.create(auth).await;
    let mut session = session.lock().await;
    if let Some(name) = profile_name {
        session.user_name = name;
    }

    tracing::info!("Signed in {}", session.user.email);
    SignInResponse {
        token: session.token.clone(),
        user_id: session.user.id.clone(),
        email: session.user.email.clone(),
        user_name: session.user_name.clone(),
    }
}

pub async fn sign_in(
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    request: web::Json<SignInRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let auth = gateway
        .sign_in(req.email.trim(), &req.password)
        .await
        .map_err(|e| match e {
            GatewayError::Unauthorized => {
                tracing::info!("Rejected sign-in for {}", req.email.trim());
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            other => ApiError::from_gateway_read(other),
        })?;

    let response = open_session(&gateway, &sessions, auth).await;
    Ok(HttpResponse::Ok().json(response))
}

pub async fn sign_up(
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = request.into_inner();
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    match gateway.sign_up(req.email.trim(), &req.password, full_name).await {
        Ok(auth) => {
            let response = open_session(&gateway, &sessions, auth).await;
            Ok(HttpResponse::Created().json(response))
        }
        Err(GatewayError::ConfirmationRequired) => {
            Ok(HttpResponse::Accepted().json(serde_json::json!({
                "message": "Check your email to confirm your account"
            })))
        }
        Err(GatewayError::Policy(msg)) => Err(ApiError::Validation(msg)),
        Err(e) => Err(ApiError::from_gateway_write(e)),
    }
}

pub async fn sign_out(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let Some(token) = bearer_token(&req) else {
        return Ok(HttpResponse::NoContent().finish());
    };

    if let Some(session) = sessions.remove(&token).await {
        let access_token = session.lock().await.access_token.clone();
        if let Err(e) = gateway.sign_out(&access_token).await {
            tracing::warn!("Gateway sign-out failed: {}", e);
        }
    }

    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_session(
    req: HttpRequest,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let info = match require_session(&req, &sessions).await {
        Ok(session) => SessionInfo {
            is_logged_in: true,
            user_name: session.lock().await.user_name.clone(),
        },
        Err(_) => SessionInfo {
            is_logged_in: false,
            user_name: String::new(),
        },
    };

    Ok(HttpResponse::Ok().json(info))
}
