use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use shared_types::{AvatarResponse, ProfileUpsert, SessionInfo, UpdateProfileRequest};
use std::path::PathBuf;

use super::error::ApiError;
use super::require_session;
use crate::gateway::{AvatarUpload, GatewayError, SharedGateway};
use crate::helpers::session_manager::{display_name, SessionManager};

/// Directory avatars are served from when the local gateway is in use
#[derive(Clone)]
pub struct AvatarDir(pub PathBuf);

pub async fn get_profile(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let (access_token, user_id) = {
        let session = session.lock().await;
        (session.access_token.clone(), session.user.id.clone())
    };

    let profile = gateway
        .get_profile(&access_token, &user_id)
        .await
        .map_err(ApiError::from_gateway_read)?;

    Ok(HttpResponse::Ok().json(profile))
}

pub async fn update_profile(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;
    let update = request.into_inner();
    let full_name = update.full_name.trim().to_string();

    let (access_token, user_id) = {
        let session = session.lock().await;
        (session.access_token.clone(), session.user.id.clone())
    };

    let mut upsert = ProfileUpsert::new(user_id);
    upsert.full_name = Some(full_name.clone());
    upsert.username = Some(update.username.trim().to_string());

    gateway
        .upsert_profile(&access_token, &upsert)
        .await
        .map_err(ApiError::from_gateway_write)?;

    let mut session = session.lock().await;
    session.user_name = if full_name.is_empty() {
        display_name(&session.user)
    } else {
        full_name
    };
    tracing::info!("Updated profile for {}", session.user.id);

    Ok(HttpResponse::Ok().json(SessionInfo {
        is_logged_in: true,
        user_name: session.user_name.clone(),
    }))
}

#[derive(Deserialize)]
pub struct AvatarQuery {
    file_name: Option<String>,
}

pub async fn upload_avatar(
    req: HttpRequest,
    gateway: web::Data<SharedGateway>,
    sessions: web::Data<SessionManager>,
    query: web::Query<AvatarQuery>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let session = require_session(&req, &sessions).await?;

    if body.is_empty() {
        return Err(ApiError::Validation(
            "You must select an image to upload.".to_string(),
        ));
    }

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with("image/") {
        return Err(ApiError::Validation(format!(
            "Avatar must be an image, got {:?}",
            content_type
        )));
    }

    let upload = AvatarUpload {
        file_name: query
            .file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "avatar.png".to_string()),
        content_type,
        bytes: body.to_vec(),
    };

    let (access_token, user_id) = {
        let session = session.lock().await;
        (session.access_token.clone(), session.user.id.clone())
    };

    let avatar_url = gateway
        .upload_avatar(&access_token, &user_id, &upload)
        .await
        .map_err(ApiError::from_gateway_write)?;

    let mut upsert = ProfileUpsert::new(user_id);
    upsert.avatar_url = Some(avatar_url.clone());
    gateway
        .upsert_profile(&access_token, &upsert)
        .await
        .map_err(ApiError::from_gateway_write)?;

    Ok(HttpResponse::Ok().json(AvatarResponse { avatar_url }))
}

fn content_type_for(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext.to_lowercase()).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

pub async fn serve_avatar(
    dir: web::Data<AvatarDir>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let file = path.into_inner();
    if file.is_empty() || file.contains(['/', '\\']) || file.starts_with('.') {
        return Err(ApiError::Validation("Invalid avatar name".to_string()));
    }

    match tokio::fs::read(dir.0.join(&file)).await {
        Ok(bytes) => Ok(HttpResponse::Ok()
            .content_type(content_type_for(&file))
            .body(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(HttpResponse::NotFound().finish())
        }
        Err(e) => Err(ApiError::from_gateway_read(GatewayError::Storage(
            e.to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("u-1.PNG"), "image/png");
        assert_eq!(content_type_for("u-1.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("u-1"), "application/octet-stream");
    }
}
