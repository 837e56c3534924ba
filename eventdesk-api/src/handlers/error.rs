use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use shared_types::ErrorResponse;

use crate::gateway::GatewayError;

/// Where the web client sends the user when a request comes back 401
pub const LOGIN_REDIRECT: &str = "/login";

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    Validation(String),
    GatewayRead(String),
    GatewayWrite(String),
    Internal(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Not signed in".to_string())
    }

    /// A failed fetch. The session keeps whatever it already had.
    pub fn from_gateway_read(e: GatewayError) -> Self {
        match e {
            GatewayError::Unauthorized => ApiError::Unauthorized(e.to_string()),
            other => {
                tracing::error!("Gateway read failed: {}", other);
                ApiError::GatewayRead(other.to_string())
            }
        }
    }

    /// A failed create, update or upload. Nothing was applied locally.
    pub fn from_gateway_write(e: GatewayError) -> Self {
        match e {
            GatewayError::Unauthorized => ApiError::Unauthorized(e.to_string()),
            other => {
                tracing::error!("Gateway write failed: {}", other);
                ApiError::GatewayWrite(other.to_string())
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "{}", msg),
            ApiError::Validation(msg) => write!(f, "{}", msg),
            ApiError::GatewayRead(msg) => write!(f, "Failed to load data: {}", msg),
            ApiError::GatewayWrite(msg) => write!(f, "Failed to save changes: {}", msg),
            ApiError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl actix_web::error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::GatewayRead(_) | ApiError::GatewayWrite(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let redirect = match self {
            ApiError::Unauthorized(_) => Some(LOGIN_REDIRECT.to_string()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            redirect,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::ResponseError;

    #[actix_web::test]
    async fn test_unauthorized_carries_redirect() {
        let response = ApiError::unauthorized().error_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.redirect.as_deref(), Some("/login"));
    }

    #[test]
    fn test_gateway_mapping() {
        assert!(matches!(
            ApiError::from_gateway_read(GatewayError::Unauthorized),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from_gateway_read(GatewayError::Decode("bad".to_string())),
            ApiError::GatewayRead(_)
        ));
        assert!(matches!(
            ApiError::from_gateway_write(GatewayError::Policy("rls".to_string())),
            ApiError::GatewayWrite(_)
        ));
        assert_eq!(
            ApiError::GatewayWrite("x".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }
}
