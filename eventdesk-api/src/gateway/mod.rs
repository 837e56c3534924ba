//! Adapters for the backend-as-a-service that owns auth, the events and
//! profiles tables, and avatar storage.

pub mod local;
pub mod supabase;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::{Event, NewEvent, Profile, ProfileUpsert};
use std::sync::Arc;
use thiserror::Error;

pub use local::LocalGateway;
pub use supabase::SupabaseGateway;

pub type SharedGateway = Arc<dyn Gateway>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Not authorized")]
    Unauthorized,

    #[error("Rejected by gateway policy: {0}")]
    Policy(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gateway returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Email confirmation required before signing in")]
    ConfirmationRequired,

    #[error("Unexpected gateway response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        GatewayError::Storage(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayUser {
    pub id: String,
    pub email: String,
    /// Name given at sign-up, if the gateway keeps one on the auth record
    pub full_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub user: GatewayUser,
}

#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AvatarUpload {
    /// Extension taken from the uploaded file name, `png` when there is none
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or_else(|| "png".to_string())
    }

    /// Object name `<user id>-<random>.<ext>`, so re-uploads never collide
    pub fn object_path(&self, user_id: &str) -> String {
        format!("{}-{}.{}", user_id, rand::random::<u32>(), self.extension())
    }
}

/// Everything the dashboard, add-event and settings pages need from the gateway.
///
/// Calls are never retried. On failure the caller surfaces the error and
/// keeps its local state.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthSession, GatewayError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError>;

    async fn current_user(&self, access_token: &str) -> Result<GatewayUser, GatewayError>;

    /// All events owned by `user_id`, room names joined in
    async fn list_events(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<Event>, GatewayError>;

    /// Inserts the event row and returns its id. Rooms are attached separately.
    async fn create_event(
        &self,
        access_token: &str,
        user_id: &str,
        event: &NewEvent,
    ) -> Result<String, GatewayError>;

    async fn attach_rooms(
        &self,
        access_token: &str,
        event_id: &str,
        rooms: &[String],
    ) -> Result<(), GatewayError>;

    async fn get_profile(&self, access_token: &str, user_id: &str)
        -> Result<Profile, GatewayError>;

    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &ProfileUpsert,
    ) -> Result<(), GatewayError>;

    /// Stores the file and returns its public URL
    async fn upload_avatar(
        &self,
        access_token: &str,
        user_id: &str,
        upload: &AvatarUpload,
    ) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> AvatarUpload {
        AvatarUpload {
            file_name: name.to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(upload("me.JPG").extension(), "jpg");
        assert_eq!(upload("archive.tar.gz").extension(), "gz");
        assert_eq!(upload("noext").extension(), "png");
        assert_eq!(upload("weird.p/ng").extension(), "png");
    }

    #[test]
    fn test_object_path_shape() {
        let path = upload("me.webp").object_path("user-1");
        assert!(path.starts_with("user-1-"));
        assert!(path.ends_with(".webp"));
    }
}
