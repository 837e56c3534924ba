use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{parse_calendar_date, Event, NewEvent, Profile, ProfileUpsert};
use std::time::Duration;

use super::{AuthSession, AvatarUpload, Gateway, GatewayError, GatewayUser};
use crate::config::GatewayConfig;

const EVENT_COLUMNS: &str = "id,name,date,duration,event_rooms(room_name)";

/// Talks to a hosted Supabase project: GoTrue for auth, PostgREST for the
/// `events`, `event_rooms` and `profiles` tables, and Storage for avatars.
pub struct SupabaseGateway {
    base_url: String,
    anon_key: String,
    avatar_bucket: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AuthUserPayload {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
}

impl From<AuthUserPayload> for GatewayUser {
    fn from(payload: AuthUserPayload) -> Self {
        let full_name = payload
            .user_metadata
            .get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string);
        GatewayUser {
            id: payload.id,
            email: payload.email.unwrap_or_default(),
            full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: AuthUserPayload,
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    room_name: String,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    id: Value,
    name: String,
    date: String,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    event_rooms: Vec<RoomRow>,
}

impl TryFrom<EventRow> for Event {
    type Error = GatewayError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let date = parse_calendar_date(&row.date).ok_or_else(|| {
            GatewayError::Decode(format!("event {} has invalid date {:?}", row.id, row.date))
        })?;

        Ok(Event {
            id: opaque_id(&row.id),
            name: row.name,
            date,
            duration: row.duration.unwrap_or_default(),
            rooms: row.event_rooms.into_iter().map(|r| r.room_name).collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedRow {
    id: Value,
}

/// Ids may be uuids or serial integers depending on the schema
fn opaque_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

async fn check(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body);

    Err(match status {
        StatusCode::UNAUTHORIZED => GatewayError::Unauthorized,
        StatusCode::FORBIDDEN => GatewayError::Policy(message),
        // PostgREST answers 406 when a single-object request matched no rows
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => GatewayError::NotFound(message),
        _ => GatewayError::Status {
            status: status.as_u16(),
            message,
        },
    })
}

impl SupabaseGateway {
    pub fn new(config: &GatewayConfig) -> anyhow::Result<Self> {
        let base_url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("gateway.url is required for the supabase gateway"))?;
        let anon_key = config.anon_key.clone().ok_or_else(|| {
            anyhow::anyhow!("gateway.anon_key is required for the supabase gateway")
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self::with_client(
            base_url,
            anon_key,
            config.avatar_bucket.clone(),
            client,
        ))
    }

    pub fn with_client(
        base_url: String,
        anon_key: String,
        avatar_bucket: String,
        client: reqwest::Client,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            avatar_bucket,
            client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn anonymous(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    fn authed(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
    }

    pub fn public_avatar_url(&self, object_path: &str) -> String {
        self.endpoint(&format!(
            "/storage/v1/object/public/{}/{}",
            self.avatar_bucket, object_path
        ))
    }

    fn session_from_token(body: Value) -> Result<AuthSession, GatewayError> {
        if body.get("access_token").is_none() {
            return Err(GatewayError::ConfirmationRequired);
        }

        let token: TokenResponse =
            serde_json::from_value(body).map_err(|e| GatewayError::Decode(e.to_string()))?;

        Ok(AuthSession {
            access_token: token.access_token,
            user: token.user.into(),
        })
    }
}

#[async_trait]
impl Gateway for SupabaseGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let request = self
            .client
            .post(self.endpoint("/auth/v1/token"))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }));

        let response = self.anonymous(request).send().await?;
        let response = match check(response).await {
            Ok(response) => response,
            // GoTrue reports bad credentials as 400 invalid_grant
            Err(GatewayError::Status { status: 400, .. }) => {
                return Err(GatewayError::Unauthorized)
            }
            Err(e) => return Err(e),
        };

        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Self::session_from_token(body)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthSession, GatewayError> {
        let request = self.client.post(self.endpoint("/auth/v1/signup")).json(&json!({
            "email": email,
            "password": password,
            "data": { "full_name": full_name },
        }));

        let response = check(self.anonymous(request).send().await?).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Self::session_from_token(body)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        let request = self.client.post(self.endpoint("/auth/v1/logout"));
        check(self.authed(request, access_token).send().await?).await?;
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> Result<GatewayUser, GatewayError> {
        let request = self.client.get(self.endpoint("/auth/v1/user"));
        let response = check(self.authed(request, access_token).send().await?).await?;
        let user: AuthUserPayload = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(user.into())
    }

    async fn list_events(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<Event>, GatewayError> {
        let owner = format!("eq.{}", user_id);
        let request = self
            .client
            .get(self.endpoint("/rest/v1/events"))
            .query(&[("select", EVENT_COLUMNS), ("user_id", owner.as_str())]);

        let response = check(self.authed(request, access_token).send().await?).await?;
        let rows: Vec<EventRow> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        rows.into_iter().map(Event::try_from).collect()
    }

    async fn create_event(
        &self,
        access_token: &str,
        user_id: &str,
        event: &NewEvent,
    ) -> Result<String, GatewayError> {
        let request = self
            .client
            .post(self.endpoint("/rest/v1/events"))
            .header("Prefer", "return=representation")
            .json(&json!({
                "name": event.name,
                "date": event.date,
                "duration": event.duration,
                "user_id": user_id,
            }));

        let response = check(self.authed(request, access_token).send().await?).await?;
        let rows: Vec<CreatedRow> = response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        rows.first()
            .map(|row| opaque_id(&row.id))
            .ok_or_else(|| GatewayError::Decode("insert returned no rows".to_string()))
    }

    async fn attach_rooms(
        &self,
        access_token: &str,
        event_id: &str,
        rooms: &[String],
    ) -> Result<(), GatewayError> {
        if rooms.is_empty() {
            return Ok(());
        }

        let rows: Vec<Value> = rooms
            .iter()
            .map(|room| json!({ "event_id": event_id, "room_name": room }))
            .collect();

        let request = self
            .client
            .post(self.endpoint("/rest/v1/event_rooms"))
            .header("Prefer", "return=minimal")
            .json(&rows);

        check(self.authed(request, access_token).send().await?).await?;
        Ok(())
    }

    async fn get_profile(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Profile, GatewayError> {
        let id = format!("eq.{}", user_id);
        let request = self
            .client
            .get(self.endpoint("/rest/v1/profiles"))
            .query(&[("id", id.as_str()), ("select", "*")])
            .header("Accept", "application/vnd.pgrst.object+json");

        let response = check(self.authed(request, access_token).send().await?).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &ProfileUpsert,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .post(self.endpoint("/rest/v1/profiles"))
            .query(&[("on_conflict", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(profile);

        check(self.authed(request, access_token).send().await?).await?;
        Ok(())
    }

    async fn upload_avatar(
        &self,
        access_token: &str,
        user_id: &str,
        upload: &AvatarUpload,
    ) -> Result<String, GatewayError> {
        let object_path = upload.object_path(user_id);
        let request = self
            .client
            .post(self.endpoint(&format!(
                "/storage/v1/object/{}/{}",
                self.avatar_bucket, object_path
            )))
            .header("Content-Type", &upload.content_type)
            .body(upload.bytes.clone());

        check(self.authed(request, access_token).send().await?).await?;
        Ok(self.public_avatar_url(&object_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use httpmock::Method::{GET, POST};
    use httpmock::MockServer;

    fn gateway(server: &MockServer) -> SupabaseGateway {
        SupabaseGateway::with_client(
            server.base_url(),
            "anon-key".to_string(),
            "avatars".to_string(),
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_sign_in_returns_session() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/token")
                .query_param("grant_type", "password")
                .header("apikey", "anon-key")
                .body_contains("\"email\":\"demo@example.com\"");
            then.status(200).json_body(json!({
                "access_token": "jwt-token",
                "token_type": "bearer",
                "user": {
                    "id": "user-1",
                    "email": "demo@example.com",
                    "user_metadata": { "full_name": "Peter Ford Parker" }
                }
            }));
        });

        let session = gateway(&server)
            .sign_in("demo@example.com", "password")
            .await
            .expect("sign in should succeed");

        mock.assert();
        assert_eq!(session.access_token, "jwt-token");
        assert_eq!(session.user.id, "user-1");
        assert_eq!(session.user.full_name.as_deref(), Some("Peter Ford Parker"));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/auth/v1/token");
            then.status(400).json_body(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            }));
        });

        let result = gateway(&server).sign_in("demo@example.com", "nope").await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_sign_up_without_session_needs_confirmation() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/auth/v1/signup")
                .body_contains("\"full_name\":\"Mary Jane\"");
            then.status(200).json_body(json!({
                "id": "user-2",
                "email": "mj@example.com",
                "confirmation_sent_at": "2024-01-01T00:00:00Z"
            }));
        });

        let result = gateway(&server)
            .sign_up("mj@example.com", "secret", Some("Mary Jane"))
            .await;
        assert!(matches!(result, Err(GatewayError::ConfirmationRequired)));
    }

    #[tokio::test]
    async fn test_list_events_joins_rooms() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/events")
                .query_param("select", EVENT_COLUMNS)
                .query_param("user_id", "eq.user-1")
                .header("authorization", "Bearer jwt-token");
            then.status(200).json_body(json!([
                {
                    "id": 7,
                    "name": "Jazz Night",
                    "date": "2023-07-22",
                    "duration": "3 hours",
                    "event_rooms": [{ "room_name": "Studio B" }]
                },
                {
                    "id": "EVT-001",
                    "name": "Summer Music Festival",
                    "date": "2023-07-15T00:00:00+00:00",
                    "duration": "8 hours",
                    "event_rooms": [
                        { "room_name": "Main Hall" },
                        { "room_name": "Lounge" }
                    ]
                }
            ]));
        });

        let events = gateway(&server)
            .list_events("jwt-token", "user-1")
            .await
            .expect("list should succeed");

        mock.assert();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "7");
        assert_eq!(events[0].rooms, vec!["Studio B".to_string()]);
        assert_eq!(events[1].date, NaiveDate::from_ymd_opt(2023, 7, 15).unwrap());
        assert_eq!(events[1].rooms.len(), 2);
    }

    #[tokio::test]
    async fn test_expired_token_is_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/rest/v1/events");
            then.status(401).json_body(json!({ "message": "JWT expired" }));
        });

        let result = gateway(&server).list_events("old", "user-1").await;
        assert!(matches!(result, Err(GatewayError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_create_event_then_attach_rooms() {
        let server = MockServer::start();
        let insert = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/events")
                .header("prefer", "return=representation")
                .body_contains("\"date\":\"2024-09-01\"")
                .body_contains("\"user_id\":\"user-1\"");
            then.status(201).json_body(json!([{ "id": "evt-9" }]));
        });
        let rooms = server.mock(|when, then| {
            when.method(POST)
                .path("/rest/v1/event_rooms")
                .body_contains("\"room_name\":\"Main Hall\"")
                .body_contains("\"event_id\":\"evt-9\"");
            then.status(201);
        });

        let gateway = gateway(&server);
        let event = NewEvent {
            name: "Open Mic".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            duration: "2 hours".to_string(),
            rooms: vec!["Main Hall".to_string()],
        };

        let id = gateway
            .create_event("jwt-token", "user-1", &event)
            .await
            .expect("insert should succeed");
        gateway
            .attach_rooms("jwt-token", &id, &event.rooms)
            .await
            .expect("rooms should attach");

        insert.assert();
        rooms.assert();
        assert_eq!(id, "evt-9");
    }

    #[tokio::test]
    async fn test_policy_rejection() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/rest/v1/profiles");
            then.status(403).json_body(json!({
                "message": "new row violates row-level security policy"
            }));
        });

        let result = gateway(&server)
            .upsert_profile("jwt-token", &ProfileUpsert::new("someone-else"))
            .await;
        match result {
            Err(GatewayError::Policy(message)) => assert!(message.contains("row-level")),
            other => panic!("expected policy error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_profile_is_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/rest/v1/profiles")
                .query_param("id", "eq.user-1")
                .header("accept", "application/vnd.pgrst.object+json");
            then.status(406).json_body(json!({
                "message": "JSON object requested, multiple (or no) rows returned"
            }));
        });

        let result = gateway(&server).get_profile("jwt-token", "user-1").await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_avatar_returns_public_url() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path_contains("/storage/v1/object/avatars/user-1-")
                .header("content-type", "image/png");
            then.status(200).json_body(json!({ "Key": "avatars/user-1.png" }));
        });

        let upload = AvatarUpload {
            file_name: "me.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        };
        let url = gateway(&server)
            .upload_avatar("jwt-token", "user-1", &upload)
            .await
            .expect("upload should succeed");

        mock.assert();
        let prefix = format!("{}/storage/v1/object/public/avatars/user-1-", server.base_url());
        assert!(url.starts_with(&prefix));
        assert!(url.ends_with(".png"));
    }
}
