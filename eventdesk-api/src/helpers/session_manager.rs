use chrono::{DateTime, Duration, Utc};
use event_filters::DashboardState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::gateway::{AuthSession, GatewayUser};

/// One signed-in browser. The dashboard state lives here instead of in
/// client-side storage.
pub struct Session {
    pub token: String,
    pub user: GatewayUser,
    pub access_token: String,
    pub user_name: String,
    pub dashboard: DashboardState,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, SharedSession>>>,
    ttl: Duration,
}

/// Display name shown in the sidebar: the profile name when there is one,
/// otherwise the email
pub fn display_name(user: &GatewayUser) -> String {
    user.full_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| user.email.clone())
}

impl SessionManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self, auth: AuthSession) -> SharedSession {
        let now = Utc::now();
        let token = uuid::Uuid::new_v4().simple().to_string();
        let session = Session {
            token: token.clone(),
            user_name: display_name(&auth.user),
            user: auth.user,
            access_token: auth.access_token,
            dashboard: DashboardState::new(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let session = Arc::new(Mutex::new(session));
        let mut sessions = self.sessions.lock().await;
        sessions.insert(token, session.clone());
        session
    }

    /// Looks up a live session. Expired sessions are dropped on sight.
    ///
    /// The session map is not held while waiting on the session itself.
    pub async fn get(&self, token: &str) -> Option<SharedSession> {
        let session = self.sessions.lock().await.get(token)?.clone();

        if session.lock().await.is_expired(Utc::now()) {
            let mut sessions = self.sessions.lock().await;
            if sessions
                .get(token)
                .map_or(false, |current| Arc::ptr_eq(current, &session))
            {
                sessions.remove(token);
            }
            return None;
        }

        Some(session)
    }

    pub async fn remove(&self, token: &str) -> Option<SharedSession> {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(token)
    }

    /// Drops every expired session and returns how many were removed.
    /// Sessions locked by a request in flight are left for the next pass.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        sessions.retain(|_, session| match session.try_lock() {
            Ok(session) if session.is_expired(now) => {
                tracing::debug!(
                    "Expiring session for {} after {} minutes",
                    session.user.email,
                    (now - session.created_at).num_minutes()
                );
                false
            }
            _ => true,
        });

        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
