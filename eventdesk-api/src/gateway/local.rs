use async_trait::async_trait;
use chrono::NaiveDate;
use shared_types::{Event, NewEvent, Profile, ProfileUpsert};
use std::path::{Path, PathBuf};

use super::{AuthSession, AvatarUpload, Gateway, GatewayError, GatewayUser};
use crate::config::LocalGatewayConfig;
use crate::database::users::UserRecord;
use crate::database::{events as event_db, profiles as profile_db, users as user_db};
use crate::database::AsyncDbConnection;
use crate::helpers::database::{get_avatar_dir, initialize_database};
use crate::helpers::password::verify_password;

pub const DEMO_EMAIL: &str = "demo@example.com";
pub const DEMO_PASSWORD: &str = "password";
pub const DEMO_USER_NAME: &str = "Peter Ford Parker";

const MIN_PASSWORD_LEN: usize = 6;

/// Gateway backed by a SQLite file and a directory of avatars. Used for
/// development and demos when no hosted project is configured.
pub struct LocalGateway {
    db: AsyncDbConnection,
    avatar_dir: PathBuf,
    public_base_url: String,
}

impl From<UserRecord> for GatewayUser {
    fn from(record: UserRecord) -> Self {
        GatewayUser {
            id: record.id,
            email: record.email,
            full_name: record.full_name,
        }
    }
}

impl LocalGateway {
    pub fn open(config: &LocalGatewayConfig) -> anyhow::Result<Self> {
        let database = initialize_database(config.db_path.clone())?;
        let avatar_dir = match &config.avatar_dir {
            Some(dir) => dir.clone(),
            None => get_avatar_dir()?,
        };
        std::fs::create_dir_all(&avatar_dir)?;

        Ok(Self {
            db: database.async_connection.clone(),
            avatar_dir,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn avatar_dir(&self) -> &Path {
        &self.avatar_dir
    }

    /// Creates the demo account with a few sample events. Does nothing when
    /// the account already exists.
    pub async fn seed_demo_user(&self) -> anyhow::Result<()> {
        if user_db::find_user_by_email(self.db.clone(), DEMO_EMAIL)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let user =
            user_db::insert_user(self.db.clone(), DEMO_EMAIL, DEMO_PASSWORD, Some(DEMO_USER_NAME))
                .await?;

        let samples = [
            ("Summer Music Festival", (2023, 7, 15), "8 hours", &["Main Hall", "Studio A", "Lounge"][..]),
            ("Jazz Night", (2023, 7, 22), "3 hours", &["Studio B"][..]),
            ("Classical Concert", (2023, 8, 5), "2 hours", &["Main Hall"][..]),
            ("Rock Band Showcase", (2023, 8, 12), "4 hours", &["Studio A", "Studio B"][..]),
        ];

        for (name, (year, month, day), duration, rooms) in samples {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| anyhow::anyhow!("invalid sample date for {}", name))?;
            let event = NewEvent {
                name: name.to_string(),
                date,
                duration: duration.to_string(),
                rooms: rooms.iter().map(|r| r.to_string()).collect(),
            };
            let id = event_db::insert_event(self.db.clone(), &user.id, &event).await?;
            event_db::insert_rooms(self.db.clone(), &id, &event.rooms).await?;
        }

        tracing::info!("Seeded demo user {}", DEMO_EMAIL);
        Ok(())
    }

    async fn authorize(&self, access_token: &str) -> Result<UserRecord, GatewayError> {
        user_db::user_for_token(self.db.clone(), access_token)
            .await?
            .ok_or(GatewayError::Unauthorized)
    }

    async fn start_session(&self, user: UserRecord) -> Result<AuthSession, GatewayError> {
        let access_token = user_db::create_auth_session(self.db.clone(), &user.id).await?;
        Ok(AuthSession {
            access_token,
            user: user.into(),
        })
    }
}

fn row_level_violation() -> GatewayError {
    GatewayError::Policy("new row violates row-level security policy".to_string())
}

#[async_trait]
impl Gateway for LocalGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, GatewayError> {
        let user = user_db::find_user_by_email(self.db.clone(), email)
            .await?
            .filter(|user| verify_password(password, &user.password_salt, &user.password_hash))
            .ok_or(GatewayError::Unauthorized)?;

        self.start_session(user).await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthSession, GatewayError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(GatewayError::Policy(format!(
                "Password should be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if user_db::find_user_by_email(self.db.clone(), email)
            .await?
            .is_some()
        {
            return Err(GatewayError::Policy("User already registered".to_string()));
        }

        let user = user_db::insert_user(self.db.clone(), email, password, full_name).await?;
        self.start_session(user).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), GatewayError> {
        if user_db::delete_auth_session(self.db.clone(), access_token).await? {
            Ok(())
        } else {
            Err(GatewayError::Unauthorized)
        }
    }

    async fn current_user(&self, access_token: &str) -> Result<GatewayUser, GatewayError> {
        Ok(self.authorize(access_token).await?.into())
    }

    async fn list_events(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Vec<Event>, GatewayError> {
        let user = self.authorize(access_token).await?;
        if user.id != user_id {
            // row-level security hides other users' rows
            return Ok(Vec::new());
        }

        Ok(event_db::list_events_for_user(self.db.clone(), user_id).await?)
    }

    async fn create_event(
        &self,
        access_token: &str,
        user_id: &str,
        event: &NewEvent,
    ) -> Result<String, GatewayError> {
        let user = self.authorize(access_token).await?;
        if user.id != user_id {
            return Err(row_level_violation());
        }

        Ok(event_db::insert_event(self.db.clone(), user_id, event).await?)
    }

    async fn attach_rooms(
        &self,
        access_token: &str,
        event_id: &str,
        rooms: &[String],
    ) -> Result<(), GatewayError> {
        let user = self.authorize(access_token).await?;
        match event_db::event_owner(self.db.clone(), event_id).await? {
            Some(owner) if owner == user.id => {}
            Some(_) => return Err(row_level_violation()),
            None => return Err(GatewayError::NotFound(format!("event {}", event_id))),
        }

        Ok(event_db::insert_rooms(self.db.clone(), event_id, rooms).await?)
    }

    async fn get_profile(
        &self,
        access_token: &str,
        user_id: &str,
    ) -> Result<Profile, GatewayError> {
        let user = self.authorize(access_token).await?;
        if user.id != user_id {
            return Err(GatewayError::NotFound(format!("profile {}", user_id)));
        }

        profile_db::get_profile(self.db.clone(), user_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("profile {}", user_id)))
    }

    async fn upsert_profile(
        &self,
        access_token: &str,
        profile: &ProfileUpsert,
    ) -> Result<(), GatewayError> {
        let user = self.authorize(access_token).await?;
        if user.id != profile.id {
            return Err(row_level_violation());
        }

        Ok(profile_db::upsert_profile(self.db.clone(), profile).await?)
    }

    async fn upload_avatar(
        &self,
        access_token: &str,
        user_id: &str,
        upload: &AvatarUpload,
    ) -> Result<String, GatewayError> {
        let user = self.authorize(access_token).await?;
        if user.id != user_id {
            return Err(row_level_violation());
        }

        let object_path = upload.object_path(user_id);
        tokio::fs::write(self.avatar_dir.join(&object_path), &upload.bytes)
            .await
            .map_err(|e| GatewayError::Storage(format!("Failed to store avatar: {}", e)))?;

        Ok(format!("{}/avatars/{}", self.public_base_url, object_path))
    }
}
