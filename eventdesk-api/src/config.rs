use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub cors: Option<CorsConfig>,
    pub server: Option<ServerConfig>,
    #[serde(default)]
    pub gateway: GatewayConfig,
    pub local: Option<LocalGatewayConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Supabase,
    Local,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GatewayConfig {
    pub kind: GatewayKind,
    /// Project URL of the hosted gateway, e.g. `https://xyz.supabase.co`
    pub url: Option<String>,
    /// Public (anon) API key sent as the `apikey` header
    pub anon_key: Option<String>,
    #[serde(default = "default_avatar_bucket")]
    pub avatar_bucket: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_avatar_bucket() -> String {
    "avatars".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            kind: GatewayKind::Local,
            url: None,
            anon_key: None,
            avatar_bucket: default_avatar_bucket(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocalGatewayConfig {
    /// Defaults to the platform data directory when unset
    pub db_path: Option<PathBuf>,
    pub avatar_dir: Option<PathBuf>,
    /// Base URL avatars are served from, normally this server
    pub public_base_url: String,
    #[serde(default)]
    pub seed_demo_user: bool,
}

impl Default for LocalGatewayConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            avatar_dir: None,
            public_base_url: "http://127.0.0.1:8080".to_string(),
            seed_demo_user: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub ttl_hours: i64,
}

/// One year. Longer lifetimes are clamped to this.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_hours: 12 }
    }
}

impl ApiConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        // Create default config file if it doesn't exist
        if !config_path.exists() {
            let default_config = r#"
[cors]
allowed_origins = ["http://localhost:3000"]

[server]
host = "127.0.0.1"
port = 8080

[gateway]
# "local" keeps everything in a SQLite file, "supabase" talks to a hosted project
kind = "local"
# url = "https://your-project.supabase.co"
# anon_key = "your-anon-key"
avatar_bucket = "avatars"
timeout_secs = 30

[local]
# db_path = "/path/to/eventdesk.sqlite"
# avatar_dir = "/path/to/avatars"
public_base_url = "http://127.0.0.1:8080"
seed_demo_user = true

[session]
ttl_hours = 12
"#;
            std::fs::write(&config_path, default_config).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::from_file(&config_path)?;

        Ok((config, config_path))
    }

    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()))
            .build()?;

        builder.try_deserialize()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        let hours = self
            .session
            .as_ref()
            .map(|s| s.ttl_hours)
            .unwrap_or_else(|| SessionConfig::default().ttl_hours);
        chrono::Duration::hours(hours.clamp(1, MAX_SESSION_TTL_HOURS))
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("eventdesk").join("api.toml")
    } else {
        PathBuf::from("api.toml")
    }
}
