use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    #[ts(type = "string | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields written to the profiles table. Unset fields are left out of the
/// payload so an upsert merges instead of clearing them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileUpsert {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ProfileUpsert {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: None,
            username: None,
            avatar_url: None,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct UpdateProfileRequest {
    pub full_name: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AvatarResponse {
    pub avatar_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_skips_unset_fields() {
        let mut upsert = ProfileUpsert::new("user-1");
        upsert.avatar_url = Some("https://cdn/avatars/user-1.png".to_string());

        let json = serde_json::to_value(&upsert).unwrap();
        assert_eq!(json["id"], "user-1");
        assert_eq!(json["avatar_url"], "https://cdn/avatars/user-1.png");
        assert!(json.get("full_name").is_none());
        assert!(json.get("username").is_none());
    }
}
