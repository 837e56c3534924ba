use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Default, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// Returned after a successful sign-in or sign-up. `token` goes into the
/// `Authorization: Bearer` header of every later request.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SignInResponse {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub user_name: String,
}

/// Sidebar state, same shape the browser used to keep in local storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub is_logged_in: bool,
    pub user_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_keeps_browser_shape() {
        let info = SessionInfo {
            is_logged_in: true,
            user_name: "Peter Ford Parker".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({ "isLoggedIn": true, "userName": "Peter Ford Parker" })
        );
    }
}
