use serde::{Deserialize, Serialize};

pub mod event;
pub mod filter;
pub mod profile;
pub mod session;

pub use event::{
    parse_calendar_date, CreateEventRequest, CreateEventResponse, DashboardResponse, Event,
    NewEvent, SearchRequest,
};
pub use filter::{
    DateFilter, DurationFilter, FilterCategory, FilterSelection, UpdateFilterRequest,
};
pub use profile::{AvatarResponse, Profile, ProfileUpsert, UpdateProfileRequest};
pub use session::{SessionInfo, SignInRequest, SignInResponse, SignUpRequest};

/// Error response for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Page the client should navigate to, set on authentication failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}
