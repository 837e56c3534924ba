use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::filter::FilterSelection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_calendar_date")]
    #[ts(type = "string")]
    pub date: NaiveDate,
    /// Free text as entered on the add-event form, e.g. "2 hours"
    pub duration: String,
    #[serde(default)]
    pub rooms: Vec<String>,
}

impl Event {
    /// The moment the event is compared against when bucketing into upcoming/past.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(NaiveTime::default()).and_utc()
    }
}

/// Accepts `YYYY-MM-DD` as well as full timestamps and keeps only the calendar date.
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc).date_naive());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(value, format) {
            return Some(timestamp.date());
        }
    }

    None
}

fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid event date: {}", raw)))
}

/// Body of the add-event form. Every field defaults to empty so missing
/// fields surface as validation errors rather than parse errors.
#[derive(Debug, Default, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct CreateEventRequest {
    pub name: String,
    pub date: String,
    pub duration: String,
    pub rooms: Vec<String>,
}

/// A validated event ready to be written to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewEvent {
    pub name: String,
    pub date: NaiveDate,
    pub duration: String,
    pub rooms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateEventResponse {
    pub id: String,
}

/// What the dashboard renders: the visible subset plus the state that produced it
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardResponse {
    pub user_name: String,
    pub total: usize,
    pub events: Vec<Event>,
    pub search: String,
    pub filters: FilterSelection,
}

#[derive(Debug, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SearchRequest {
    #[serde(default)]
    pub term: String,
}
