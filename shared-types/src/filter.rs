use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Date buckets offered by the dashboard filter menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateFilter {
    Upcoming,
    Past,
    Today,
    ThisWeek,
    ThisMonth,
    /// Anything the menu does not offer. Matches every event.
    #[serde(other)]
    Unrecognized,
}

impl From<&str> for DateFilter {
    fn from(value: &str) -> Self {
        match value.trim() {
            "upcoming" => DateFilter::Upcoming,
            "past" => DateFilter::Past,
            "today" => DateFilter::Today,
            "this-week" => DateFilter::ThisWeek,
            "this-month" => DateFilter::ThisMonth,
            _ => DateFilter::Unrecognized,
        }
    }
}

/// Duration buckets: short (up to 2h), medium (2-4h), long (over 4h)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationFilter {
    Short,
    Medium,
    Long,
    #[serde(other)]
    Unrecognized,
}

impl From<&str> for DurationFilter {
    fn from(value: &str) -> Self {
        match value.trim() {
            "short" => DurationFilter::Short,
            "medium" => DurationFilter::Medium,
            "long" => DurationFilter::Long,
            _ => DurationFilter::Unrecognized,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    Date,
    Duration,
    Room,
    SpecificDate,
}

impl FilterCategory {
    pub fn parse(category: &str) -> Option<Self> {
        match category.trim() {
            "date" => Some(FilterCategory::Date),
            "duration" => Some(FilterCategory::Duration),
            "room" => Some(FilterCategory::Room),
            "specificDate" | "specific_date" | "specific-date" => {
                Some(FilterCategory::SpecificDate)
            }
            _ => None,
        }
    }
}

/// The user's active filters, one value per category. All active filters
/// are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct FilterSelection {
    #[ts(type = "\"upcoming\" | \"past\" | \"today\" | \"this-week\" | \"this-month\" | \"unrecognized\" | null")]
    pub date: Option<DateFilter>,
    #[ts(type = "\"short\" | \"medium\" | \"long\" | \"unrecognized\" | null")]
    pub duration: Option<DurationFilter>,
    pub room: Option<String>,
    #[ts(type = "string | null")]
    pub specific_date: Option<NaiveDate>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.duration.is_none()
            && self.room.is_none()
            && self.specific_date.is_none()
    }
}

/// Body of `PUT /api/dashboard/filters`
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateFilterRequest {
    pub category: String,
    pub value: String,
}
