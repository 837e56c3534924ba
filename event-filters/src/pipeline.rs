use chrono::{DateTime, Datelike, NaiveDate, Utc};
use shared_types::{DateFilter, DurationFilter, Event, FilterSelection};

use crate::duration::{
    legacy_is_short, parse_duration_minutes, MEDIUM_MAX_MINUTES, SHORT_MAX_MINUTES,
};

/// Derives the visible events from the full collection.
///
/// Every active predicate is applied in turn and the result is their logical
/// AND. The input order is preserved and nothing is cached, so calling this
/// twice with the same arguments returns the same list.
pub fn derive(
    events: &[Event],
    search_term: &str,
    filters: &FilterSelection,
    now: DateTime<Utc>,
) -> Vec<Event> {
    let needle = search_term.to_lowercase();
    let room = filters.room.as_ref().map(|r| r.to_lowercase());

    events
        .iter()
        .filter(|event| needle.is_empty() || matches_search(event, &needle))
        .filter(|event| {
            filters
                .date
                .map_or(true, |bucket| matches_date_bucket(event, bucket, now))
        })
        .filter(|event| {
            filters
                .specific_date
                .map_or(true, |date| matches_specific_date(event, date))
        })
        .filter(|event| {
            filters
                .duration
                .map_or(true, |bucket| matches_duration(&event.duration, bucket))
        })
        .filter(|event| room.as_deref().map_or(true, |room| matches_room(event, room)))
        .cloned()
        .collect()
}

/// `needle` must already be lower-cased
fn matches_search(event: &Event, needle: &str) -> bool {
    event.name.to_lowercase().contains(needle)
}

pub fn matches_date_bucket(event: &Event, bucket: DateFilter, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    match bucket {
        DateFilter::Upcoming => event.starts_at() > now,
        DateFilter::Past => event.starts_at() < now,
        DateFilter::Today => event.date == today,
        DateFilter::ThisWeek => event.date.iso_week() == today.iso_week(),
        DateFilter::ThisMonth => {
            event.date.year() == today.year() && event.date.month() == today.month()
        }
        DateFilter::Unrecognized => true,
    }
}

pub fn matches_specific_date(event: &Event, date: NaiveDate) -> bool {
    event.date == date
}

pub fn matches_duration(duration: &str, bucket: DurationFilter) -> bool {
    if bucket == DurationFilter::Unrecognized {
        return true;
    }

    match parse_duration_minutes(duration) {
        Some(minutes) => match bucket {
            DurationFilter::Short => minutes <= SHORT_MAX_MINUTES,
            DurationFilter::Medium => {
                minutes > SHORT_MAX_MINUTES && minutes <= MEDIUM_MAX_MINUTES
            }
            DurationFilter::Long => minutes > MEDIUM_MAX_MINUTES,
            DurationFilter::Unrecognized => true,
        },
        None => bucket == DurationFilter::Short && legacy_is_short(duration),
    }
}

/// `room` must already be lower-cased
fn matches_room(event: &Event, room: &str) -> bool {
    event
        .rooms
        .iter()
        .any(|name| name.to_lowercase().contains(room))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, name: &str, date: &str, duration: &str, rooms: &[&str]) -> Event {
        Event {
            id: id.to_string(),
            name: name.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            duration: duration.to_string(),
            rooms: rooms.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
    }

    fn scenario() -> Vec<Event> {
        vec![
            event("EVT-002", "Jazz Night", "2024-03-01", "3 hours", &["Studio B"]),
            event("EVT-001", "Summer Festival", "2024-08-15", "1 hour", &["Main Hall"]),
        ]
    }

    fn names(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.name.as_str()).collect()
    }

    fn with_date(bucket: DateFilter) -> FilterSelection {
        FilterSelection {
            date: Some(bucket),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_search_no_filters_returns_everything() {
        let events = scenario();
        assert_eq!(derive(&events, "", &FilterSelection::default(), now()), events);
    }

    #[test]
    fn test_empty_collection() {
        let filters = with_date(DateFilter::Upcoming);
        assert!(derive(&[], "jazz", &filters, now()).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_on_name_only() {
        let events = scenario();
        let visible = derive(&events, "jazz", &FilterSelection::default(), now());
        assert_eq!(names(&visible), vec!["Jazz Night"]);

        let visible = derive(&events, "FEST", &FilterSelection::default(), now());
        assert_eq!(names(&visible), vec!["Summer Festival"]);

        // room names are not searched
        assert!(derive(&events, "studio", &FilterSelection::default(), now()).is_empty());
    }

    #[test]
    fn test_upcoming_and_past() {
        let events = scenario();
        let upcoming = derive(&events, "", &with_date(DateFilter::Upcoming), now());
        assert_eq!(names(&upcoming), vec!["Summer Festival"]);

        let past = derive(&events, "", &with_date(DateFilter::Past), now());
        assert_eq!(names(&past), vec!["Jazz Night"]);
    }

    #[test]
    fn test_event_at_now_is_neither_upcoming_nor_past() {
        let events = vec![event("1", "Soundcheck", "2024-06-12", "1 hour", &[])];
        let midnight = Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap();

        assert!(derive(&events, "", &with_date(DateFilter::Upcoming), midnight).is_empty());
        assert!(derive(&events, "", &with_date(DateFilter::Past), midnight).is_empty());
    }

    #[test]
    fn test_today_week_month_buckets() {
        let events = vec![
            event("1", "Today", "2024-06-12", "1 hour", &[]),
            event("2", "Monday", "2024-06-10", "1 hour", &[]),
            event("3", "Month end", "2024-06-30", "1 hour", &[]),
            event("4", "Next month", "2024-07-01", "1 hour", &[]),
        ];

        let today = derive(&events, "", &with_date(DateFilter::Today), now());
        assert_eq!(names(&today), vec!["Today"]);

        let week = derive(&events, "", &with_date(DateFilter::ThisWeek), now());
        assert_eq!(names(&week), vec!["Today", "Monday"]);

        let month = derive(&events, "", &with_date(DateFilter::ThisMonth), now());
        assert_eq!(names(&month), vec!["Today", "Monday", "Month end"]);
    }

    #[test]
    fn test_specific_date_ignores_time() {
        let events = scenario();
        let filters = FilterSelection {
            specific_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        let visible = derive(&events, "", &filters, now());
        assert_eq!(names(&visible), vec!["Jazz Night"]);
    }

    #[test]
    fn test_short_duration() {
        let events = scenario();
        let filters = FilterSelection {
            duration: Some(DurationFilter::Short),
            ..Default::default()
        };
        let visible = derive(&events, "", &filters, now());
        assert_eq!(names(&visible), vec!["Summer Festival"]);
    }

    #[test]
    fn test_duration_buckets_are_numeric() {
        assert!(matches_duration("2 hours", DurationFilter::Short));
        assert!(!matches_duration("12 hours", DurationFilter::Short));
        assert!(matches_duration("12 hours", DurationFilter::Long));
        assert!(matches_duration("3 hours", DurationFilter::Medium));
        assert!(matches_duration("90 minutes", DurationFilter::Short));
        assert!(!matches_duration("4 hours", DurationFilter::Long));
    }

    #[test]
    fn test_mixed_and_range_durations() {
        assert!(matches_duration("1 hour 30", DurationFilter::Short));
        assert!(!matches_duration("1 hour 30", DurationFilter::Long));
        assert!(matches_duration("1-2 hours", DurationFilter::Short));
        assert!(!matches_duration("1-2 hours", DurationFilter::Medium));
        assert!(matches_duration("2 hours 30", DurationFilter::Medium));
        assert!(!matches_duration("2 hours 30", DurationFilter::Long));
    }

    #[test]
    fn test_unparseable_duration_falls_back_for_short_only() {
        assert!(matches_duration("1 hour, maybe 2 weeks", DurationFilter::Short));
        assert!(!matches_duration("all evening", DurationFilter::Short));
        assert!(!matches_duration("all evening", DurationFilter::Long));
    }

    #[test]
    fn test_room_substring() {
        let events = scenario();
        let filters = FilterSelection {
            room: Some("hall".to_string()),
            ..Default::default()
        };
        let visible = derive(&events, "", &filters, now());
        assert_eq!(names(&visible), vec!["Summer Festival"]);
    }

    #[test]
    fn test_unrecognized_values_are_noops() {
        let events = scenario();
        let filters = FilterSelection {
            date: Some(DateFilter::Unrecognized),
            duration: Some(DurationFilter::Unrecognized),
            ..Default::default()
        };
        assert_eq!(derive(&events, "", &filters, now()), events);
    }

    #[test]
    fn test_filters_are_anded() {
        let events = scenario();
        let filters = FilterSelection {
            date: Some(DateFilter::Upcoming),
            room: Some("studio".to_string()),
            ..Default::default()
        };
        assert!(derive(&events, "", &filters, now()).is_empty());

        let filters = FilterSelection {
            date: Some(DateFilter::Upcoming),
            room: Some("main".to_string()),
            duration: Some(DurationFilter::Short),
            ..Default::default()
        };
        let visible = derive(&events, "summer", &filters, now());
        assert_eq!(names(&visible), vec!["Summer Festival"]);
    }

    #[test]
    fn test_derive_is_repeatable() {
        let events = scenario();
        let filters = with_date(DateFilter::Upcoming);
        assert_eq!(
            derive(&events, "s", &filters, now()),
            derive(&events, "s", &filters, now())
        );
    }
}
