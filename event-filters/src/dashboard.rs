use chrono::{DateTime, NaiveDate, Utc};
use shared_types::{
    parse_calendar_date, DateFilter, DurationFilter, Event, FilterCategory, FilterSelection,
};

use crate::pipeline::derive;
use crate::store::EventStore;

/// Everything the dashboard page needs for one signed-in user: the fetched
/// events, the search box and the filter menus.
#[derive(Debug, Default, Clone)]
pub struct DashboardState {
    store: EventStore,
    search: String,
    filters: FilterSelection,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EventStore {
        &mut self.store
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filters(&self) -> &FilterSelection {
        &self.filters
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    /// Sets one filter category from a menu selection. Returns `false` when the
    /// category is unknown, in which case nothing changes.
    ///
    /// An empty value clears the category.
    pub fn apply_filter(&mut self, category: &str, value: &str) -> bool {
        let Some(category) = FilterCategory::parse(category) else {
            tracing::debug!("Ignoring unknown filter category {:?}", category);
            return false;
        };

        let value = value.trim();
        let cleared = value.is_empty();

        match category {
            FilterCategory::Date => {
                self.filters.date = (!cleared).then(|| DateFilter::from(value));
            }
            FilterCategory::Duration => {
                self.filters.duration = (!cleared).then(|| DurationFilter::from(value));
            }
            FilterCategory::Room => {
                self.filters.room = (!cleared).then(|| value.to_string());
            }
            FilterCategory::SpecificDate => {
                if cleared {
                    self.filters.specific_date = None;
                } else {
                    match parse_calendar_date(value) {
                        Some(date) => self.filters.specific_date = Some(date),
                        None => {
                            tracing::debug!("Ignoring malformed specific date {:?}", value);
                            return false;
                        }
                    }
                }
            }
        }

        true
    }

    /// Calendar-day selection from the `?date=` side channel
    pub fn select_date(&mut self, date: NaiveDate) {
        self.filters.specific_date = Some(date);
    }

    /// Clears the search term and every filter. The fetched events stay.
    pub fn reset(&mut self) {
        self.search.clear();
        self.filters = FilterSelection::default();
    }

    pub fn visible(&self, now: DateTime<Utc>) -> Vec<Event> {
        derive(self.store.events(), &self.search, &self.filters, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 12, 15, 0, 0).unwrap()
    }

    fn loaded() -> DashboardState {
        let mut state = DashboardState::new();
        state.store_mut().load(vec![
            Event {
                id: "EVT-002".to_string(),
                name: "Jazz Night".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                duration: "3 hours".to_string(),
                rooms: vec!["Studio B".to_string()],
            },
            Event {
                id: "EVT-001".to_string(),
                name: "Summer Festival".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 8, 15).unwrap(),
                duration: "1 hour".to_string(),
                rooms: vec!["Main Hall".to_string()],
            },
        ]);
        state
    }

    #[test]
    fn test_filters_narrow_the_visible_list() {
        let mut state = loaded();
        assert!(state.apply_filter("date", "upcoming"));
        let visible = state.visible(now());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Summer Festival");
    }

    #[test]
    fn test_reset_restores_full_collection() {
        let mut state = loaded();
        state.set_search("jazz");
        state.apply_filter("room", "hall");
        state.apply_filter("duration", "short");
        state.select_date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(state.visible(now()).is_empty());

        state.reset();
        assert_eq!(state.search(), "");
        assert!(state.filters().is_empty());
        assert_eq!(state.visible(now()), state.store().events().to_vec());
    }

    #[test]
    fn test_unknown_category_is_ignored() {
        let mut state = loaded();
        assert!(!state.apply_filter("colour", "red"));
        assert!(state.filters().is_empty());
    }

    #[test]
    fn test_unknown_value_is_kept_but_matches_everything() {
        let mut state = loaded();
        assert!(state.apply_filter("date", "next-decade"));
        assert_eq!(state.filters().date, Some(DateFilter::Unrecognized));
        assert_eq!(state.visible(now()).len(), 2);
    }

    #[test]
    fn test_empty_value_clears_category() {
        let mut state = loaded();
        state.apply_filter("room", "studio");
        state.apply_filter("room", "");
        assert!(state.filters().room.is_none());
    }

    #[test]
    fn test_specific_date_through_filter_category() {
        let mut state = loaded();
        assert!(state.apply_filter("specificDate", "2024-08-15"));
        assert_eq!(state.visible(now())[0].id, "EVT-001");
        assert!(!state.apply_filter("specificDate", "mid-august"));
        assert_eq!(
            state.filters().specific_date,
            NaiveDate::from_ymd_opt(2024, 8, 15)
        );
    }

    #[test]
    fn test_search_and_filter_combine() {
        let mut state = loaded();
        state.set_search("night");
        state.apply_filter("date", "past");
        let visible = state.visible(now());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "EVT-002");
    }
}
