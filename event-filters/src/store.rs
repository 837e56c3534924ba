use shared_types::Event;

/// Identifies one fetch of the event collection. Tokens increase with every
/// fetch started against the same store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchToken(u64);

impl FetchToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// In-memory holder of every event fetched for the current session.
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    events: Vec<Event>,
    loaded: bool,
    next_token: u64,
    applied: Option<FetchToken>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection. Gateway order is kept as-is.
    pub fn load(&mut self, events: Vec<Event>) {
        self.events = events;
        self.loaded = true;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether any fetch has completed since the store was created
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn begin_fetch(&mut self) -> FetchToken {
        self.next_token += 1;
        FetchToken(self.next_token)
    }

    /// Applies the result of the fetch identified by `token`.
    ///
    /// Returns `false` and leaves the collection untouched when a newer fetch
    /// has already been applied.
    pub fn complete_fetch(&mut self, token: FetchToken, events: Vec<Event>) -> bool {
        if let Some(applied) = self.applied {
            if token <= applied {
                tracing::debug!(
                    "Discarding stale fetch {} (already applied {})",
                    token.value(),
                    applied.value()
                );
                return false;
            }
        }

        self.load(events);
        self.applied = Some(token);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: &str) -> Event {
        Event {
            id: id.to_string(),
            name: format!("Event {}", id),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            duration: "1 hour".to_string(),
            rooms: vec![],
        }
    }

    fn ids(store: &EventStore) -> Vec<&str> {
        store.events().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_load_replaces_everything() {
        let mut store = EventStore::new();
        assert!(!store.is_loaded());

        store.load(vec![event("a"), event("b")]);
        store.load(vec![event("c")]);

        assert!(store.is_loaded());
        assert_eq!(ids(&store), vec!["c"]);
    }

    #[test]
    fn test_load_keeps_duplicates_and_order() {
        let mut store = EventStore::new();
        store.load(vec![event("b"), event("a"), event("b")]);
        assert_eq!(ids(&store), vec!["b", "a", "b"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_tokens_increase() {
        let mut store = EventStore::new();
        let first = store.begin_fetch();
        let second = store.begin_fetch();
        assert!(second > first);
    }

    #[test]
    fn test_late_response_is_discarded() {
        let mut store = EventStore::new();
        let older = store.begin_fetch();
        let newer = store.begin_fetch();

        assert!(store.complete_fetch(newer, vec![event("new")]));
        assert!(!store.complete_fetch(older, vec![event("old")]));
        assert_eq!(ids(&store), vec!["new"]);
    }

    #[test]
    fn test_older_response_applies_until_newer_arrives() {
        let mut store = EventStore::new();
        let older = store.begin_fetch();
        let newer = store.begin_fetch();

        assert!(store.complete_fetch(older, vec![event("old")]));
        assert_eq!(ids(&store), vec!["old"]);
        assert!(store.complete_fetch(newer, vec![event("new")]));
        assert_eq!(ids(&store), vec!["new"]);
    }

    #[test]
    fn test_abandoned_fetch_leaves_store_untouched() {
        let mut store = EventStore::new();
        let first = store.begin_fetch();
        store.complete_fetch(first, vec![event("a")]);

        // a fetch that fails never calls complete_fetch
        let _failed = store.begin_fetch();
        assert_eq!(ids(&store), vec!["a"]);
    }
}
