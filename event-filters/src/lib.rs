//! Event Filters Crate
//!
//! Holds the events fetched for a session and derives the subset the
//! dashboard shows from the search box and filter menus.
//!
//! # Architecture
//!
//! - **Types**: `Event` and `FilterSelection` live in the `shared-types` crate
//! - **Store**: `EventStore` replaces its collection wholesale and discards
//!   responses from fetches older than the one already applied
//! - **Pipeline**: `derive` is a pure function of the events, search term,
//!   filters and the current time
//!
//! # Example
//!
//! ```rust,ignore
//! use event_filters::DashboardState;
//!
//! let mut state = DashboardState::new();
//! let token = state.store_mut().begin_fetch();
//! state.store_mut().complete_fetch(token, events);
//! state.apply_filter("date", "upcoming");
//! let visible = state.visible(chrono::Utc::now());
//! ```

pub mod dashboard;
pub mod duration;
pub mod pipeline;
pub mod store;

pub use dashboard::DashboardState;
pub use duration::parse_duration_minutes;
pub use pipeline::derive;
pub use store::{EventStore, FetchToken};
