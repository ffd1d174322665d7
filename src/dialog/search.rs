//! Search Trip flow: the passenger-side state machine.
//!
//! Shorter than the create flow: route, date, then a time-of-day
//! selector. The selector does not filter results; any choice triggers
//! the query (see DESIGN.md).

use chrono::NaiveDate;

use super::create::{city_input, date_input, DateInput};
use super::DialogEvent;

/// Current prompt of the Search Trip flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// Departure city.
    FromCity,
    /// Destination city.
    ToCity,
    /// Travel date.
    Date,
    /// Time-of-day preference (presentation only).
    TimePref,
}

/// Working draft for one passenger's search.
#[derive(Debug, Clone)]
pub struct SearchDraft {
    /// Current state tag.
    pub state: SearchState,
    /// Collected departure city.
    pub from_city: Option<String>,
    /// Collected destination city.
    pub to_city: Option<String>,
    /// Collected travel date.
    pub date: Option<NaiveDate>,
}

/// Result of applying one inbound event to a search draft.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchStep {
    /// Input accepted; `draft.state` is the next prompt to issue.
    Advanced,
    /// State unchanged; present `key`.
    Stay(&'static str),
    /// Time preference selected; run the query and emit results.
    Query,
    /// The passenger cancelled the flow.
    Cancelled,
}

impl SearchDraft {
    /// Fresh draft positioned at the first prompt.
    pub fn new() -> Self {
        Self {
            state: SearchState::FromCity,
            from_city: None,
            to_city: None,
            date: None,
        }
    }

    /// Apply one inbound event to the draft.
    pub fn apply(&mut self, event: &DialogEvent) -> SearchStep {
        if let DialogEvent::Choice(action) = event {
            if action == "cancel" {
                return SearchStep::Cancelled;
            }
        }

        match self.state {
            SearchState::FromCity => match city_input(event) {
                Some(city) => {
                    self.from_city = Some(city);
                    self.state = SearchState::ToCity;
                    SearchStep::Advanced
                }
                None => SearchStep::Stay("passenger.from_city"),
            },
            SearchState::ToCity => match city_input(event) {
                Some(city) => {
                    self.to_city = Some(city);
                    self.state = SearchState::Date;
                    SearchStep::Advanced
                }
                None => SearchStep::Stay("passenger.to_city"),
            },
            SearchState::Date => match date_input(event) {
                DateInput::Chosen(date) => {
                    self.date = Some(date);
                    self.state = SearchState::TimePref;
                    SearchStep::Advanced
                }
                DateInput::ManualRequested => SearchStep::Stay("common.enter_date"),
                DateInput::Invalid => SearchStep::Stay("common.invalid_date"),
            },
            SearchState::TimePref => match event {
                DialogEvent::Choice(action) if action.starts_with("tp:") => SearchStep::Query,
                _ => SearchStep::Stay("passenger.time"),
            },
        }
    }
}

impl Default for SearchDraft {
    fn default() -> Self {
        Self::new()
    }
}
