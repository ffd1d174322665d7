//! Create Trip flow: the driver-side state machine.
//!
//! A strictly ordered sequence of prompts, one typed input per state.
//! Invalid input never advances the state and never touches the draft;
//! the engine re-issues the same prompt with the returned message key.

use chrono::{Days, Local, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::trips::{Trip, MAX_PHOTOS};
use crate::validate::{validate_phone, validate_time};

use super::DialogEvent;

/// Current prompt of the Create Trip flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateState {
    /// Departure city.
    FromCity,
    /// Destination city.
    ToCity,
    /// Departure date.
    Date,
    /// Optional time of day.
    Time,
    /// Seat count, 1–5.
    Seats,
    /// Optional price.
    Price,
    /// Optional car description.
    Car,
    /// Up to three photos.
    Photos,
    /// Contact phone.
    Phone,
    /// Optional comment.
    Comment,
    /// Preview and confirmation.
    Confirm,
}

/// Working draft for one driver's Create Trip flow. In-memory only;
/// discarded on completion, cancellation, or process exit.
#[derive(Debug, Clone)]
pub struct CreateDraft {
    /// Current state tag; governs which optional fields are set.
    pub state: CreateState,
    /// Collected departure city.
    pub from_city: Option<String>,
    /// Collected destination city.
    pub to_city: Option<String>,
    /// Collected departure date.
    pub departure_date: Option<NaiveDate>,
    /// Collected time of day (`None` after skip).
    pub time: Option<NaiveTime>,
    /// Collected seat count.
    pub seats: Option<u8>,
    /// Collected price (`None` after the negotiable sentinel).
    pub price: Option<String>,
    /// Collected car description.
    pub car: Option<String>,
    /// Collected photo references, in arrival order.
    pub photos: Vec<String>,
    /// Collected contact phone.
    pub phone: Option<String>,
    /// Collected comment.
    pub comment: Option<String>,
}

/// Result of applying one inbound event to a draft.
#[derive(Debug, PartialEq, Eq)]
pub enum CreateStep {
    /// Input accepted; `draft.state` is the next prompt to issue.
    Advanced,
    /// State unchanged; present `key` (re-prompt or format hint).
    Stay(&'static str),
    /// The driver confirmed the preview; the draft is complete.
    Confirmed,
    /// The driver cancelled the flow; the draft must be discarded.
    Cancelled,
}

impl CreateDraft {
    /// Fresh draft positioned at the first prompt.
    pub fn new() -> Self {
        Self {
            state: CreateState::FromCity,
            from_city: None,
            to_city: None,
            departure_date: None,
            time: None,
            seats: None,
            price: None,
            car: None,
            photos: Vec::new(),
            phone: None,
            comment: None,
        }
    }

    /// Apply one inbound event to the draft.
    pub fn apply(&mut self, event: &DialogEvent) -> CreateStep {
        if let DialogEvent::Choice(action) = event {
            if action == "cancel" {
                return CreateStep::Cancelled;
            }
        }

        match self.state {
            CreateState::FromCity => match city_input(event) {
                Some(city) => {
                    self.from_city = Some(city);
                    self.state = CreateState::ToCity;
                    CreateStep::Advanced
                }
                None => CreateStep::Stay("driver.from_city"),
            },
            CreateState::ToCity => match city_input(event) {
                Some(city) => {
                    self.to_city = Some(city);
                    self.state = CreateState::Date;
                    CreateStep::Advanced
                }
                None => CreateStep::Stay("driver.to_city"),
            },
            CreateState::Date => match date_input(event) {
                DateInput::Chosen(date) => {
                    self.departure_date = Some(date);
                    self.state = CreateState::Time;
                    CreateStep::Advanced
                }
                DateInput::ManualRequested => CreateStep::Stay("common.enter_date"),
                DateInput::Invalid => CreateStep::Stay("common.invalid_date"),
            },
            CreateState::Time => match event {
                DialogEvent::Choice(a) if a == "skip" => {
                    self.time = None;
                    self.state = CreateState::Seats;
                    CreateStep::Advanced
                }
                DialogEvent::Text(t) if validate_time(t.trim()) => {
                    match NaiveTime::parse_from_str(t.trim(), "%H:%M") {
                        Ok(time) => {
                            self.time = Some(time);
                            self.state = CreateState::Seats;
                            CreateStep::Advanced
                        }
                        Err(_) => CreateStep::Stay("driver.invalid_time"),
                    }
                }
                _ => CreateStep::Stay("driver.invalid_time"),
            },
            CreateState::Seats => match seats_input(event) {
                Some(seats) => {
                    self.seats = Some(seats);
                    self.state = CreateState::Price;
                    CreateStep::Advanced
                }
                None => CreateStep::Stay("driver.seats"),
            },
            CreateState::Price => match event {
                DialogEvent::Choice(a) if a == "negotiable" => {
                    self.price = None;
                    self.state = CreateState::Car;
                    CreateStep::Advanced
                }
                DialogEvent::Text(t) if !t.trim().is_empty() => {
                    self.price = Some(t.trim().to_owned());
                    self.state = CreateState::Car;
                    CreateStep::Advanced
                }
                _ => CreateStep::Stay("driver.price"),
            },
            CreateState::Car => match event {
                DialogEvent::Choice(a) if a == "skip" => {
                    self.car = None;
                    self.state = CreateState::Photos;
                    CreateStep::Advanced
                }
                DialogEvent::Text(t) if !t.trim().is_empty() => {
                    self.car = Some(t.trim().to_owned());
                    self.state = CreateState::Photos;
                    CreateStep::Advanced
                }
                _ => CreateStep::Stay("driver.car"),
            },
            CreateState::Photos => match event {
                DialogEvent::Media(file_id) => {
                    self.photos.push(file_id.clone());
                    if self.photos.len() >= MAX_PHOTOS {
                        self.state = CreateState::Phone;
                        CreateStep::Advanced
                    } else {
                        CreateStep::Stay("driver.photos")
                    }
                }
                DialogEvent::Choice(a) if a == "skip" => {
                    self.state = CreateState::Phone;
                    CreateStep::Advanced
                }
                _ => CreateStep::Stay("driver.photos"),
            },
            CreateState::Phone => match event {
                // Machine-verified contact values bypass the pattern check.
                DialogEvent::Contact(phone) => {
                    self.phone = Some(phone.clone());
                    self.state = CreateState::Comment;
                    CreateStep::Advanced
                }
                DialogEvent::Text(t) if validate_phone(t.trim()) => {
                    self.phone = Some(t.trim().to_owned());
                    self.state = CreateState::Comment;
                    CreateStep::Advanced
                }
                _ => CreateStep::Stay("driver.invalid_phone"),
            },
            CreateState::Comment => match event {
                DialogEvent::Choice(a) if a == "skip" => {
                    self.comment = None;
                    self.state = CreateState::Confirm;
                    CreateStep::Advanced
                }
                DialogEvent::Text(t) if !t.trim().is_empty() => {
                    self.comment = Some(t.trim().to_owned());
                    self.state = CreateState::Confirm;
                    CreateStep::Advanced
                }
                _ => CreateStep::Stay("driver.comment"),
            },
            CreateState::Confirm => match event {
                DialogEvent::Choice(a) if a == "confirm" => CreateStep::Confirmed,
                _ => CreateStep::Stay("driver.confirm"),
            },
        }
    }

    /// Materialize the confirmed draft into a [`Trip`].
    ///
    /// Returns `None` if a required field is missing, which indicates a
    /// state machine bug rather than bad user input.
    pub fn into_trip(self, driver_id: i64) -> Option<Trip> {
        Some(Trip {
            id: Uuid::new_v4(),
            driver_id,
            from_city: self.from_city?,
            to_city: self.to_city?,
            departure_date: self.departure_date?,
            time: self.time,
            seats: self.seats?,
            price: self.price,
            phone: self.phone?,
            car: self.car,
            photos: self.photos,
            comment: self.comment,
            created_at: Utc::now(),
        })
    }
}

impl Default for CreateDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// A city, from either a button (`city:`/`scity:` token) or free text.
pub(super) fn city_input(event: &DialogEvent) -> Option<String> {
    match event {
        DialogEvent::Choice(action) => action
            .strip_prefix("city:")
            .or_else(|| action.strip_prefix("scity:"))
            .filter(|c| !c.is_empty())
            .map(str::to_owned),
        DialogEvent::Text(t) if !t.trim().is_empty() => Some(t.trim().to_owned()),
        _ => None,
    }
}

/// Outcome of interpreting input at a date prompt.
pub(super) enum DateInput {
    /// A concrete date was picked or typed.
    Chosen(NaiveDate),
    /// The "enter a date" button; prompt for free text.
    ManualRequested,
    /// Unparseable input.
    Invalid,
}

/// Shared date handling: relative buttons (`d:0` today, `d:1` tomorrow),
/// the manual-entry button (`d:manual`), or ISO free text.
pub(super) fn date_input(event: &DialogEvent) -> DateInput {
    match event {
        DialogEvent::Choice(action) => {
            let today = Local::now().date_naive();
            match action.as_str() {
                "d:0" => DateInput::Chosen(today),
                "d:1" => DateInput::Chosen(today.checked_add_days(Days::new(1)).unwrap_or(today)),
                "d:manual" => DateInput::ManualRequested,
                _ => DateInput::Invalid,
            }
        }
        DialogEvent::Text(t) => match NaiveDate::parse_from_str(t.trim(), "%Y-%m-%d") {
            Ok(date) => DateInput::Chosen(date),
            Err(_) => DateInput::Invalid,
        },
        _ => DateInput::Invalid,
    }
}

fn seats_input(event: &DialogEvent) -> Option<u8> {
    match event {
        DialogEvent::Choice(action) => action
            .strip_prefix("seats:")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=5).contains(n)),
        _ => None,
    }
}
