//! Shared fixtures for scheduler and disclosure tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use poputka::presenter::{Choice, PresentError, Presenter};
use poputka::trips::Trip;

/// Captures everything the core tries to show; optionally fails
/// deliveries to one user to exercise the swallow-and-log path.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    messages: Mutex<Vec<(i64, String, Vec<Choice>)>>,
    fail_user: Option<i64>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(user_id: i64) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail_user: Some(user_id),
        }
    }

    pub fn messages(&self) -> Vec<(i64, String, Vec<Choice>)> {
        self.messages.lock().expect("not poisoned").clone()
    }

    pub fn last(&self) -> (i64, String, Vec<Choice>) {
        self.messages()
            .last()
            .cloned()
            .expect("at least one message was presented")
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(
        &self,
        user_id: i64,
        text: &str,
        choices: &[Choice],
    ) -> Result<(), PresentError> {
        if self.fail_user == Some(user_id) {
            return Err(PresentError("injected delivery failure".to_owned()));
        }
        self.messages
            .lock()
            .expect("not poisoned")
            .push((user_id, text.to_owned(), choices.to_vec()));
        Ok(())
    }
}

/// A persisted trip with sensible defaults.
pub fn sample_trip(driver_id: i64, from: &str, to: &str, on: NaiveDate) -> Trip {
    Trip {
        id: Uuid::new_v4(),
        driver_id,
        from_city: from.to_owned(),
        to_city: to.to_owned(),
        departure_date: on,
        time: None,
        seats: 3,
        price: Some("1500".to_owned()),
        phone: "+996700123456".to_owned(),
        car: None,
        photos: Vec::new(),
        comment: None,
        created_at: Utc::now(),
    }
}
