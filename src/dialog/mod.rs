//! Conversation engine: one active dialog per participant.
//!
//! The engine owns every working draft, applies inbound events to the
//! matching state machine ([`create`] or [`search`]), resolves prompt
//! keys through [`Locales`], and emits everything user-visible through
//! the [`Presenter`] seam. On flow completion it hands the result to the
//! [`TripStore`].
//!
//! Events for the same participant arrive serialized from the channel,
//! so the dialog map lock is held only for the synchronous step
//! application, never across store or presenter calls — unrelated
//! participants make progress concurrently.

pub mod create;
pub mod search;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::i18n::Locales;
use crate::presenter::{Choice, PresentError, Presenter};
use crate::trips::{Trip, TripStore};

use self::create::{CreateDraft, CreateState, CreateStep};
use self::search::{SearchDraft, SearchState, SearchStep};

/// One inbound event, already stripped of transport framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// Free text typed by the participant.
    Text(String),
    /// An action token from a pressed button.
    Choice(String),
    /// A media reference (photo file id).
    Media(String),
    /// A machine-verified contact value (shared phone number).
    Contact(String),
}

/// An active flow and its draft.
#[derive(Debug)]
enum Dialog {
    Create(CreateDraft),
    Search(SearchDraft),
}

/// What to do after a step was applied, computed under the dialog lock
/// and executed after releasing it.
enum Outcome {
    Idle,
    Present { text: String, choices: Vec<Choice> },
    Finish { draft: CreateDraft },
    RunQuery { from: String, to: String, date: NaiveDate },
    Cancel,
}

/// Drives both guided flows for all participants.
pub struct DialogEngine {
    store: Arc<dyn TripStore>,
    locales: Arc<Locales>,
    presenter: Arc<dyn Presenter>,
    cities: Vec<String>,
    dialogs: Mutex<HashMap<i64, Dialog>>,
}

impl DialogEngine {
    /// Create an engine over the given store, locales, and presenter.
    pub fn new(
        store: Arc<dyn TripStore>,
        locales: Arc<Locales>,
        presenter: Arc<dyn Presenter>,
        cities: Vec<String>,
    ) -> Self {
        Self {
            store,
            locales,
            presenter,
            cities,
            dialogs: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the participant has an unfinished dialog.
    pub async fn has_dialog(&self, user_id: i64) -> bool {
        self.dialogs.lock().await.contains_key(&user_id)
    }

    /// Begin the Create Trip flow, silently discarding any earlier draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be delivered.
    pub async fn start_create(&self, user_id: i64) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;
        let draft = CreateDraft::new();
        let (text, choices) = self.create_prompt(&lang, &draft);
        if self
            .dialogs
            .lock()
            .await
            .insert(user_id, Dialog::Create(draft))
            .is_some()
        {
            debug!(user_id, "previous draft discarded by new create flow");
        }
        self.presenter.present(user_id, &text, &choices).await
    }

    /// Begin the Search Trip flow, silently discarding any earlier draft.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be delivered.
    pub async fn start_search(&self, user_id: i64) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;
        let draft = SearchDraft::new();
        let (text, choices) = self.search_prompt(&lang, &draft);
        if self
            .dialogs
            .lock()
            .await
            .insert(user_id, Dialog::Search(draft))
            .is_some()
        {
            debug!(user_id, "previous draft discarded by new search flow");
        }
        self.presenter.present(user_id, &text, &choices).await
    }

    /// Route an inbound event to the participant's active dialog.
    ///
    /// Without an active dialog the event is ignored; commands that start
    /// flows are dispatched by the transport layer, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if a reply cannot be delivered. Store failures
    /// are reported to the participant generically and leave the draft
    /// untouched.
    pub async fn handle_event(&self, user_id: i64, event: DialogEvent) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;

        let outcome = {
            let mut dialogs = self.dialogs.lock().await;
            match dialogs.get_mut(&user_id) {
                None => Outcome::Idle,
                Some(Dialog::Create(draft)) => match draft.apply(&event) {
                    CreateStep::Advanced => {
                        let (text, choices) = self.create_prompt(&lang, draft);
                        Outcome::Present { text, choices }
                    }
                    CreateStep::Stay(key) => {
                        let (_, choices) = self.create_prompt(&lang, draft);
                        Outcome::Present {
                            text: self.locales.resolve(&lang, key).to_owned(),
                            choices,
                        }
                    }
                    CreateStep::Confirmed => Outcome::Finish {
                        draft: draft.clone(),
                    },
                    CreateStep::Cancelled => Outcome::Cancel,
                },
                Some(Dialog::Search(draft)) => match draft.apply(&event) {
                    SearchStep::Advanced => {
                        let (text, choices) = self.search_prompt(&lang, draft);
                        Outcome::Present { text, choices }
                    }
                    SearchStep::Stay(key) => {
                        let (_, choices) = self.search_prompt(&lang, draft);
                        Outcome::Present {
                            text: self.locales.resolve(&lang, key).to_owned(),
                            choices,
                        }
                    }
                    SearchStep::Query => match (&draft.from_city, &draft.to_city, draft.date) {
                        (Some(from), Some(to), Some(date)) => Outcome::RunQuery {
                            from: from.clone(),
                            to: to.clone(),
                            date,
                        },
                        _ => {
                            error!(user_id, "search draft missing fields at query");
                            Outcome::Cancel
                        }
                    },
                    SearchStep::Cancelled => Outcome::Cancel,
                },
            }
        };

        match outcome {
            Outcome::Idle => Ok(()),
            Outcome::Present { text, choices } => {
                self.presenter.present(user_id, &text, &choices).await
            }
            Outcome::Finish { draft } => self.finish_create(user_id, &lang, draft).await,
            Outcome::RunQuery { from, to, date } => {
                self.run_query(user_id, &lang, &from, &to, date).await
            }
            Outcome::Cancel => {
                self.dialogs.lock().await.remove(&user_id);
                let text = self.locales.resolve(&lang, "common.cancelled");
                self.presenter.present(user_id, text, &[]).await
            }
        }
    }

    /// List the driver's own trips, each with a delete button.
    ///
    /// # Errors
    ///
    /// Returns an error if a reply cannot be delivered.
    pub async fn my_trips(&self, user_id: i64) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;
        let trips = match self.store.list_driver_trips(user_id).await {
            Ok(trips) => trips,
            Err(e) => {
                warn!(user_id, error = %e, "list_driver_trips failed");
                let text = self.locales.resolve(&lang, "common.error");
                return self.presenter.present(user_id, text, &[]).await;
            }
        };
        if trips.is_empty() {
            let text = self.locales.resolve(&lang, "mytrips.empty");
            return self.presenter.present(user_id, text, &[]).await;
        }
        for trip in trips {
            let text = format!(
                "{} ➡️ {} {}",
                trip.from_city, trip.to_city, trip.departure_date
            );
            let choices = vec![Choice::new(
                self.locales.resolve(&lang, "mytrips.delete"),
                format!("del:{}", trip.id),
            )];
            self.presenter.present(user_id, &text, &choices).await?;
        }
        Ok(())
    }

    /// Present the top-level menu.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu cannot be delivered.
    pub async fn main_menu(&self, user_id: i64) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;
        let text = self.locales.resolve(&lang, "menu.prompt");
        let choices = vec![
            Choice::new(self.locales.resolve(&lang, "menu.create"), "menu:create"),
            Choice::new(self.locales.resolve(&lang, "menu.search"), "menu:search"),
            Choice::new(self.locales.resolve(&lang, "menu.mytrips"), "menu:mytrips"),
        ];
        self.presenter.present(user_id, text, &choices).await
    }

    /// Prompt for a language selection.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be delivered.
    pub async fn language_prompt(&self, user_id: i64) -> Result<(), PresentError> {
        let lang = self.lang_for(user_id).await;
        let text = self.locales.resolve(&lang, "language.prompt");
        let choices = vec![
            Choice::new("🇷🇺", "lang:ru"),
            Choice::new("🇰🇬", "lang:ky"),
        ];
        self.presenter.present(user_id, text, &choices).await
    }

    /// Persist a language preference and confirm in the new language.
    ///
    /// Tags outside the closed set of built-in languages are never
    /// stored; the selection prompt is re-issued instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the confirmation cannot be delivered.
    pub async fn set_language(&self, user_id: i64, language: &str) -> Result<(), PresentError> {
        if !self.locales.supported(language) {
            warn!(user_id, language, "unknown language tag rejected");
            return self.language_prompt(user_id).await;
        }
        if let Err(e) = self.store.set_language(user_id, language).await {
            warn!(user_id, error = %e, "set_language failed");
            let lang = self.lang_for(user_id).await;
            let text = self.locales.resolve(&lang, "common.error");
            return self.presenter.present(user_id, text, &[]).await;
        }
        let text = self.locales.resolve(language, "language.saved");
        self.presenter.present(user_id, text, &[]).await
    }

    async fn finish_create(
        &self,
        user_id: i64,
        lang: &str,
        draft: CreateDraft,
    ) -> Result<(), PresentError> {
        let Some(trip) = draft.into_trip(user_id) else {
            error!(user_id, "create draft missing required field at confirm");
            self.dialogs.lock().await.remove(&user_id);
            let text = self.locales.resolve(lang, "common.error");
            return self.presenter.present(user_id, text, &[]).await;
        };
        let trip_id = trip.id;
        match self.store.create_trip(trip).await {
            Ok(()) => {
                self.dialogs.lock().await.remove(&user_id);
                debug!(user_id, %trip_id, "trip persisted");
                let text = self.locales.resolve(lang, "driver.created");
                self.presenter.present(user_id, text, &[]).await
            }
            Err(e) => {
                // Draft stays at the confirm step so the driver can retry.
                warn!(user_id, error = %e, "create_trip failed");
                let text = self.locales.resolve(lang, "common.error");
                self.presenter.present(user_id, text, &[]).await
            }
        }
    }

    async fn run_query(
        &self,
        user_id: i64,
        lang: &str,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<(), PresentError> {
        let trips = match self.store.search_trips(from, to, date).await {
            Ok(trips) => trips,
            Err(e) => {
                // Draft stays at the time selector so the passenger can retry.
                warn!(user_id, error = %e, "search_trips failed");
                let text = self.locales.resolve(lang, "common.error");
                return self.presenter.present(user_id, text, &[]).await;
            }
        };
        self.dialogs.lock().await.remove(&user_id);
        if trips.is_empty() {
            let text = self.locales.resolve(lang, "passenger.no_results");
            return self.presenter.present(user_id, text, &[]).await;
        }
        for trip in trips {
            let text = self.format_card(lang, &trip);
            let choices = vec![Choice::new(
                self.locales.resolve(lang, "card.phone_button"),
                format!("phone:{}", trip.id),
            )];
            self.presenter.present(user_id, &text, &choices).await?;
        }
        Ok(())
    }

    async fn lang_for(&self, user_id: i64) -> String {
        match self
            .store
            .get_language(user_id, self.locales.default_lang())
            .await
        {
            Ok(lang) => lang,
            Err(e) => {
                warn!(user_id, error = %e, "language lookup failed, using default");
                self.locales.default_lang().to_owned()
            }
        }
    }

    fn create_prompt(&self, lang: &str, draft: &CreateDraft) -> (String, Vec<Choice>) {
        let t = |key| self.locales.resolve(lang, key).to_owned();
        match draft.state {
            CreateState::FromCity => (t("driver.from_city"), self.city_choices("city:")),
            CreateState::ToCity => (t("driver.to_city"), self.city_choices("city:")),
            CreateState::Date => (t("driver.date"), self.date_choices(lang)),
            CreateState::Time => (t("driver.time"), vec![self.skip_choice(lang)]),
            CreateState::Seats => (t("driver.seats"), seats_choices()),
            CreateState::Price => (
                t("driver.price"),
                vec![Choice::new(
                    self.locales.resolve(lang, "common.negotiable"),
                    "negotiable",
                )],
            ),
            CreateState::Car => (t("driver.car"), vec![self.skip_choice(lang)]),
            CreateState::Photos => (t("driver.photos"), vec![self.skip_choice(lang)]),
            CreateState::Phone => (t("driver.phone"), Vec::new()),
            CreateState::Comment => (t("driver.comment"), vec![self.skip_choice(lang)]),
            CreateState::Confirm => (
                self.render_preview(lang, draft),
                vec![
                    Choice::new(self.locales.resolve(lang, "common.confirm"), "confirm"),
                    Choice::new(self.locales.resolve(lang, "common.cancel"), "cancel"),
                ],
            ),
        }
    }

    fn search_prompt(&self, lang: &str, draft: &SearchDraft) -> (String, Vec<Choice>) {
        let t = |key| self.locales.resolve(lang, key).to_owned();
        match draft.state {
            SearchState::FromCity => (t("passenger.from_city"), self.city_choices("scity:")),
            SearchState::ToCity => (t("passenger.to_city"), self.city_choices("scity:")),
            SearchState::Date => (t("passenger.date"), self.date_choices(lang)),
            SearchState::TimePref => (t("passenger.time"), time_pref_choices()),
        }
    }

    fn city_choices(&self, prefix: &str) -> Vec<Choice> {
        self.cities
            .iter()
            .map(|city| Choice::new(city, format!("{prefix}{city}")))
            .collect()
    }

    fn date_choices(&self, lang: &str) -> Vec<Choice> {
        vec![
            Choice::new(self.locales.resolve(lang, "common.today"), "d:0"),
            Choice::new(self.locales.resolve(lang, "common.tomorrow"), "d:1"),
            Choice::new(self.locales.resolve(lang, "common.manual_date"), "d:manual"),
        ]
    }

    fn skip_choice(&self, lang: &str) -> Choice {
        Choice::new(self.locales.resolve(lang, "common.skip"), "skip")
    }

    fn format_card(&self, lang: &str, trip: &Trip) -> String {
        let mut text = format!(
            "{} ➡️ {}\n{}",
            trip.from_city, trip.to_city, trip.departure_date
        );
        if let Some(time) = trip.time {
            text.push(' ');
            text.push_str(&time.format("%H:%M").to_string());
        }
        text.push_str(&format!(
            "\n{} {}",
            trip.seats,
            self.locales.resolve(lang, "card.seats")
        ));
        if let Some(ref price) = trip.price {
            text.push_str(&format!(" — {price}"));
        }
        text
    }

    fn render_preview(&self, lang: &str, draft: &CreateDraft) -> String {
        let mut lines = vec![self.locales.resolve(lang, "driver.confirm").to_owned()];
        lines.push(format!(
            "{} ➡️ {}",
            draft.from_city.as_deref().unwrap_or(""),
            draft.to_city.as_deref().unwrap_or("")
        ));
        let mut when = draft
            .departure_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        if let Some(time) = draft.time {
            when.push(' ');
            when.push_str(&time.format("%H:%M").to_string());
        }
        lines.push(when);
        let seats = draft.seats.unwrap_or(0);
        let price = draft
            .price
            .clone()
            .unwrap_or_else(|| self.locales.resolve(lang, "common.negotiable").to_owned());
        lines.push(format!(
            "{seats} {} — {price}",
            self.locales.resolve(lang, "card.seats")
        ));
        if let Some(ref car) = draft.car {
            lines.push(car.clone());
        }
        if let Some(ref comment) = draft.comment {
            lines.push(comment.clone());
        }
        if let Some(ref phone) = draft.phone {
            lines.push(phone.clone());
        }
        lines.join("\n")
    }
}

fn seats_choices() -> Vec<Choice> {
    vec![
        Choice::new("1", "seats:1"),
        Choice::new("2", "seats:2"),
        Choice::new("3", "seats:3"),
        Choice::new("4", "seats:4"),
        Choice::new("5+", "seats:5"),
    ]
}

fn time_pref_choices() -> Vec<Choice> {
    vec![
        Choice::new("🌅", "tp:morning"),
        Choice::new("🌇", "tp:afternoon"),
        Choice::new("🌆", "tp:evening"),
        Choice::new("🌃", "tp:night"),
    ]
}
