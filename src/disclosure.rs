//! Contact disclosure and the driver's follow-up response.
//!
//! A passenger pressing a result card's phone button reveals the
//! driver's contact, appends a disclosure log entry, and schedules a
//! delayed follow-up to the driver. The driver's later choice either
//! deletes the trip ("full", "remove") or leaves it searchable
//! ("not yet").

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::followup::FollowupScheduler;
use crate::i18n::Locales;
use crate::presenter::{Choice, PresentError, Presenter};
use crate::trips::{StoreError, TripStore};

/// The driver's answer to a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowupAction {
    /// No seats left; the listing is deleted.
    Full,
    /// Still open; nothing changes.
    NotYet,
    /// Remove the listing.
    Remove,
}

impl FollowupAction {
    /// Parse an action token (`full:<id>`, `wait:<id>`, `del:<id>`).
    pub fn parse(token: &str) -> Option<(Self, Uuid)> {
        let (action, id) = token.split_once(':')?;
        let trip_id = Uuid::parse_str(id).ok()?;
        let action = match action {
            "full" => Self::Full,
            "wait" => Self::NotYet,
            "del" => Self::Remove,
            _ => return None,
        };
        Some((action, trip_id))
    }
}

/// Bridges a passenger's reveal action to the store and the scheduler.
pub struct DisclosureHandler {
    store: Arc<dyn TripStore>,
    scheduler: FollowupScheduler,
    locales: Arc<Locales>,
    presenter: Arc<dyn Presenter>,
    followup_delay: Duration,
}

impl DisclosureHandler {
    /// Wire a handler over the shared store, scheduler, and presenter.
    pub fn new(
        store: Arc<dyn TripStore>,
        scheduler: FollowupScheduler,
        locales: Arc<Locales>,
        presenter: Arc<dyn Presenter>,
        followup_delay: Duration,
    ) -> Self {
        Self {
            store,
            scheduler,
            locales,
            presenter,
            followup_delay,
        }
    }

    /// Reveal a trip's contact to `viewer_id`.
    ///
    /// Sends the phone to the viewer, appends a disclosure entry, and
    /// schedules the follow-up to the driver (localized with the
    /// *driver's* language). An unknown or stale trip id yields a
    /// failure notice to the viewer; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the reply to the viewer cannot be delivered.
    pub async fn reveal(&self, viewer_id: i64, trip_id: Uuid) -> Result<(), PresentError> {
        let viewer_lang = self.lang_for(viewer_id).await;
        let trip = match self.store.get_trip(trip_id).await {
            Ok(Some(trip)) => trip,
            Ok(None) => {
                let text = self.locales.resolve(&viewer_lang, "common.not_found");
                return self.presenter.present(viewer_id, text, &[]).await;
            }
            Err(e) => {
                warn!(viewer_id, %trip_id, error = %e, "get_trip failed during reveal");
                let text = self.locales.resolve(&viewer_lang, "common.error");
                return self.presenter.present(viewer_id, text, &[]).await;
            }
        };

        self.presenter.present(viewer_id, &trip.phone, &[]).await?;

        // The log is audit-only; a failed append must not undo the
        // disclosure the viewer already saw.
        if let Err(e) = self.store.record_contact(trip_id, viewer_id).await {
            warn!(viewer_id, %trip_id, error = %e, "record_contact failed");
        }

        let driver_lang = self.lang_for(trip.driver_id).await;
        let choices = vec![
            Choice::new(
                self.locales.resolve(&driver_lang, "followup.full"),
                format!("full:{trip_id}"),
            ),
            Choice::new(
                self.locales.resolve(&driver_lang, "followup.not_yet"),
                format!("wait:{trip_id}"),
            ),
            Choice::new(
                self.locales.resolve(&driver_lang, "followup.delete"),
                format!("del:{trip_id}"),
            ),
        ];
        self.scheduler.schedule(
            trip.driver_id,
            self.locales.resolve(&driver_lang, "followup.message"),
            self.followup_delay,
            choices,
        );
        debug!(viewer_id, %trip_id, driver_id = trip.driver_id, "contact disclosed");
        Ok(())
    }

    /// Apply the driver's follow-up (or listing) action.
    ///
    /// "full" and "remove" delete the trip; "not yet" leaves it active.
    /// Deleting an already-gone trip is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the deletion.
    pub async fn act(&self, action: FollowupAction, trip_id: Uuid) -> Result<(), StoreError> {
        match action {
            FollowupAction::Full | FollowupAction::Remove => {
                self.store.delete_trip(trip_id).await?;
                debug!(%trip_id, ?action, "trip removed by driver action");
            }
            FollowupAction::NotYet => {
                debug!(%trip_id, "trip kept active by driver");
            }
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
}
