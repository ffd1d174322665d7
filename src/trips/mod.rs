//! Trip records and the storage contract shared by both backends.
//!
//! A [`Trip`] is immutable once persisted except for whole-record deletion.
//! [`TripStore`] is the only shared mutable surface in the system: the
//! dialog engine persists finished drafts through it, searches read from
//! it, and the disclosure handler appends to the contact log. Both
//! backends ([`MemoryStore`](memory::MemoryStore), transient) and
//! ([`SqliteStore`](sqlite::SqliteStore), durable) satisfy the identical
//! contract; callers cannot tell them apart short of restarting.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum photos collected for one trip.
pub const MAX_PHOTOS: usize = 3;

/// A driver-created ride offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier, generated at creation.
    pub id: Uuid,
    /// Creating participant.
    pub driver_id: i64,
    /// Departure city.
    pub from_city: String,
    /// Destination city.
    pub to_city: String,
    /// Calendar date of departure.
    pub departure_date: NaiveDate,
    /// Time of day; `None` means unspecified/flexible.
    pub time: Option<NaiveTime>,
    /// Free seats, 1–5 (5 stands for "5 or more").
    pub seats: u8,
    /// Free-text price; `None` means negotiable.
    pub price: Option<String>,
    /// Contact phone, validated at collection time.
    pub phone: String,
    /// Car description.
    pub car: Option<String>,
    /// Ordered media references, at most [`MAX_PHOTOS`].
    pub photos: Vec<String>,
    /// Free-text comment.
    pub comment: Option<String>,
    /// Set when the record is persisted.
    pub created_at: DateTime<Utc>,
}

/// One disclosure log entry: a passenger was shown a driver's contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    /// The disclosed trip. Soft reference — the trip may be gone.
    pub trip_id: Uuid,
    /// Who saw the contact.
    pub passenger_id: i64,
    /// When the disclosure happened.
    pub at: DateTime<Utc>,
}

/// Partial field patch for [`TripStore::update_trip`].
///
/// Outer `None` leaves the field untouched; for nullable columns the
/// inner `Option` is the stored value, so `Some(None)` clears it.
/// Not exercised by any dialog flow — kept for forward compatibility.
#[derive(Debug, Default, Clone)]
pub struct TripPatch {
    /// New departure city.
    pub from_city: Option<String>,
    /// New destination city.
    pub to_city: Option<String>,
    /// New departure date.
    pub departure_date: Option<NaiveDate>,
    /// New time of day.
    pub time: Option<Option<NaiveTime>>,
    /// New seat count.
    pub seats: Option<u8>,
    /// New price text.
    pub price: Option<Option<String>>,
    /// New contact phone.
    pub phone: Option<String>,
    /// New car description.
    pub car: Option<Option<String>>,
    /// New photo list.
    pub photos: Option<Vec<String>>,
    /// New comment.
    pub comment: Option<Option<String>>,
}

impl TripPatch {
    /// Apply this patch to a trip in place.
    pub fn apply_to(&self, trip: &mut Trip) {
        if let Some(ref v) = self.from_city {
            trip.from_city = v.clone();
        }
        if let Some(ref v) = self.to_city {
            trip.to_city = v.clone();
        }
        if let Some(v) = self.departure_date {
            trip.departure_date = v;
        }
        if let Some(v) = self.time {
            trip.time = v;
        }
        if let Some(v) = self.seats {
            trip.seats = v;
        }
        if let Some(ref v) = self.price {
            trip.price = v.clone();
        }
        if let Some(ref v) = self.phone {
            trip.phone = v.clone();
        }
        if let Some(ref v) = self.car {
            trip.car = v.clone();
        }
        if let Some(ref v) = self.photos {
            trip.photos = v.clone();
        }
        if let Some(ref v) = self.comment {
            trip.comment = v.clone();
        }
    }
}

/// Errors from trip store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed (durable backend only).
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A trip with this id already exists.
    #[error("duplicate trip id: {0}")]
    DuplicateTrip(Uuid),

    /// A stored row could not be decoded back into a [`Trip`].
    #[error("corrupt stored row: {0}")]
    Corrupt(String),
}

/// Keyed storage for trips, language preferences, and the disclosure log.
///
/// All operations are safe under concurrent callers. Per-entity
/// consistency only: no ordering guarantee across distinct trips.
#[async_trait]
pub trait TripStore: Send + Sync {
    /// Insert a new trip.
    ///
    /// # Errors
    ///
    /// Fails with [`StoreError::DuplicateTrip`] if the id already exists.
    async fn create_trip(&self, trip: Trip) -> Result<(), StoreError>;

    /// All trips matching the route and date exactly. Order unspecified.
    async fn search_trips(
        &self,
        from_city: &str,
        to_city: &str,
        departure_date: NaiveDate,
    ) -> Result<Vec<Trip>, StoreError>;

    /// Fetch a trip by id; `Ok(None)` if absent.
    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError>;

    /// Remove a trip and its disclosure log entries. No-op for unknown ids.
    async fn delete_trip(&self, trip_id: Uuid) -> Result<(), StoreError>;

    /// Apply a partial patch to a trip. No-op for unknown ids.
    async fn update_trip(&self, trip_id: Uuid, patch: TripPatch) -> Result<(), StoreError>;

    /// All trips owned by a driver. Order unspecified.
    async fn list_driver_trips(&self, driver_id: i64) -> Result<Vec<Trip>, StoreError>;

    /// Append a disclosure log entry. Never fails on unknown `trip_id`.
    async fn record_contact(&self, trip_id: Uuid, passenger_id: i64) -> Result<(), StoreError>;

    /// Store a participant's language preference.
    async fn set_language(&self, user_id: i64, language: &str) -> Result<(), StoreError>;

    /// A participant's language preference, or `default` when unset.
    async fn get_language(&self, user_id: i64, default: &str) -> Result<String, StoreError>;
}
