//! Transient in-memory trip store.
//!
//! One mutex per logical table (trips, contacts, languages) so unrelated
//! operations do not contend. Data is lost on restart, which is the
//! documented difference from the SQLite backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{ContactRecord, StoreError, Trip, TripPatch, TripStore};

/// Process-local trip store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    trips: Mutex<HashMap<Uuid, Trip>>,
    contacts: Mutex<Vec<ContactRecord>>,
    languages: Mutex<HashMap<i64, String>>,
}

/// Locks ignoring poisoning: a panic while holding one of these locks
/// cannot leave a half-written entry, every critical section is a single
/// map/vec operation.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disclosure log entries for a trip, oldest first. Test/audit helper;
    /// no dialog flow reads the log back.
    pub fn contacts_for(&self, trip_id: Uuid) -> Vec<ContactRecord> {
        lock(&self.contacts)
            .iter()
            .filter(|c| c.trip_id == trip_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn create_trip(&self, trip: Trip) -> Result<(), StoreError> {
        let mut trips = lock(&self.trips);
        if trips.contains_key(&trip.id) {
            return Err(StoreError::DuplicateTrip(trip.id));
        }
        trips.insert(trip.id, trip);
        Ok(())
    }

    async fn search_trips(
        &self,
        from_city: &str,
        to_city: &str,
        departure_date: NaiveDate,
    ) -> Result<Vec<Trip>, StoreError> {
        Ok(lock(&self.trips)
            .values()
            .filter(|t| {
                t.from_city == from_city
                    && t.to_city == to_city
                    && t.departure_date == departure_date
            })
            .cloned()
            .collect())
    }

    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        Ok(lock(&self.trips).get(&trip_id).cloned())
    }

    async fn delete_trip(&self, trip_id: Uuid) -> Result<(), StoreError> {
        lock(&self.trips).remove(&trip_id);
        lock(&self.contacts).retain(|c| c.trip_id != trip_id);
        Ok(())
    }

    async fn update_trip(&self, trip_id: Uuid, patch: TripPatch) -> Result<(), StoreError> {
        if let Some(trip) = lock(&self.trips).get_mut(&trip_id) {
            patch.apply_to(trip);
        }
        Ok(())
    }

    async fn list_driver_trips(&self, driver_id: i64) -> Result<Vec<Trip>, StoreError> {
        Ok(lock(&self.trips)
            .values()
            .filter(|t| t.driver_id == driver_id)
            .cloned()
            .collect())
    }

    async fn record_contact(&self, trip_id: Uuid, passenger_id: i64) -> Result<(), StoreError> {
        lock(&self.contacts).push(ContactRecord {
            trip_id,
            passenger_id,
            at: Utc::now(),
        });
        Ok(())
    }

    async fn set_language(&self, user_id: i64, language: &str) -> Result<(), StoreError> {
        lock(&self.languages).insert(user_id, language.to_owned());
        Ok(())
    }

    async fn get_language(&self, user_id: i64, default: &str) -> Result<String, StoreError> {
        Ok(lock(&self.languages)
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| default.to_owned()))
    }
}
