//! Durable SQLite trip store.
//!
//! Every [`TripStore`] operation runs as one atomic unit: single
//! statements rely on SQLite's per-statement atomicity, multi-statement
//! operations (delete, read-modify-write update) use an explicit
//! transaction. Isolation between concurrent callers comes from the
//! database, not from in-process locks.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{info, trace};
use uuid::Uuid;

use super::{StoreError, Trip, TripPatch, TripStore};

/// Bootstrap schema, applied idempotently on connect.
const SCHEMA: &str = include_str!("../../migrations/001_schema.sql");

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// SQLite-backed trip store.
#[derive(Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Raw `trips` row as fetched; decoded by [`row_to_trip`].
type TripRow = (
    String,         // id
    i64,            // driver_id
    String,         // from_city
    String,         // to_city
    String,         // departure_date
    Option<String>, // time
    i64,            // seats
    Option<String>, // price
    String,         // phone
    Option<String>, // car
    String,         // photos (JSON array)
    Option<String>, // comment
    String,         // created_at (RFC 3339)
);

const TRIP_COLUMNS: &str = "id, driver_id, from_city, to_city, departure_date, \
     time, seats, price, phone, car, photos, comment, created_at";

impl SqliteStore {
    /// Open (creating if missing) the database at `path` and apply the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema fails
    /// to apply.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!(path = %path.display(), "sqlite trip store opened");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (used by tests with `:memory:` databases).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema fails to apply.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_trip(row: TripRow) -> Result<Trip, StoreError> {
    let (id, driver_id, from_city, to_city, date, time, seats, price, phone, car, photos, comment, created_at) =
        row;
    let id = Uuid::parse_str(&id).map_err(|e| StoreError::Corrupt(format!("trip id: {e}")))?;
    let departure_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| StoreError::Corrupt(format!("departure_date: {e}")))?;
    let time = time
        .map(|t| NaiveTime::parse_from_str(&t, TIME_FORMAT))
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("time: {e}")))?;
    let seats =
        u8::try_from(seats).map_err(|e| StoreError::Corrupt(format!("seats: {e}")))?;
    let photos: Vec<String> = serde_json::from_str(&photos)
        .map_err(|e| StoreError::Corrupt(format!("photos: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StoreError::Corrupt(format!("created_at: {e}")))?
        .with_timezone(&Utc);
    Ok(Trip {
        id,
        driver_id,
        from_city,
        to_city,
        departure_date,
        time,
        seats,
        price,
        phone,
        car,
        photos,
        comment,
        created_at,
    })
}

fn encode_photos(photos: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(photos).map_err(|e| StoreError::Corrupt(format!("photos: {e}")))
}

#[async_trait]
impl TripStore for SqliteStore {
    async fn create_trip(&self, trip: Trip) -> Result<(), StoreError> {
        let photos = encode_photos(&trip.photos)?;
        let result = sqlx::query(
            "INSERT INTO trips (id, driver_id, from_city, to_city, departure_date, \
             time, seats, price, phone, car, photos, comment, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(trip.id.to_string())
        .bind(trip.driver_id)
        .bind(&trip.from_city)
        .bind(&trip.to_city)
        .bind(trip.departure_date.format(DATE_FORMAT).to_string())
        .bind(trip.time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(i64::from(trip.seats))
        .bind(&trip.price)
        .bind(&trip.phone)
        .bind(&trip.car)
        .bind(photos)
        .bind(&trip.comment)
        .bind(trip.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                trace!(trip_id = %trip.id, "trip created");
                Ok(())
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateTrip(trip.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn search_trips(
        &self,
        from_city: &str,
        to_city: &str,
        departure_date: NaiveDate,
    ) -> Result<Vec<Trip>, StoreError> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips \
             WHERE from_city = ?1 AND to_city = ?2 AND departure_date = ?3",
        ))
        .bind(from_city)
        .bind(to_city)
        .bind(departure_date.format(DATE_FORMAT).to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_trip).collect()
    }

    async fn get_trip(&self, trip_id: Uuid) -> Result<Option<Trip>, StoreError> {
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"))
                .bind(trip_id.to_string())
                .fetch_optional(&self.pool)
                .await?;
        row.map(row_to_trip).transpose()
    }

    async fn delete_trip(&self, trip_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM contacts WHERE trip_id = ?1")
            .bind(trip_id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM trips WHERE id = ?1")
            .bind(trip_id.to_string())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        trace!(%trip_id, "trip deleted");
        Ok(())
    }

    async fn update_trip(&self, trip_id: Uuid, patch: TripPatch) -> Result<(), StoreError> {
        // Read-modify-write inside one transaction. Last write wins,
        // which is the documented policy for concurrent edits.
        let mut tx = self.pool.begin().await?;
        let row: Option<TripRow> =
            sqlx::query_as(&format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1"))
                .bind(trip_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(row) = row else {
            tx.commit().await?;
            return Ok(());
        };
        let mut trip = row_to_trip(row)?;
        patch.apply_to(&mut trip);
        let photos = encode_photos(&trip.photos)?;
        sqlx::query(
            "UPDATE trips SET from_city = ?2, to_city = ?3, departure_date = ?4, \
             time = ?5, seats = ?6, price = ?7, phone = ?8, car = ?9, \
             photos = ?10, comment = ?11 WHERE id = ?1",
        )
        .bind(trip_id.to_string())
        .bind(&trip.from_city)
        .bind(&trip.to_city)
        .bind(trip.departure_date.format(DATE_FORMAT).to_string())
        .bind(trip.time.map(|t| t.format(TIME_FORMAT).to_string()))
        .bind(i64::from(trip.seats))
        .bind(&trip.price)
        .bind(&trip.phone)
        .bind(&trip.car)
        .bind(photos)
        .bind(&trip.comment)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_driver_trips(&self, driver_id: i64) -> Result<Vec<Trip>, StoreError> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS} FROM trips WHERE driver_id = ?1"
        ))
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_trip).collect()
    }

    async fn record_contact(&self, trip_id: Uuid, passenger_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO contacts (trip_id, passenger_id) VALUES (?1, ?2)")
            .bind(trip_id.to_string())
            .bind(passenger_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_language(&self, user_id: i64, language: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, language) VALUES (?1, ?2) \
             ON CONFLICT (id) DO UPDATE SET language = excluded.language",
        )
        .bind(user_id)
        .bind(language)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_language(&self, user_id: i64, default: &str) -> Result<String, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT language FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map_or_else(|| default.to_owned(), |(lang,)| lang))
    }
}
