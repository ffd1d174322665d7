//! Tests for `src/trips/sqlite.rs` — the durable backend over `:memory:`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use uuid::Uuid;

use poputka::trips::{SqliteStore, StoreError, Trip, TripPatch, TripStore};

async fn setup_store() -> SqliteStore {
    let opts = SqliteConnectOptions::new()
        .filename(":memory:")
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(opts)
        .await
        .expect("pool should connect");
    SqliteStore::from_pool(pool)
        .await
        .expect("schema should apply")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn full_trip(driver_id: i64) -> Trip {
    Trip {
        id: Uuid::new_v4(),
        driver_id,
        from_city: "Бишкек".to_owned(),
        to_city: "Ош".to_owned(),
        departure_date: date(2026, 9, 1),
        time: NaiveTime::from_hms_opt(14, 30, 0),
        seats: 3,
        price: Some("1500".to_owned()),
        phone: "+996700123456".to_owned(),
        car: Some("Honda Stepwgn".to_owned()),
        photos: vec!["file_a".to_owned(), "file_b".to_owned()],
        comment: Some("Выезд с рынка".to_owned()),
        created_at: Utc
            .with_ymd_and_hms(2026, 8, 20, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    }
}

#[tokio::test]
async fn every_field_survives_a_roundtrip() {
    let store = setup_store().await;
    let trip = full_trip(1);
    let id = trip.id;

    store.create_trip(trip.clone()).await.expect("create");
    let fetched = store.get_trip(id).await.expect("get");
    assert_eq!(fetched, Some(trip));
}

#[tokio::test]
async fn optional_fields_roundtrip_as_null() {
    let store = setup_store().await;
    let trip = Trip {
        time: None,
        price: None,
        car: None,
        photos: Vec::new(),
        comment: None,
        ..full_trip(1)
    };
    let id = trip.id;

    store.create_trip(trip.clone()).await.expect("create");
    let fetched = store.get_trip(id).await.expect("get");
    assert_eq!(fetched, Some(trip));
}

#[tokio::test]
async fn connect_creates_the_file_and_data_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("trips.db");
    let trip = full_trip(1);
    let id = trip.id;

    {
        let store = SqliteStore::connect(&path).await.expect("connect");
        store.create_trip(trip.clone()).await.expect("create");
        store.pool().close().await;
    }

    let store = SqliteStore::connect(&path).await.expect("reconnect");
    assert_eq!(store.get_trip(id).await.expect("get"), Some(trip));
}

#[tokio::test]
async fn duplicate_id_maps_to_duplicate_trip() {
    let store = setup_store().await;
    let trip = full_trip(1);
    let id = trip.id;

    store.create_trip(trip.clone()).await.expect("first create");
    let err = store.create_trip(trip).await.expect_err("second create");
    assert!(matches!(err, StoreError::DuplicateTrip(dup) if dup == id));
}

#[tokio::test]
async fn search_matches_route_and_date_exactly() {
    let store = setup_store().await;
    let hit = full_trip(1);
    store.create_trip(hit.clone()).await.expect("create hit");
    store
        .create_trip(Trip {
            departure_date: date(2026, 9, 2),
            ..full_trip(2)
        })
        .await
        .expect("create other date");
    store
        .create_trip(Trip {
            from_city: "Ош".to_owned(),
            to_city: "Бишкек".to_owned(),
            ..full_trip(3)
        })
        .await
        .expect("create reverse route");

    let results = store
        .search_trips("Бишкек", "Ош", date(2026, 9, 1))
        .await
        .expect("search");
    assert_eq!(results, vec![hit]);
}

#[tokio::test]
async fn delete_removes_trip_and_contact_rows() {
    let store = setup_store().await;
    let trip = full_trip(1);
    let id = trip.id;
    store.create_trip(trip).await.expect("create");
    store.record_contact(id, 42).await.expect("record");
    store.record_contact(id, 43).await.expect("record");

    store.delete_trip(id).await.expect("delete");

    assert_eq!(store.get_trip(id).await.expect("get"), None);
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts WHERE trip_id = ?1")
        .bind(id.to_string())
        .fetch_one(store.pool())
        .await
        .expect("count contacts");
    assert_eq!(count, 0);

    store.delete_trip(id).await.expect("second delete is a no-op");
}

#[tokio::test]
async fn record_contact_accepts_unknown_trip() {
    let store = setup_store().await;
    store
        .record_contact(Uuid::new_v4(), 42)
        .await
        .expect("soft reference, no foreign key");
}

#[tokio::test]
async fn update_persists_patched_fields() {
    let store = setup_store().await;
    let trip = full_trip(1);
    let id = trip.id;
    store.create_trip(trip).await.expect("create");

    let patch = TripPatch {
        seats: Some(1),
        time: Some(None),
        comment: Some(Some("Одно место осталось".to_owned())),
        ..TripPatch::default()
    };
    store.update_trip(id, patch.clone()).await.expect("update");

    let updated = store.get_trip(id).await.expect("get").expect("present");
    assert_eq!(updated.seats, 1);
    assert_eq!(updated.time, None);
    assert_eq!(updated.comment.as_deref(), Some("Одно место осталось"));
    assert_eq!(updated.phone, "+996700123456");

    store
        .update_trip(Uuid::new_v4(), patch)
        .await
        .expect("unknown id is a no-op");
}

#[tokio::test]
async fn list_driver_trips_filters_by_owner() {
    let store = setup_store().await;
    store.create_trip(full_trip(1)).await.expect("create");
    store.create_trip(full_trip(1)).await.expect("create");
    store.create_trip(full_trip(2)).await.expect("create");

    let mine = store.list_driver_trips(1).await.expect("list");
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|t| t.driver_id == 1));
}

#[tokio::test]
async fn interleaved_create_delete_search_never_corrupt_the_store() {
    let store = Arc::new(setup_store().await);
    let on = date(2026, 9, 1);

    let mut doomed = Vec::new();
    for i in 0..10 {
        let trip = full_trip(100 + i);
        doomed.push(trip.id);
        store.create_trip(trip).await.expect("seed");
    }

    let mut kept = Vec::new();
    let mut handles = Vec::new();
    for i in 0..10 {
        let trip = full_trip(i);
        kept.push(trip.id);
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.create_trip(trip).await }));
    }
    for id in doomed.clone() {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move { store.delete_trip(id).await }));
    }
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let trips = store.search_trips("Бишкек", "Ош", on).await?;
            // A racing search must only ever see rows that decode into
            // complete trips.
            for trip in trips {
                assert_eq!(trip.from_city, "Бишкек");
                assert_eq!(trip.to_city, "Ош");
                assert!(!trip.phone.is_empty());
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("operation");
    }

    for id in &kept {
        assert!(store.get_trip(*id).await.expect("get").is_some());
    }
    for id in &doomed {
        assert_eq!(store.get_trip(*id).await.expect("get"), None);
    }
    let survivors: HashSet<Uuid> = store
        .search_trips("Бишкек", "Ош", on)
        .await
        .expect("search")
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(survivors, kept.into_iter().collect());
}

#[tokio::test]
async fn language_upsert_keeps_last_write() {
    let store = setup_store().await;
    assert_eq!(store.get_language(7, "ru").await.expect("get"), "ru");
    store.set_language(7, "ky").await.expect("set");
    store.set_language(7, "ru").await.expect("overwrite");
    assert_eq!(store.get_language(7, "ky").await.expect("get"), "ru");
}
