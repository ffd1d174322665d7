//! Tests for the Create Trip flow driven through the engine.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use poputka::dialog::DialogEvent;
use poputka::trips::{MemoryStore, TripStore};

use crate::support::{engine_over, FailingStore};

const DRIVER: i64 = 1;

fn text(s: &str) -> DialogEvent {
    DialogEvent::Text(s.to_owned())
}

fn choice(s: &str) -> DialogEvent {
    DialogEvent::Choice(s.to_owned())
}

#[tokio::test]
async fn happy_path_persists_the_exact_draft() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(Arc::clone(&store) as _);

    engine.start_create(DRIVER).await.expect("start");
    for event in [
        choice("city:Бишкек"),
        choice("city:Ош"),
        text("2026-09-01"),
        text("14:30"),
        choice("seats:3"),
        text("1500"),
        text("Honda Stepwgn"),
        DialogEvent::Media("file_a".to_owned()),
        choice("skip"), // stop at one photo
        text("+996700123456"),
        choice("skip"), // no comment
        choice("confirm"),
    ] {
        engine.handle_event(DRIVER, event).await.expect("handle");
    }

    assert!(!engine.has_dialog(DRIVER).await);

    let on = NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date");
    let trips = store
        .search_trips("Бишкек", "Ош", on)
        .await
        .expect("search");
    assert_eq!(trips.len(), 1);
    let trip = &trips[0];
    assert_eq!(trip.driver_id, DRIVER);
    assert_eq!(trip.time, NaiveTime::from_hms_opt(14, 30, 0));
    assert_eq!(trip.seats, 3);
    assert_eq!(trip.price.as_deref(), Some("1500"));
    assert_eq!(trip.car.as_deref(), Some("Honda Stepwgn"));
    assert_eq!(trip.photos, vec!["file_a".to_owned()]);
    assert_eq!(trip.phone, "+996700123456");
    assert_eq!(trip.comment, None);

    let (to, confirmation, _) = presenter.last();
    assert_eq!(to, DRIVER);
    assert_eq!(confirmation, "Поездка создана ✅");
}

#[tokio::test]
async fn skippable_fields_land_as_none() {
    let store = Arc::new(MemoryStore::new());
    let (engine, _presenter) = engine_over(Arc::clone(&store) as _);

    engine.start_create(DRIVER).await.expect("start");
    for event in [
        text("Бишкек"), // free text also works for cities
        text("Ош"),
        choice("d:0"), // today
        choice("skip"),
        choice("seats:2"),
        choice("negotiable"),
        choice("skip"),
        choice("skip"),
        text("+996555000111"),
        choice("skip"),
        choice("confirm"),
    ] {
        engine.handle_event(DRIVER, event).await.expect("handle");
    }

    let trips = store.list_driver_trips(DRIVER).await.expect("list");
    assert_eq!(trips.len(), 1);
    let trip = &trips[0];
    assert_eq!(trip.time, None);
    assert_eq!(trip.price, None);
    assert_eq!(trip.car, None);
    assert!(trip.photos.is_empty());
    assert_eq!(trip.comment, None);
    assert_eq!(trip.departure_date, chrono::Local::now().date_naive());
}

#[tokio::test]
async fn invalid_date_and_time_reprompt_without_advancing() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(store as _);

    engine.start_create(DRIVER).await.expect("start");
    engine
        .handle_event(DRIVER, choice("city:Бишкек"))
        .await
        .expect("from");
    engine
        .handle_event(DRIVER, choice("city:Ош"))
        .await
        .expect("to");

    engine
        .handle_event(DRIVER, text("завтра"))
        .await
        .expect("bad date");
    assert_eq!(presenter.last().1, "Неверная дата. Формат: ГГГГ-ММ-ДД");

    engine
        .handle_event(DRIVER, text("2026-09-01"))
        .await
        .expect("good date");
    assert!(presenter.last().1.starts_with("Во сколько выезд?"));

    for bad in ["25:99", "9:30", "24:00", "noon"] {
        engine
            .handle_event(DRIVER, text(bad))
            .await
            .expect("bad time");
        assert_eq!(presenter.last().1, "Неверное время. Формат: ЧЧ:ММ");
    }

    engine
        .handle_event(DRIVER, text("09:30"))
        .await
        .expect("good time");
    assert_eq!(presenter.last().1, "Сколько свободных мест?");
}

#[tokio::test]
async fn phone_must_match_pattern_but_shared_contact_bypasses() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(store as _);

    engine.start_create(DRIVER).await.expect("start");
    for event in [
        choice("city:Бишкек"),
        choice("city:Ош"),
        choice("d:1"),
        choice("skip"),
        choice("seats:4"),
        choice("negotiable"),
        choice("skip"),
        choice("skip"),
    ] {
        engine.handle_event(DRIVER, event).await.expect("handle");
    }
    assert_eq!(presenter.last().1, "Номер телефона для связи");

    engine
        .handle_event(DRIVER, text("not-a-phone"))
        .await
        .expect("bad phone");
    assert_eq!(presenter.last().1, "Неверный формат телефона");

    // A number shared through the messenger is trusted as-is, even when
    // it would not match the free-text pattern.
    engine
        .handle_event(DRIVER, DialogEvent::Contact("0700 123 456".to_owned()))
        .await
        .expect("shared contact");
    assert!(presenter.last().1.starts_with("Комментарий?"));
}

#[tokio::test]
async fn third_photo_advances_to_phone() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(store as _);

    engine.start_create(DRIVER).await.expect("start");
    for event in [
        choice("city:Бишкек"),
        choice("city:Ош"),
        choice("d:0"),
        choice("skip"),
        choice("seats:3"),
        choice("negotiable"),
        choice("skip"),
    ] {
        engine.handle_event(DRIVER, event).await.expect("handle");
    }

    for file_id in ["a", "b"] {
        engine
            .handle_event(DRIVER, DialogEvent::Media(file_id.to_owned()))
            .await
            .expect("photo");
        assert!(presenter.last().1.starts_with("Пришлите до 3 фото"));
    }
    engine
        .handle_event(DRIVER, DialogEvent::Media("c".to_owned()))
        .await
        .expect("third photo");
    assert_eq!(presenter.last().1, "Номер телефона для связи");
}

#[tokio::test]
async fn cancel_discards_the_draft() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(Arc::clone(&store) as _);

    engine.start_create(DRIVER).await.expect("start");
    engine
        .handle_event(DRIVER, choice("city:Бишкек"))
        .await
        .expect("from");
    engine
        .handle_event(DRIVER, choice("cancel"))
        .await
        .expect("cancel");

    assert!(!engine.has_dialog(DRIVER).await);
    assert_eq!(presenter.last().1, "Отменено");
    assert!(store
        .list_driver_trips(DRIVER)
        .await
        .expect("list")
        .is_empty());
}

#[tokio::test]
async fn restart_replaces_the_previous_draft() {
    let store = Arc::new(MemoryStore::new());
    let (engine, presenter) = engine_over(store as _);

    engine.start_create(DRIVER).await.expect("start");
    engine
        .handle_event(DRIVER, choice("city:Бишкек"))
        .await
        .expect("from");

    engine.start_create(DRIVER).await.expect("restart");
    // Back at the first prompt.
    assert_eq!(presenter.last().1, "Откуда поедете?");
}

#[tokio::test]
async fn store_failure_keeps_the_draft_for_retry() {
    let (engine, presenter) = engine_over(Arc::new(FailingStore) as _);

    engine.start_create(DRIVER).await.expect("start");
    for event in [
        choice("city:Бишкек"),
        choice("city:Ош"),
        choice("d:0"),
        choice("skip"),
        choice("seats:3"),
        choice("negotiable"),
        choice("skip"),
        choice("skip"),
        text("+996700123456"),
        choice("skip"),
        choice("confirm"),
    ] {
        engine.handle_event(DRIVER, event).await.expect("handle");
    }

    assert!(engine.has_dialog(DRIVER).await);
    assert_eq!(
        presenter.last().1,
        "Что-то пошло не так, попробуйте ещё раз"
    );
}
