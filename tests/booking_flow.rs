//! End-to-end tests through the `seatbook` facade
//!
//! Drive a full booking flow over one engine and check what the lower
//! layers observe: raw payloads, export/import and engine metrics.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use seatbook::{
    BookingError, BookingService, CollectionStore, Engine, EngineConfig, Error, Flight,
    FlightFilter, FlightStatus, Passenger, Seat,
};

fn flight(id: &str) -> Flight {
    Flight {
        id: id.to_string(),
        from: "AAA".to_string(),
        to: "BBB".to_string(),
        departure: Utc.with_ymd_and_hms(2024, 9, 1, 7, 0, 0).unwrap(),
        arrival: Utc.with_ymd_and_hms(2024, 9, 1, 8, 15, 0).unwrap(),
        status: FlightStatus::Scheduled,
    }
}

fn seat(flight_id: &str, code: &str, price: u64, available: bool) -> Seat {
    Seat {
        flight_id: flight_id.to_string(),
        seat: code.to_string(),
        row: 1,
        price,
        available,
    }
}

fn seeded() -> BookingService {
    let config = EngineConfig::default()
        .with_name("flow")
        .with_commit_timeout(Duration::from_secs(2));
    let service = BookingService::with_engine(Engine::open_with_config(config).unwrap());
    service
        .register_flight(
            &flight("123"),
            &[
                seat("123", "A1", 10, false),
                seat("123", "B1", 10, true),
                seat("123", "C1", 10, true),
            ],
        )
        .unwrap();
    service
}

#[test]
fn test_full_flow() {
    let service = seeded();

    let flights = service.list_flights(&FlightFilter::default()).unwrap();
    assert_eq!(flights, vec![flight("123")]);

    let booking = service
        .create_booking(
            "123",
            "user",
            vec![Passenger::new("John", "B1"), Passenger::new("Jane", "C1")],
        )
        .unwrap();
    assert_eq!(booking.price, 20);

    let err = service
        .create_booking("123", "user", vec![Passenger::new("Late", "B1")])
        .unwrap_err();
    assert!(matches!(err, BookingError::SeatUnavailable { .. }));

    assert!(matches!(
        service.list_available_seats("123"),
        Err(BookingError::NoSeatsAvailable(_))
    ));
    assert_eq!(service.list_bookings_for_user("user").unwrap(), vec![booking]);

    let metrics = service.store().engine().metrics();
    assert!(metrics.total_committed >= 2);
    assert_eq!(metrics.active_count, 0);
}

#[test]
fn test_raw_payloads_are_json() {
    let service = seeded();
    let raw = service.store().get_raw("flights", "123").unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json["id"], "123");
    assert_eq!(json["status"], "scheduled");

    let raw_seat = service.store().get_raw("seats", "123/B1").unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw_seat).unwrap();
    assert_eq!(json["flightId"], "123");
    assert_eq!(json["available"], true);
}

#[test]
fn test_export_import_into_fresh_engine() {
    let service = seeded();
    service
        .create_booking("123", "user", vec![Passenger::new("John", "B1")])
        .unwrap();
    let exported = service.store().export().unwrap();

    let restored = BookingService::new(CollectionStore::new(Engine::open().unwrap()));
    let imported = restored.store().import(exported.clone()).unwrap();
    assert_eq!(imported, exported.len());

    assert_eq!(restored.get_flight("123").unwrap(), flight("123"));
    let available = restored.list_available_seats("123").unwrap();
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].seat, "C1");
    assert_eq!(restored.list_bookings_for_user("user").unwrap().len(), 1);
}

#[test]
fn test_closed_engine_rejects_work() {
    let service = seeded();
    service.store().engine().close();

    assert!(matches!(
        service.list_flights(&FlightFilter::default()),
        Err(BookingError::Storage(Error::EngineClosed))
    ));
}

#[test]
fn test_invalid_config_fails_open() {
    let config = EngineConfig::default().with_commit_timeout(Duration::ZERO);
    assert!(matches!(
        Engine::open_with_config(config),
        Err(Error::EngineInit(_))
    ));
}
