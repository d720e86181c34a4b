//! SeatBook - embedded seat inventory and reservation core
//!
//! SeatBook keeps flights, seats and bookings in an in-memory ordered
//! key-value engine with atomic multi-key transactions. Concurrent booking
//! requests for the same seat are serialized by commit-time validation, so a
//! seat is never sold twice.
//!
//! # Quick Start
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use seatbook::{BookingService, Engine, Flight, FlightStatus, Passenger, Seat};
//!
//! let service = BookingService::with_engine(Engine::open()?);
//! let flight = Flight {
//!     id: "123".to_string(),
//!     from: "AAA".to_string(),
//!     to: "BBB".to_string(),
//!     departure: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
//!     arrival: Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap(),
//!     status: FlightStatus::Scheduled,
//! };
//! let seat = Seat {
//!     flight_id: "123".to_string(),
//!     seat: "B1".to_string(),
//!     row: 1,
//!     price: 10,
//!     available: true,
//! };
//! service.register_flight(&flight, &[seat])?;
//!
//! let booking = service.create_booking("123", "user", vec![Passenger::new("John", "B1")])?;
//! assert_eq!(booking.price, 10);
//! # Ok::<(), seatbook::BookingError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! seatbook-booking      BookingService, entities
//! seatbook-collections  CollectionStore, Model, WriteBatch
//! seatbook-engine       Engine, EngineConfig, transactions
//! seatbook-concurrency  OCC validation, commit lock
//! seatbook-storage      UnifiedStore, snapshots
//! seatbook-core         Key, Error, Storage traits
//! ```
//!
//! Only the engine, collection and booking APIs are re-exported here.

pub use seatbook_booking::{
    Booking, BookingError, BookingResult, BookingService, BookingStatus, Flight, FlightFilter,
    FlightStatus, Passenger, Seat,
};
pub use seatbook_collections::{CollectionStore, CollectionTxn, Model, WriteBatch};
pub use seatbook_core::{Error, Result};
pub use seatbook_engine::{Engine, EngineConfig, TransactionMetrics};
