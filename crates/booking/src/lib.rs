//! Seat reservation workflow for SeatBook
//!
//! This crate provides:
//! - Entities: `Flight`, `Seat`, `Passenger`, `Booking`
//! - `BookingService`: flight and seat listings, bookings per user, and
//!   `create_booking`, which never sells the same seat twice
//! - `BookingError`: domain failures plus pass-through storage errors
//!
//! Every booking is one engine transaction: seat availability is checked and
//! flipped in the same transaction that writes the booking, so concurrent
//! requests for one seat are serialized by commit-time validation.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod models;
pub mod service;

pub use error::{BookingError, BookingResult};
pub use models::{Booking, BookingStatus, Flight, FlightStatus, Passenger, Seat};
pub use service::{BookingService, FlightFilter};
