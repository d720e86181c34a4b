//! BookingService: flights, seats and bookings
//!
//! ## Booking Sequence
//!
//! ```text
//! 1. Validate the request (no storage access)
//! 2. Resolve the flight                       -> FlightNotFound
//! 3. In one transaction, for each passenger:
//!      read seat flight_id/seat               -> SeatNotFound
//!      check available                        -> SeatUnavailable
//!      accumulate price, mark unavailable
//! 4. Same transaction: write seats + booking as one batch
//!    commit conflict                          -> SeatUnavailable
//! ```
//!
//! There is no automatic retry. A caller may re-run the whole request.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use seatbook_collections::{key, CollectionStore, Model, WriteBatch};
use seatbook_core::{Error, Key};
use seatbook_engine::Engine;

use crate::error::{BookingError, BookingResult};
use crate::models::{Booking, BookingStatus, Flight, FlightStatus, Passenger, Seat};

/// Optional criteria for `list_flights`
///
/// Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlightFilter {
    /// Origin airport code
    pub from: Option<String>,
    /// Destination airport code
    pub to: Option<String>,
    /// Flight status
    pub status: Option<FlightStatus>,
}

impl FlightFilter {
    /// A filter matching every flight
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to an origin
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Restrict to a destination
    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    /// Restrict to a status
    pub fn with_status(mut self, status: FlightStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Whether `flight` satisfies the filter
    pub fn matches(&self, flight: &Flight) -> bool {
        self.from.as_deref().map_or(true, |f| f == flight.from)
            && self.to.as_deref().map_or(true, |t| t == flight.to)
            && self.status.map_or(true, |s| s == flight.status)
    }
}

/// Flight booking workflow over a `CollectionStore`
///
/// Cheap to clone; clones share the same store.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: CollectionStore,
}

impl BookingService {
    /// Create a service over an existing store
    pub fn new(store: CollectionStore) -> Self {
        Self { store }
    }

    /// Create a service over an engine
    pub fn with_engine(engine: Arc<Engine>) -> Self {
        Self::new(CollectionStore::new(engine))
    }

    /// The underlying collection store
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    // ========== Flights ==========

    /// Register a new flight and its seats in one transaction
    ///
    /// A flight is registered once. Its seats then only change through
    /// bookings, so a sold seat can never become available again.
    ///
    /// # Errors
    /// - `BookingError::Validation` if the flight id is unusable, a seat
    ///   belongs to another flight, or a seat code repeats
    /// - `BookingError::FlightExists` if the flight or any seat under its id
    ///   is already stored, including when a concurrent registration wins
    pub fn register_flight(&self, flight: &Flight, seats: &[Seat]) -> BookingResult<()> {
        validate_id("flight id", &flight.id)?;

        let mut codes = HashSet::new();
        let mut batch = WriteBatch::new();
        batch.add(flight)?;
        for seat in seats {
            if seat.flight_id != flight.id {
                return Err(BookingError::validation(format!(
                    "seat {} belongs to flight {}, not {}",
                    seat.seat, seat.flight_id, flight.id
                )));
            }
            validate_id("seat code", &seat.seat)?;
            if !codes.insert(seat.seat.as_str()) {
                return Err(BookingError::validation(format!(
                    "seat {} listed twice",
                    seat.seat
                )));
            }
            batch.add(seat)?;
        }

        let outcome = self.store.transaction(|txn| {
            let existing_flight = txn.find::<Flight>(&flight.id)?;
            let existing_seats = txn.scan::<Seat>(Some(flight.id.as_str()))?;
            if existing_flight.is_some() || !existing_seats.is_empty() {
                return Err(BookingError::FlightExists(flight.id.clone()));
            }
            txn.put_batch(&batch)?;
            Ok(())
        });

        match outcome {
            Ok(()) => {
                info!(
                    target: "seatbook::booking",
                    flight_id = %flight.id,
                    seats = seats.len(),
                    "Flight registered"
                );
                Ok(())
            }
            Err(BookingError::Storage(Error::EngineConflict { .. })) => {
                Err(BookingError::FlightExists(flight.id.clone()))
            }
            Err(e) => Err(e),
        }
    }

    /// Get a flight by id
    pub fn get_flight(&self, flight_id: &str) -> BookingResult<Flight> {
        match self.store.get::<Flight>(flight_id) {
            Ok(flight) => Ok(flight),
            Err(e) if e.is_not_found() => Err(BookingError::FlightNotFound(flight_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Flights matching `filter`, in key order
    pub fn list_flights(&self, filter: &FlightFilter) -> BookingResult<Vec<Flight>> {
        let mut flights = Vec::new();
        for flight in self.store.scan::<Flight>(None)? {
            let flight = flight?;
            if filter.matches(&flight) {
                flights.push(flight);
            }
        }
        Ok(flights)
    }

    // ========== Seats ==========

    /// Available seats of a flight, in seat-code order
    ///
    /// # Errors
    /// `BookingError::NoSeatsAvailable` if none are available, including when
    /// the flight has no seats at all.
    pub fn list_available_seats(&self, flight_id: &str) -> BookingResult<Vec<Seat>> {
        let mut seats = Vec::new();
        for seat in self.store.scan::<Seat>(Some(flight_id))? {
            let seat = seat?;
            if seat.available {
                seats.push(seat);
            }
        }

        if seats.is_empty() {
            return Err(BookingError::NoSeatsAvailable(flight_id.to_string()));
        }
        Ok(seats)
    }

    // ========== Bookings ==========

    /// Book seats on a flight for a user
    ///
    /// On success every requested seat is unavailable and the returned
    /// booking is stored. On any error nothing is written.
    pub fn create_booking(
        &self,
        flight_id: &str,
        user_id: &str,
        passengers: Vec<Passenger>,
    ) -> BookingResult<Booking> {
        validate_request(flight_id, user_id, &passengers)?;

        let flight = self.get_flight(flight_id)?;

        let outcome = self.store.transaction(|txn| {
            let mut batch = WriteBatch::new();
            let mut price: u64 = 0;

            for passenger in &passengers {
                let seat_key = Seat::key_for(&flight.id, &passenger.seat);
                let mut seat: Seat = txn.find(&seat_key)?.ok_or_else(|| {
                    BookingError::SeatNotFound {
                        flight_id: flight.id.clone(),
                        seat: passenger.seat.clone(),
                    }
                })?;
                if !seat.available {
                    return Err(BookingError::SeatUnavailable {
                        flight_id: flight.id.clone(),
                        seat: passenger.seat.clone(),
                    });
                }
                price = price
                    .checked_add(seat.price)
                    .ok_or_else(|| BookingError::validation("total price overflows"))?;
                seat.available = false;
                batch.add(&seat)?;
            }

            let booking = Booking {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                flight_id: flight.id.clone(),
                price,
                status: BookingStatus::Confirmed,
                passengers: passengers.clone(),
            };
            batch.add(&booking)?;
            txn.put_batch(&batch)?;
            Ok(booking)
        });

        match outcome {
            Ok(booking) => {
                info!(
                    target: "seatbook::booking",
                    booking_id = %booking.id,
                    flight_id = %booking.flight_id,
                    user_id = %booking.user_id,
                    seats = booking.passengers.len(),
                    price = booking.price,
                    "Booking confirmed"
                );
                Ok(booking)
            }
            Err(BookingError::Storage(Error::EngineConflict { key, .. })) => {
                let seat = conflicting_seat(&flight.id, &key, &passengers);
                warn!(
                    target: "seatbook::booking",
                    flight_id = %flight.id,
                    seat = %seat,
                    "Seat sold by a concurrent booking"
                );
                Err(BookingError::SeatUnavailable {
                    flight_id: flight.id,
                    seat,
                })
            }
            Err(e) => {
                debug!(target: "seatbook::booking", flight_id = %flight.id, error = %e, "Booking rejected");
                Err(e)
            }
        }
    }

    /// Bookings of a user, in key order
    pub fn list_bookings_for_user(&self, user_id: &str) -> BookingResult<Vec<Booking>> {
        validate_id("user id", user_id)?;
        self.store
            .scan::<Booking>(Some(user_id))?
            .map(|b| b.map_err(BookingError::from))
            .collect()
    }
}

fn validate_id(what: &str, id: &str) -> BookingResult<()> {
    if id.is_empty() {
        return Err(BookingError::validation(format!("{} must not be empty", what)));
    }
    if id.contains(key::SEPARATOR) {
        return Err(BookingError::validation(format!(
            "{} must not contain '{}'",
            what,
            key::SEPARATOR
        )));
    }
    Ok(())
}

fn validate_request(flight_id: &str, user_id: &str, passengers: &[Passenger]) -> BookingResult<()> {
    validate_id("flight id", flight_id)?;
    validate_id("user id", user_id)?;
    if passengers.is_empty() {
        return Err(BookingError::validation("no passengers"));
    }

    let mut seen = HashSet::new();
    for passenger in passengers {
        validate_id("seat code", &passenger.seat)?;
        if !seen.insert(passenger.seat.as_str()) {
            return Err(BookingError::validation(format!(
                "seat {} requested twice",
                passenger.seat
            )));
        }
    }
    Ok(())
}

/// Seat code named by a conflicting storage key, falling back to the
/// requested seats
fn conflicting_seat(flight_id: &str, conflict_key: &str, passengers: &[Passenger]) -> String {
    let prefix = key::scan_prefix(Seat::COLLECTION, Some(flight_id));
    key::entity_key(Seat::COLLECTION, &Key::from(conflict_key))
        .filter(|_| conflict_key.as_bytes().starts_with(prefix.as_bytes()))
        .and_then(|entity| entity.rsplit_once(key::SEPARATOR).map(|(_, s)| s.to_string()))
        .unwrap_or_else(|| {
            passengers
                .iter()
                .map(|p| p.seat.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
}
