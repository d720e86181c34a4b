//! Booking entities
//!
//! Persisted as JSON with camelCase field names. Statuses are lowercase
//! strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use seatbook_collections::Model;

/// Operational status of a flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    /// Operating as planned
    Scheduled,
    /// Will not operate
    Cancelled,
    /// Operating late
    Delayed,
}

/// A flight, stored in `flights` under its id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    /// Flight identifier
    pub id: String,
    /// Origin airport code
    pub from: String,
    /// Destination airport code
    pub to: String,
    /// Departure time
    pub departure: DateTime<Utc>,
    /// Arrival time
    pub arrival: DateTime<Utc>,
    /// Operational status
    pub status: FlightStatus,
}

impl Model for Flight {
    const COLLECTION: &'static str = "flights";

    fn key(&self) -> String {
        self.id.clone()
    }
}

/// A seat on a flight, stored in `seats` under `flight_id/seat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// Flight the seat belongs to
    pub flight_id: String,
    /// Seat code, e.g. `14C`
    pub seat: String,
    /// Row number
    pub row: u32,
    /// Price in the smallest currency unit
    pub price: u64,
    /// Whether the seat can still be booked
    pub available: bool,
}

impl Seat {
    /// Entity key of a seat without building one
    pub fn key_for(flight_id: &str, seat: &str) -> String {
        format!("{}/{}", flight_id, seat)
    }
}

impl Model for Seat {
    const COLLECTION: &'static str = "seats";

    fn key(&self) -> String {
        Seat::key_for(&self.flight_id, &self.seat)
    }
}

/// A traveller and the seat they occupy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Passenger name
    pub name: String,
    /// Requested seat code
    pub seat: String,
}

impl Passenger {
    /// Create a passenger
    pub fn new(name: impl Into<String>, seat: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            seat: seat.into(),
        }
    }
}

/// Booking status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Seats are held for the passengers
    Confirmed,
}

/// A confirmed reservation, stored in `bookings` under `user_id/id`
///
/// Immutable once written. `price` is the sum of the seat prices at the time
/// of booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking identifier (UUID v4)
    pub id: Uuid,
    /// Owning user
    pub user_id: String,
    /// Booked flight
    pub flight_id: String,
    /// Total price captured at booking time
    pub price: u64,
    /// Booking status
    pub status: BookingStatus,
    /// Passengers in request order
    pub passengers: Vec<Passenger>,
}

impl Booking {
    /// Seat codes held by this booking, in passenger order
    pub fn seats(&self) -> impl Iterator<Item = &str> {
        self.passengers.iter().map(|p| p.seat.as_str())
    }
}

impl Model for Booking {
    const COLLECTION: &'static str = "bookings";

    fn key(&self) -> String {
        format!("{}/{}", self.user_id, self.id)
    }
}
