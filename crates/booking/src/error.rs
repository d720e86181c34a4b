//! Booking workflow errors

use seatbook_core::Error;
use thiserror::Error;

/// Result type alias for booking operations
pub type BookingResult<T> = std::result::Result<T, BookingError>;

/// Failures of the booking workflow
///
/// Storage errors pass through unchanged as `Storage`, except commit
/// conflicts during `create_booking`, which surface as `SeatUnavailable`.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request was rejected before touching storage
    #[error("Invalid booking request: {0}")]
    Validation(String),

    /// No flight with this id
    #[error("Flight not found: {0}")]
    FlightNotFound(String),

    /// A flight with this id, or seats under it, is already registered
    #[error("Flight already registered: {0}")]
    FlightExists(String),

    /// The flight has no seat with this code
    #[error("Seat {seat} not found on flight {flight_id}")]
    SeatNotFound {
        /// Flight searched
        flight_id: String,
        /// Requested seat code
        seat: String,
    },

    /// The seat is already sold
    #[error("Seat {seat} on flight {flight_id} is not available")]
    SeatUnavailable {
        /// Flight of the seat
        flight_id: String,
        /// Seat code
        seat: String,
    },

    /// A flight has no available seats left
    #[error("No seats available on flight {0}")]
    NoSeatsAvailable(String),

    /// Engine or collection failure
    #[error(transparent)]
    Storage(#[from] Error),
}

impl BookingError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        BookingError::Validation(msg.into())
    }

    /// Whether re-running the whole request may succeed
    ///
    /// Only storage-level timeouts qualify; a sold seat stays sold.
    pub fn is_transient(&self) -> bool {
        matches!(self, BookingError::Storage(Error::EngineTimeout(_)))
    }
}
