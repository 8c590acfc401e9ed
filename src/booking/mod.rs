//! Capacity-safe booking.
//!
//! Every write that can change how many seats a meal has committed (new
//! reservations, party-size changes, moves between meals, lowering a meal's
//! `max_reservations`) goes through [`BookingCoordinator`], which re-checks
//! the [`ledger`] under the meal's exclusive lock inside one transaction.

mod coordinator;
pub mod ledger;
mod locks;

pub use coordinator::BookingCoordinator;
pub use ledger::{Clamp, Spots};
pub use locks::{MealLockGuard, MealLocks};

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("meal {0} not found")]
    MealNotFound(i64),

    #[error("reservation {0} not found")]
    ReservationNotFound(i64),

    #[error("not enough available spots: {requested} requested, {available} available")]
    InsufficientCapacity { requested: i64, available: i64 },

    #[error("max_reservations {max_reservations} is below the {reserved_spots} seats already reserved")]
    CapacityBelowReserved {
        max_reservations: i64,
        reserved_spots: i64,
    },

    #[error("booking transaction failed: {0}")]
    TransactionFailed(#[from] TransactionFailure),
}

/// Why a booking transaction was abandoned. Nothing was written; retrying is safe.
#[derive(Debug, thiserror::Error)]
pub enum TransactionFailure {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::TransactionFailed(TransactionFailure::Database(err))
    }
}
