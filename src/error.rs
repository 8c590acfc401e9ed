//! HTTP-facing error type. Every handler returns `Result<_, ApiError>`;
//! bodies are always `{"error": "..."}`.

use crate::booking::BookingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

pub const NOT_ENOUGH_SPOTS: &str = "Not enough available spots";

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Booking(err) => match err {
                BookingError::InvalidInput(_) | BookingError::InsufficientCapacity { .. } => {
                    StatusCode::BAD_REQUEST
                }
                BookingError::MealNotFound(_) | BookingError::ReservationNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                BookingError::CapacityBelowReserved { .. } => StatusCode::CONFLICT,
                BookingError::TransactionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            ApiError::Booking(BookingError::InsufficientCapacity { .. }) => {
                NOT_ENOUGH_SPOTS.to_string()
            }
            ApiError::Database(err) => {
                log::error!("database error: {err}");
                "Internal server error".to_string()
            }
            // Already logged by the coordinator.
            ApiError::Booking(BookingError::TransactionFailed(_)) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse { error })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::TransactionFailure;
    use std::time::Duration;

    #[test]
    fn booking_errors_map_to_statuses() {
        let cases = [
            (
                BookingError::InvalidInput("zero guests".into()),
                StatusCode::BAD_REQUEST,
            ),
            (BookingError::MealNotFound(3), StatusCode::NOT_FOUND),
            (
                BookingError::InsufficientCapacity {
                    requested: 3,
                    available: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                BookingError::CapacityBelowReserved {
                    max_reservations: 2,
                    reserved_spots: 4,
                },
                StatusCode::CONFLICT,
            ),
            (
                TransactionFailure::TimedOut(Duration::from_secs(1)).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn transaction_failures_do_not_leak_details() {
        let err = ApiError::from(BookingError::from(sqlx::Error::PoolTimedOut));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
