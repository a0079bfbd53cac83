use std::fmt;

use crate::ShowtimeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Movie,
    Showtime,
    Booking,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entity::Movie => write!(f, "Movie"),
            Entity::Showtime => write!(f, "Showtime"),
            Entity::Booking => write!(f, "Booking"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },

    #[error("Invalid {field}: {reason}")]
    ValidationError { field: &'static str, reason: String },

    #[error("Insufficient seats for showtime {showtime_id}: requested {requested}, available {available}")]
    InsufficientSeats {
        showtime_id: ShowtimeId,
        requested: i32,
        available: i32,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl BookingError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        BookingError::NotFound { entity, id }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        BookingError::ValidationError {
            field,
            reason: reason.into(),
        }
    }

    /// Builds an `InvariantViolation` and reports it. Callers must abort
    /// without committing.
    pub fn invariant(detail: impl Into<String>) -> Self {
        let detail = detail.into();
        tracing::error!(defect = true, "Ledger invariant violated: {}", detail);
        BookingError::InvariantViolation(detail)
    }

    /// Input the customer can correct and resubmit.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            BookingError::NotFound { .. }
                | BookingError::ValidationError { .. }
                | BookingError::InsufficientSeats { .. }
        )
    }

    /// Worth retrying unchanged once storage recovers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::StorageUnavailable(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NotFound { .. } => "NOT_FOUND",
            BookingError::ValidationError { .. } => "VALIDATION_ERROR",
            BookingError::InsufficientSeats { .. } => "INSUFFICIENT_SEATS",
            BookingError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            BookingError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
        }
    }
}
