use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted after a booking or cancellation has committed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingEvent {
    Booked {
        booking_id: i64,
        showtime_id: i64,
        seats: i32,
        available_seats: i32,
        timestamp: DateTime<Utc>,
    },
    Cancelled {
        booking_id: i64,
        showtime_id: i64,
        seats: i32,
        available_seats: i32,
        timestamp: DateTime<Utc>,
    },
}

impl BookingEvent {
    pub fn showtime_id(&self) -> i64 {
        match self {
            BookingEvent::Booked { showtime_id, .. } | BookingEvent::Cancelled { showtime_id, .. } => *showtime_id,
        }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::Booked { .. } => "booked",
            BookingEvent::Cancelled { .. } => "cancelled",
        }
    }
}
