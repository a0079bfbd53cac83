use chrono::{DateTime, Utc};
use reel_shared::Masked;
use serde::{Deserialize, Serialize};

use crate::{BookingId, MovieId, ShowtimeId};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub showtime_id: ShowtimeId,
    pub movie_id: MovieId,
    pub customer_name: String,
    pub phone_number: Option<Masked<String>>,
    pub seats_booked: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Active -> Cancelled is the only transition a booking ever makes.
    pub fn into_cancelled(mut self) -> Self {
        self.status = BookingStatus::Cancelled;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Raw booking input as the presentation layer collects it.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub showtime_id: ShowtimeId,
    pub customer_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub seats: i32,
}

/// A booking request that has passed field validation. Only
/// [`crate::validation::validate_request`] builds one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub(crate) showtime_id: ShowtimeId,
    pub(crate) customer_name: String,
    pub(crate) phone_number: Option<Masked<String>>,
    pub(crate) seats: i32,
}

impl NewBooking {
    pub fn showtime_id(&self) -> ShowtimeId {
        self.showtime_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn phone_number(&self) -> Option<&Masked<String>> {
        self.phone_number.as_ref()
    }

    pub fn seats(&self) -> i32 {
        self.seats
    }

    /// Materialise the committed record once the ledger has assigned an id.
    pub fn into_booking(self, id: BookingId, movie_id: MovieId, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id,
            showtime_id: self.showtime_id,
            movie_id,
            customer_name: self.customer_name,
            phone_number: self.phone_number,
            seats_booked: self.seats,
            status: BookingStatus::Active,
            created_at,
        }
    }
}

/// Result of a committed seat mutation: the booking it concerned and the
/// showtime's seat count right after the commit.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatChange {
    pub booking: Booking,
    pub available_seats: i32,
}
