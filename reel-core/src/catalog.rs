use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{MovieId, ShowtimeId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub genre: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
}

/// A scheduled screening. `capacity` is fixed at creation, `available_seats`
/// is owned by the ledger and only moves through bookings and cancellations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Showtime {
    pub id: ShowtimeId,
    pub movie_id: MovieId,
    pub show_time: DateTime<Utc>,
    pub capacity: i32,
    pub available_seats: i32,
}

impl Showtime {
    pub fn seats_sold(&self) -> i32 {
        self.capacity - self.available_seats
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_seats == 0
    }

    /// Same showtime with a fresher seat count.
    pub fn with_available_seats(mut self, available_seats: i32) -> Self {
        self.available_seats = available_seats;
        self
    }
}
