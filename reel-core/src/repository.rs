use std::time::Duration;

use async_trait::async_trait;

use crate::booking::{Booking, NewBooking, SeatChange};
use crate::catalog::{Movie, Showtime};
use crate::{BookingError, BookingId, MovieId, ShowtimeId};

/// Read access to movies and showtimes.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>, BookingError>;

    async fn get_showtime(&self, id: ShowtimeId) -> Result<Option<Showtime>, BookingError>;

    /// Ordered by movie id.
    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError>;

    /// Ordered by movie id, then show time.
    async fn list_movies_with_showtimes(&self) -> Result<Vec<(Movie, Showtime)>, BookingError>;
}

/// Owner of bookings and of every showtime's seat counter.
///
/// `reserve` and `release` are atomic per showtime: either the seat counter
/// and the booking set change together or neither changes. `wait` bounds how
/// long the call may queue for the showtime; when it elapses the call fails
/// with [`BookingError::StorageUnavailable`] having changed nothing.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn reserve(
        &self,
        showtime: &Showtime,
        booking: &NewBooking,
        wait: Duration,
    ) -> Result<SeatChange, BookingError>;

    async fn release(&self, booking_id: BookingId, wait: Duration) -> Result<SeatChange, BookingError>;

    /// Live bookings only.
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, BookingError>;

    /// Live bookings ordered by id.
    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError>;

    async fn available_seats(&self, showtime_id: ShowtimeId) -> Result<Option<i32>, BookingError>;
}
