use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reel_core::validation::validate_request;
use reel_core::{
    Booking, BookingError, BookingId, BookingPolicy, BookingRequest, CatalogRepository, Entity, LedgerRepository,
    Movie, MovieId, SeatChange, Showtime, ShowtimeId,
};
use reel_shared::BookingEvent;
use tokio::sync::broadcast;
use tracing::{info, warn};

const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(3);

/// Entry point for every booking workflow: validates input, resolves the
/// showtime and delegates the atomic seat mutation to the ledger.
#[derive(Clone)]
pub struct BookingService {
    catalog: Arc<dyn CatalogRepository>,
    ledger: Arc<dyn LedgerRepository>,
    policy: BookingPolicy,
    lock_wait: Duration,
    events: Option<broadcast::Sender<BookingEvent>>,
}

impl BookingService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, ledger: Arc<dyn LedgerRepository>) -> Self {
        Self {
            catalog,
            ledger,
            policy: BookingPolicy::default(),
            lock_wait: DEFAULT_LOCK_WAIT,
            events: None,
        }
    }

    pub fn with_policy(mut self, policy: BookingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Default bound on how long `book` and `cancel` queue for a showtime.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    /// Committed bookings and cancellations are announced on `events`.
    pub fn with_events(mut self, events: broadcast::Sender<BookingEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub async fn get_movie(&self, id: MovieId) -> Result<Movie, BookingError> {
        self.catalog
            .get_movie(id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Movie, id))
    }

    pub async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        self.catalog.list_movies().await
    }

    /// The showtime with its live seat count.
    pub async fn get_showtime(&self, id: ShowtimeId) -> Result<Showtime, BookingError> {
        let showtime = self
            .catalog
            .get_showtime(id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Showtime, id))?;
        self.with_live_seats(showtime).await
    }

    pub async fn list_movies_with_showtimes(&self) -> Result<Vec<(Movie, Showtime)>, BookingError> {
        let listing = self.catalog.list_movies_with_showtimes().await?;
        let mut rows = Vec::with_capacity(listing.len());
        for (movie, showtime) in listing {
            rows.push((movie, self.with_live_seats(showtime).await?));
        }
        Ok(rows)
    }

    pub async fn book(&self, request: &BookingRequest) -> Result<Booking, BookingError> {
        self.book_within(request, self.lock_wait).await
    }

    pub async fn book_within(&self, request: &BookingRequest, wait: Duration) -> Result<Booking, BookingError> {
        let booking = validate_request(request, &self.policy).inspect_err(|e| {
            warn!("Rejected booking for showtime {}: {}", request.showtime_id, e);
        })?;

        let showtime = self
            .catalog
            .get_showtime(booking.showtime_id())
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Showtime, booking.showtime_id()))?;

        let change = self.ledger.reserve(&showtime, &booking, wait).await.inspect_err(|e| {
            if e.is_user_error() {
                warn!("Booking on showtime {} refused: {}", showtime.id, e);
            }
        })?;

        self.publish(BookingEvent::Booked {
            booking_id: change.booking.id,
            showtime_id: change.booking.showtime_id,
            seats: change.booking.seats_booked,
            available_seats: change.available_seats,
            timestamp: Utc::now(),
        });
        Ok(change.booking)
    }

    /// Returns the removed booking, marked cancelled.
    pub async fn cancel(&self, booking_id: BookingId) -> Result<Booking, BookingError> {
        self.cancel_within(booking_id, self.lock_wait).await
    }

    pub async fn cancel_within(&self, booking_id: BookingId, wait: Duration) -> Result<Booking, BookingError> {
        let SeatChange { booking, available_seats } = self.ledger.release(booking_id, wait).await?;
        info!("Cancellation of booking {} committed", booking.id);

        self.publish(BookingEvent::Cancelled {
            booking_id: booking.id,
            showtime_id: booking.showtime_id,
            seats: booking.seats_booked,
            available_seats,
            timestamp: Utc::now(),
        });
        Ok(booking)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.ledger
            .get_booking(id)
            .await?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, id))
    }

    pub async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        self.ledger.list_bookings().await
    }

    async fn with_live_seats(&self, showtime: Showtime) -> Result<Showtime, BookingError> {
        match self.ledger.available_seats(showtime.id).await? {
            Some(seats) => Ok(showtime.with_available_seats(seats)),
            None => Err(BookingError::invariant(format!(
                "showtime {} is in the catalog but has no seat account",
                showtime.id
            ))),
        }
    }

    fn publish(&self, event: BookingEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine.
            let _ = events.send(event);
        }
    }
}
