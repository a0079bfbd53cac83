use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reel_catalog::InMemoryCatalog;
use reel_core::{
    Booking, BookingError, BookingId, Entity, LedgerRepository, MovieId, NewBooking, SeatChange, Showtime,
    ShowtimeId,
};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const DEFAULT_READ_WAIT: Duration = Duration::from_secs(3);

/// Seat counter plus the live bookings of one showtime. Always mutated as a
/// unit while its mutex is held.
#[derive(Debug)]
struct SeatAccount {
    movie_id: MovieId,
    capacity: i32,
    available: i32,
    bookings: BTreeMap<BookingId, Booking>,
}

/// In-memory ledger with one lock per showtime.
///
/// The booking index only routes a booking id to its showtime; the account
/// behind the showtime's mutex is authoritative. Once an account lock is
/// held, every write happens without awaiting, so a caller that gives up
/// mid-call never leaves a half-applied change behind.
pub struct MemoryLedger {
    accounts: HashMap<ShowtimeId, Mutex<SeatAccount>>,
    index: RwLock<HashMap<BookingId, ShowtimeId>>,
    next_id: AtomicI64,
    read_wait: Duration,
}

impl MemoryLedger {
    /// Opens an account for every showtime in the catalog.
    pub fn from_catalog(catalog: &InMemoryCatalog) -> Self {
        Self::from_showtimes(catalog.showtimes())
    }

    pub fn from_showtimes<'a>(showtimes: impl IntoIterator<Item = &'a Showtime>) -> Self {
        let accounts = showtimes
            .into_iter()
            .map(|s| {
                let account = SeatAccount {
                    movie_id: s.movie_id,
                    capacity: s.capacity,
                    available: s.available_seats,
                    bookings: BTreeMap::new(),
                };
                (s.id, Mutex::new(account))
            })
            .collect();

        Self {
            accounts,
            index: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            read_wait: DEFAULT_READ_WAIT,
        }
    }

    /// Bound for the lock waits of read operations.
    pub fn with_read_wait(mut self, wait: Duration) -> Self {
        self.read_wait = wait;
        self
    }

    async fn lock(&self, showtime_id: ShowtimeId, wait: Duration) -> Result<MutexGuard<'_, SeatAccount>, BookingError> {
        let account = self
            .accounts
            .get(&showtime_id)
            .ok_or_else(|| BookingError::not_found(Entity::Showtime, showtime_id))?;

        tokio::time::timeout(wait, account.lock()).await.map_err(|_| {
            warn!("Timed out after {:?} waiting for showtime {}", wait, showtime_id);
            BookingError::StorageUnavailable(format!(
                "timed out after {:?} waiting for showtime {}",
                wait, showtime_id
            ))
        })
    }

    fn showtime_of(&self, booking_id: BookingId) -> Result<Option<ShowtimeId>, BookingError> {
        let index = self
            .index
            .read()
            .map_err(|_| BookingError::invariant("booking index lock poisoned"))?;
        Ok(index.get(&booking_id).copied())
    }

    fn commit_reservation(
        &self,
        showtime_id: ShowtimeId,
        account: &mut SeatAccount,
        booking: &NewBooking,
    ) -> Result<SeatChange, BookingError> {
        let seats = booking.seats();
        if account.available < seats {
            return Err(BookingError::InsufficientSeats {
                showtime_id,
                requested: seats,
                available: account.available,
            });
        }

        let mut index = self
            .index
            .write()
            .map_err(|_| BookingError::invariant("booking index lock poisoned"))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = booking.clone().into_booking(id, account.movie_id, Utc::now());

        account.available -= seats;
        account.bookings.insert(id, record.clone());
        index.insert(id, showtime_id);

        Ok(SeatChange {
            booking: record,
            available_seats: account.available,
        })
    }

    fn commit_release(
        &self,
        showtime_id: ShowtimeId,
        account: &mut SeatAccount,
        booking_id: BookingId,
    ) -> Result<SeatChange, BookingError> {
        let seats = account
            .bookings
            .get(&booking_id)
            .map(|b| b.seats_booked)
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?;

        let restored = account.available + seats;
        if restored > account.capacity {
            return Err(BookingError::invariant(format!(
                "releasing booking {} would raise showtime {} to {} seats, capacity is {}",
                booking_id, showtime_id, restored, account.capacity
            )));
        }

        let mut index = self
            .index
            .write()
            .map_err(|_| BookingError::invariant("booking index lock poisoned"))?;

        let Some(record) = account.bookings.remove(&booking_id) else {
            return Err(BookingError::not_found(Entity::Booking, booking_id));
        };
        index.remove(&booking_id);
        account.available = restored;

        Ok(SeatChange {
            booking: record.into_cancelled(),
            available_seats: account.available,
        })
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedger {
    async fn reserve(
        &self,
        showtime: &Showtime,
        booking: &NewBooking,
        wait: Duration,
    ) -> Result<SeatChange, BookingError> {
        let mut account = self.lock(showtime.id, wait).await?;
        let change = self.commit_reservation(showtime.id, &mut account, booking)?;
        drop(account);

        info!(
            "Booking {} committed: {} seats on showtime {}, {} left",
            change.booking.id, change.booking.seats_booked, showtime.id, change.available_seats
        );
        Ok(change)
    }

    async fn release(&self, booking_id: BookingId, wait: Duration) -> Result<SeatChange, BookingError> {
        let showtime_id = self
            .showtime_of(booking_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?;

        let mut account = self.lock(showtime_id, wait).await?;
        let change = self.commit_release(showtime_id, &mut account, booking_id)?;
        drop(account);

        info!(
            "Booking {} cancelled: {} seats returned to showtime {}, {} left",
            booking_id, change.booking.seats_booked, showtime_id, change.available_seats
        );
        Ok(change)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, BookingError> {
        let Some(showtime_id) = self.showtime_of(id)? else {
            return Ok(None);
        };
        let account = self.lock(showtime_id, self.read_wait).await?;
        Ok(account.bookings.get(&id).cloned())
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let mut bookings = Vec::new();
        for showtime_id in self.accounts.keys() {
            let account = self.lock(*showtime_id, self.read_wait).await?;
            bookings.extend(account.bookings.values().cloned());
        }
        bookings.sort_by_key(|b| b.id);
        debug!("Listed {} live bookings", bookings.len());
        Ok(bookings)
    }

    async fn available_seats(&self, showtime_id: ShowtimeId) -> Result<Option<i32>, BookingError> {
        if !self.accounts.contains_key(&showtime_id) {
            return Ok(None);
        }
        let account = self.lock(showtime_id, self.read_wait).await?;
        Ok(Some(account.available))
    }
}
