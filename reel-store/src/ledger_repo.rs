use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reel_core::{
    Booking, BookingError, BookingId, BookingStatus, Entity, LedgerRepository, NewBooking, SeatChange, Showtime,
    ShowtimeId,
};
use reel_shared::Masked;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::storage_error;

/// Ledger backed by the `showtimes` and `bookings` tables.
///
/// Each mutation runs in one transaction that first takes the showtime row
/// with `FOR UPDATE`; the row lock is the unit of serialisation. Everything
/// up to the commit is subject to the caller's wait bound. A timeout drops
/// the uncommitted transaction, which rolls back.
pub struct PgLedgerRepository {
    pool: PgPool,
}

impl PgLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_showtime(
        &self,
        showtime_id: ShowtimeId,
        wait: Duration,
    ) -> Result<(Transaction<'static, Postgres>, SeatRow), BookingError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let millis = format!("{}ms", wait.as_millis().max(1));
        sqlx::query("SELECT set_config('lock_timeout', $1, true), set_config('statement_timeout', $1, true)")
            .bind(millis)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;

        let seats = sqlx::query_as::<_, SeatRow>(
            "SELECT movie_id, capacity, available_seats FROM showtimes WHERE showtime_id = $1 FOR UPDATE",
        )
        .bind(showtime_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(storage_error)?
        .ok_or_else(|| BookingError::not_found(Entity::Showtime, showtime_id))?;

        Ok((tx, seats))
    }
}

/// Runs the uncommitted part of a ledger transaction under the wait bound.
async fn bounded<T>(
    wait: Duration,
    what: impl std::fmt::Display,
    work: impl Future<Output = Result<T, BookingError>>,
) -> Result<T, BookingError> {
    tokio::time::timeout(wait, work).await.map_err(|_| {
        warn!("Timed out after {:?} working on {}", wait, what);
        BookingError::StorageUnavailable(format!("timed out after {:?} working on {}", wait, what))
    })?
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    movie_id: i64,
    capacity: i32,
    available_seats: i32,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    booking_id: i64,
    showtime_id: i64,
    movie_id: i64,
    full_name: String,
    phone_number: Option<String>,
    seats_booked: i32,
    created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.booking_id,
            showtime_id: row.showtime_id,
            movie_id: row.movie_id,
            customer_name: row.full_name,
            phone_number: row.phone_number.map(Masked::new),
            seats_booked: row.seats_booked,
            status: BookingStatus::Active,
            created_at: row.created_at,
        }
    }
}

const BOOKING_COLUMNS: &str = "booking_id, showtime_id, movie_id, full_name, phone_number, seats_booked, created_at";

#[async_trait]
impl LedgerRepository for PgLedgerRepository {
    async fn reserve(
        &self,
        showtime: &Showtime,
        booking: &NewBooking,
        wait: Duration,
    ) -> Result<SeatChange, BookingError> {
        let work = async {
            let (mut tx, seats) = self.lock_showtime(showtime.id, wait).await?;

            if seats.available_seats < booking.seats() {
                return Err(BookingError::InsufficientSeats {
                    showtime_id: showtime.id,
                    requested: booking.seats(),
                    available: seats.available_seats,
                });
            }

            let available_seats: i32 = sqlx::query_scalar(
                "UPDATE showtimes SET available_seats = available_seats - $1 WHERE showtime_id = $2 RETURNING available_seats",
            )
            .bind(booking.seats())
            .bind(showtime.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

            let (booking_id, created_at): (i64, DateTime<Utc>) = sqlx::query_as(
                r#"
                INSERT INTO bookings (showtime_id, movie_id, full_name, phone_number, seats_booked)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING booking_id, created_at
                "#,
            )
            .bind(showtime.id)
            .bind(seats.movie_id)
            .bind(booking.customer_name())
            .bind(booking.phone_number().map(|p| p.expose().as_str()))
            .bind(booking.seats())
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

            let change = SeatChange {
                booking: booking.clone().into_booking(booking_id, seats.movie_id, created_at),
                available_seats,
            };
            Ok((tx, change))
        };

        let (tx, change) = bounded(wait, format!("showtime {}", showtime.id), work).await?;
        tx.commit().await.map_err(storage_error)?;

        info!(
            "Booking {} committed: {} seats on showtime {}, {} left",
            change.booking.id, change.booking.seats_booked, showtime.id, change.available_seats
        );
        Ok(change)
    }

    async fn release(&self, booking_id: BookingId, wait: Duration) -> Result<SeatChange, BookingError> {
        let work = async {
            let showtime_id: ShowtimeId = sqlx::query_scalar("SELECT showtime_id FROM bookings WHERE booking_id = $1")
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?
                .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?;

            let (mut tx, seats) = self.lock_showtime(showtime_id, wait).await?;

            // A concurrent cancel may have won the row lock first.
            let row = sqlx::query_as::<_, BookingRow>(&format!(
                "DELETE FROM bookings WHERE booking_id = $1 RETURNING {}",
                BOOKING_COLUMNS
            ))
            .bind(booking_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| BookingError::not_found(Entity::Booking, booking_id))?;

            let restored = seats.available_seats + row.seats_booked;
            if restored > seats.capacity {
                return Err(BookingError::invariant(format!(
                    "releasing booking {} would raise showtime {} to {} seats, capacity is {}",
                    booking_id, showtime_id, restored, seats.capacity
                )));
            }

            let available_seats: i32 = sqlx::query_scalar(
                "UPDATE showtimes SET available_seats = available_seats + $1 WHERE showtime_id = $2 RETURNING available_seats",
            )
            .bind(row.seats_booked)
            .bind(showtime_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(storage_error)?;

            let change = SeatChange {
                booking: Booking::from(row).into_cancelled(),
                available_seats,
            };
            Ok((tx, change))
        };

        let (tx, change) = bounded(wait, format!("booking {}", booking_id), work).await?;
        tx.commit().await.map_err(storage_error)?;

        info!(
            "Booking {} cancelled: {} seats returned to showtime {}, {} left",
            booking_id, change.booking.seats_booked, change.booking.showtime_id, change.available_seats
        );
        Ok(change)
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, BookingError> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings WHERE booking_id = $1",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Booking::from))
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, BookingError> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {} FROM bookings ORDER BY booking_id",
            BOOKING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }

    async fn available_seats(&self, showtime_id: ShowtimeId) -> Result<Option<i32>, BookingError> {
        sqlx::query_scalar("SELECT available_seats FROM showtimes WHERE showtime_id = $1")
            .bind(showtime_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)
    }
}
