//! Postgres ledger tests. They need a reachable server:
//! `DATABASE_URL=postgres://... cargo test -p reel-store -- --ignored`

use std::time::Duration;

use reel_core::validation::validate_request;
use reel_core::{
    BookingError, BookingPolicy, BookingRequest, BookingStatus, CatalogRepository, LedgerRepository, NewBooking,
    Showtime,
};
use reel_store::{PgCatalogRepository, PgLedgerRepository};
use sqlx::PgPool;

const WAIT: Duration = Duration::from_millis(500);

fn new_booking(showtime_id: i64, seats: i32) -> NewBooking {
    let request = BookingRequest {
        showtime_id,
        customer_name: "Ada Lovelace".into(),
        phone_number: Some("+15550100".into()),
        seats,
    };
    validate_request(&request, &BookingPolicy::default()).unwrap()
}

async fn showtime(pool: &PgPool, id: i64) -> Showtime {
    PgCatalogRepository::new(pool.clone())
        .get_showtime(id)
        .await
        .unwrap()
        .unwrap()
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_reserve_then_release(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 1).await;

    let booked = ledger.reserve(&st, &new_booking(1, 4), WAIT).await.unwrap();
    assert_eq!(booked.available_seats, 146);
    assert_eq!(booked.booking.movie_id, st.movie_id);
    assert_eq!(ledger.available_seats(1).await.unwrap(), Some(146));

    let stored = ledger.get_booking(booked.booking.id).await.unwrap().unwrap();
    assert_eq!(stored.seats_booked, 4);
    assert_eq!(stored.phone_number.unwrap().expose(), "+15550100");

    let released = ledger.release(booked.booking.id, WAIT).await.unwrap();
    assert_eq!(released.available_seats, 150);
    assert_eq!(released.booking.status, BookingStatus::Cancelled);
    assert!(ledger.get_booking(booked.booking.id).await.unwrap().is_none());

    let again = ledger.release(booked.booking.id, WAIT).await.unwrap_err();
    assert!(matches!(again, BookingError::NotFound { .. }));
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_insufficient_seats_writes_nothing(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 2).await;

    let err = ledger.reserve(&st, &new_booking(2, 151), WAIT).await.unwrap_err();
    assert_eq!(
        err,
        BookingError::InsufficientSeats { showtime_id: 2, requested: 151, available: 150 }
    );
    assert_eq!(ledger.available_seats(2).await.unwrap(), Some(150));
    assert!(ledger.list_bookings().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_ids_are_not_reused(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 3).await;

    let first = ledger.reserve(&st, &new_booking(3, 1), WAIT).await.unwrap().booking.id;
    ledger.release(first, WAIT).await.unwrap();
    let second = ledger.reserve(&st, &new_booking(3, 1), WAIT).await.unwrap().booking.id;
    assert!(second > first);

    let ids: Vec<i64> = ledger.list_bookings().await.unwrap().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second]);
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_racing_cancels_release_once(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 1).await;
    let id = ledger.reserve(&st, &new_booking(1, 5), WAIT).await.unwrap().booking.id;

    let (a, b) = tokio::join!(ledger.release(id, WAIT), ledger.release(id, WAIT));
    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(BookingError::NotFound { .. }))));
    assert_eq!(ledger.available_seats(1).await.unwrap(), Some(150));
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_release_over_capacity_is_refused(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 4).await;
    let id = ledger.reserve(&st, &new_booking(4, 3), WAIT).await.unwrap().booking.id;

    sqlx::query("UPDATE showtimes SET available_seats = capacity WHERE showtime_id = 4")
        .execute(&pool)
        .await
        .unwrap();

    let err = ledger.release(id, WAIT).await.unwrap_err();
    assert!(matches!(err, BookingError::InvariantViolation(_)));
    assert!(ledger.get_booking(id).await.unwrap().is_some());
    assert_eq!(ledger.available_seats(4).await.unwrap(), Some(150));
}

#[sqlx::test(migrations = "../migrations")]
#[ignore]
async fn test_lock_wait_is_bounded(pool: PgPool) {
    let ledger = PgLedgerRepository::new(pool.clone());
    let st = showtime(&pool, 5).await;

    let mut holder = pool.begin().await.unwrap();
    sqlx::query("SELECT 1 FROM showtimes WHERE showtime_id = 5 FOR UPDATE")
        .execute(&mut *holder)
        .await
        .unwrap();

    let err = ledger
        .reserve(&st, &new_booking(5, 2), Duration::from_millis(200))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    holder.rollback().await.unwrap();

    assert_eq!(ledger.available_seats(5).await.unwrap(), Some(150));
    assert!(ledger.list_bookings().await.unwrap().is_empty());
}
