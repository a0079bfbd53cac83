use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use reel_core::{Booking, BookingId, BookingRequest, BookingStatus, MovieId, ShowtimeId};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::{JsonBody, PathParam};
use crate::state::AppState;

/// Booking as shown to clients. The phone number stays server-side.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub movie_id: MovieId,
    pub showtime_id: ShowtimeId,
    pub customer_name: String,
    pub seats_booked: i32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(booking: Booking) -> Self {
        Self {
            booking_id: booking.id,
            movie_id: booking.movie_id,
            showtime_id: booking.showtime_id,
            customer_name: booking.customer_name,
            seats_booked: booking.seats_booked,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings).post(create_booking))
        .route("/v1/bookings/{id}", get(get_booking).delete(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let booking = state.service.book(&request).await?;
    Ok((StatusCode::CREATED, Json(booking.into())))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state.service.list_bookings().await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn get_booking(
    State(state): State<AppState>,
    PathParam(id): PathParam<BookingId>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(state.service.get_booking(id).await?.into()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    PathParam(id): PathParam<BookingId>,
) -> Result<Json<BookingResponse>, AppError> {
    Ok(Json(state.service.cancel(id).await?.into()))
}
