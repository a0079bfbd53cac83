use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use reel_core::{Movie, MovieId, Showtime, ShowtimeId};
use serde::Serialize;

use crate::error::AppError;
use crate::extract::PathParam;
use crate::state::AppState;

/// One row of the "movies and showtimes" board.
#[derive(Debug, Serialize)]
pub struct ShowtimeListing {
    pub movie_id: MovieId,
    pub title: String,
    pub genre: String,
    pub showtime_id: ShowtimeId,
    pub show_time: DateTime<Utc>,
    pub capacity: i32,
    pub available_seats: i32,
}

impl From<(Movie, Showtime)> for ShowtimeListing {
    fn from((movie, showtime): (Movie, Showtime)) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title,
            genre: movie.genre,
            showtime_id: showtime.id,
            show_time: showtime.show_time,
            capacity: showtime.capacity,
            available_seats: showtime.available_seats,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/movies", get(list_movies))
        .route("/v1/movies/{id}", get(get_movie))
        .route("/v1/showtimes", get(list_showtimes))
        .route("/v1/showtimes/{id}", get(get_showtime))
}

async fn list_movies(State(state): State<AppState>) -> Result<Json<Vec<Movie>>, AppError> {
    Ok(Json(state.service.list_movies().await?))
}

async fn get_movie(
    State(state): State<AppState>,
    PathParam(id): PathParam<MovieId>,
) -> Result<Json<Movie>, AppError> {
    Ok(Json(state.service.get_movie(id).await?))
}

async fn list_showtimes(State(state): State<AppState>) -> Result<Json<Vec<ShowtimeListing>>, AppError> {
    let listing = state.service.list_movies_with_showtimes().await?;
    Ok(Json(listing.into_iter().map(ShowtimeListing::from).collect()))
}

async fn get_showtime(
    State(state): State<AppState>,
    PathParam(id): PathParam<ShowtimeId>,
) -> Result<Json<Showtime>, AppError> {
    Ok(Json(state.service.get_showtime(id).await?))
}
