use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reel_core::{BookingError, CatalogRepository, Movie, MovieId, Showtime, ShowtimeId};
use sqlx::PgPool;

use crate::storage_error;

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct MovieRow {
    movie_id: i64,
    title: String,
    genre: String,
    duration_minutes: i32,
    release_date: NaiveDate,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.movie_id,
            title: row.title,
            genre: row.genre,
            duration_minutes: row.duration_minutes,
            release_date: row.release_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ShowtimeRow {
    showtime_id: i64,
    movie_id: i64,
    show_time: DateTime<Utc>,
    capacity: i32,
    available_seats: i32,
}

impl From<ShowtimeRow> for Showtime {
    fn from(row: ShowtimeRow) -> Self {
        Showtime {
            id: row.showtime_id,
            movie_id: row.movie_id,
            show_time: row.show_time,
            capacity: row.capacity,
            available_seats: row.available_seats,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    #[sqlx(flatten)]
    movie: MovieRow,
    showtime_id: i64,
    show_time: DateTime<Utc>,
    capacity: i32,
    available_seats: i32,
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>, BookingError> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT movie_id, title, genre, duration_minutes, release_date FROM movies WHERE movie_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Movie::from))
    }

    async fn get_showtime(&self, id: ShowtimeId) -> Result<Option<Showtime>, BookingError> {
        let row = sqlx::query_as::<_, ShowtimeRow>(
            "SELECT showtime_id, movie_id, show_time, capacity, available_seats FROM showtimes WHERE showtime_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.map(Showtime::from))
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT movie_id, title, genre, duration_minutes, release_date FROM movies ORDER BY movie_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn list_movies_with_showtimes(&self) -> Result<Vec<(Movie, Showtime)>, BookingError> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT m.movie_id, m.title, m.genre, m.duration_minutes, m.release_date,
                   s.showtime_id, s.show_time, s.capacity, s.available_seats
            FROM movies m
            JOIN showtimes s ON s.movie_id = m.movie_id
            ORDER BY m.movie_id, s.show_time, s.showtime_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let showtime = Showtime {
                    id: row.showtime_id,
                    movie_id: row.movie.movie_id,
                    show_time: row.show_time,
                    capacity: row.capacity,
                    available_seats: row.available_seats,
                };
                (Movie::from(row.movie), showtime)
            })
            .collect())
    }
}
