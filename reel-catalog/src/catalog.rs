use std::collections::BTreeMap;

use async_trait::async_trait;
use reel_core::{BookingError, CatalogRepository, Movie, MovieId, Showtime, ShowtimeId};
use tracing::info;

use crate::seed::{CatalogSeed, SeedError};

/// Immutable catalog held in memory. Shared behind an `Arc` without locking.
///
/// Seat counts reported here are the seeded ones; the live counter belongs
/// to the ledger.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    movies: BTreeMap<MovieId, Movie>,
    showtimes: BTreeMap<ShowtimeId, Showtime>,
}

impl InMemoryCatalog {
    pub fn from_seed(seed: CatalogSeed) -> Result<Self, SeedError> {
        let (movies, showtimes) = seed.into_records()?;
        info!("Catalog seeded with {} movies and {} showtimes", movies.len(), showtimes.len());

        Ok(Self {
            movies: movies.into_iter().map(|m| (m.id, m)).collect(),
            showtimes: showtimes.into_iter().map(|s| (s.id, s)).collect(),
        })
    }

    pub fn movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    pub fn showtime(&self, id: ShowtimeId) -> Option<&Showtime> {
        self.showtimes.get(&id)
    }

    pub fn showtimes(&self) -> impl Iterator<Item = &Showtime> {
        self.showtimes.values()
    }

    /// Movie/showtime pairs ordered by movie id, then show time, then showtime id.
    pub fn listing(&self) -> Vec<(Movie, Showtime)> {
        let mut rows: Vec<(Movie, Showtime)> = self
            .showtimes
            .values()
            .filter_map(|s| self.movies.get(&s.movie_id).map(|m| (m.clone(), s.clone())))
            .collect();

        rows.sort_by(|(a_movie, a_show), (b_movie, b_show)| {
            a_movie
                .id
                .cmp(&b_movie.id)
                .then(a_show.show_time.cmp(&b_show.show_time))
                .then(a_show.id.cmp(&b_show.id))
        });
        rows
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>, BookingError> {
        Ok(self.movie(id).cloned())
    }

    async fn get_showtime(&self, id: ShowtimeId) -> Result<Option<Showtime>, BookingError> {
        Ok(self.showtime(id).cloned())
    }

    async fn list_movies(&self) -> Result<Vec<Movie>, BookingError> {
        Ok(self.movies.values().cloned().collect())
    }

    async fn list_movies_with_showtimes(&self) -> Result<Vec<(Movie, Showtime)>, BookingError> {
        Ok(self.listing())
    }
}
