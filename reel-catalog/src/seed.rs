use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use reel_core::{Movie, MovieId, Showtime, ShowtimeId};
use serde::Deserialize;

/// Catalog seed document, as stored in `config/catalog.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSeed {
    pub movies: Vec<MovieSeed>,
    #[serde(default)]
    pub showtimes: Vec<ShowtimeSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieSeed {
    pub id: MovieId,
    pub title: String,
    pub genre: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShowtimeSeed {
    pub id: ShowtimeId,
    pub movie_id: MovieId,
    pub show_time: DateTime<Utc>,
    /// Every seeded showtime opens with all seats available.
    pub capacity: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed seed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: i64 },

    #[error("Invalid {entity} {id}: {reason}")]
    Invalid {
        entity: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Showtime {showtime_id} references unknown movie {movie_id}")]
    UnknownMovie {
        showtime_id: ShowtimeId,
        movie_id: MovieId,
    },
}

impl CatalogSeed {
    pub fn from_json(raw: &str) -> Result<Self, SeedError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Checks ids, references and capacities, returning the records.
    pub fn into_records(self) -> Result<(Vec<Movie>, Vec<Showtime>), SeedError> {
        let mut movie_ids = HashSet::new();
        let mut movies = Vec::with_capacity(self.movies.len());

        for m in self.movies {
            if m.id <= 0 {
                return Err(SeedError::Invalid { entity: "movie", id: m.id, reason: "id must be positive".into() });
            }
            if m.duration_minutes <= 0 {
                return Err(SeedError::Invalid { entity: "movie", id: m.id, reason: "duration must be positive".into() });
            }
            if !movie_ids.insert(m.id) {
                return Err(SeedError::DuplicateId { entity: "movie", id: m.id });
            }
            movies.push(Movie {
                id: m.id,
                title: m.title,
                genre: m.genre,
                duration_minutes: m.duration_minutes,
                release_date: m.release_date,
            });
        }

        let mut showtime_ids = HashSet::new();
        let mut showtimes = Vec::with_capacity(self.showtimes.len());

        for s in self.showtimes {
            if s.id <= 0 {
                return Err(SeedError::Invalid { entity: "showtime", id: s.id, reason: "id must be positive".into() });
            }
            if !movie_ids.contains(&s.movie_id) {
                return Err(SeedError::UnknownMovie { showtime_id: s.id, movie_id: s.movie_id });
            }
            if s.capacity <= 0 {
                return Err(SeedError::Invalid { entity: "showtime", id: s.id, reason: "capacity must be positive".into() });
            }
            if !showtime_ids.insert(s.id) {
                return Err(SeedError::DuplicateId { entity: "showtime", id: s.id });
            }
            showtimes.push(Showtime {
                id: s.id,
                movie_id: s.movie_id,
                show_time: s.show_time,
                capacity: s.capacity,
                available_seats: s.capacity,
            });
        }

        Ok((movies, showtimes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = r#"{
        "movies": [
            { "id": 1, "title": "Inception", "genre": "Sci-Fi", "duration_minutes": 148, "release_date": "2010-07-16" }
        ],
        "showtimes": [
            { "id": 1, "movie_id": 1, "show_time": "2024-11-20T18:30:00Z", "capacity": 150 },
            { "id": 2, "movie_id": 1, "show_time": "2024-11-20T21:00:00Z", "capacity": 40 }
        ]
    }"#;

    #[test]
    fn test_parse_seed() {
        let (movies, showtimes) = CatalogSeed::from_json(SEED).unwrap().into_records().unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(showtimes[0].available_seats, 150);
        assert_eq!(showtimes[1].available_seats, showtimes[1].capacity);
    }

    #[test]
    fn test_rejects_dangling_movie() {
        let mut seed = CatalogSeed::from_json(SEED).unwrap();
        seed.showtimes[0].movie_id = 9;
        assert!(matches!(
            seed.into_records(),
            Err(SeedError::UnknownMovie { showtime_id: 1, movie_id: 9 })
        ));
    }

    #[test]
    fn test_rejects_empty_auditorium() {
        let mut seed = CatalogSeed::from_json(SEED).unwrap();
        seed.showtimes[1].capacity = 0;
        assert!(matches!(seed.into_records(), Err(SeedError::Invalid { entity: "showtime", id: 2, .. })));
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut seed = CatalogSeed::from_json(SEED).unwrap();
        seed.showtimes[1].id = 1;
        assert!(matches!(seed.into_records(), Err(SeedError::DuplicateId { entity: "showtime", id: 1 })));
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(CatalogSeed::from_json("{ \"movies\": 3 }"), Err(SeedError::Malformed(_))));
    }
}
