pub mod booking;
pub mod catalog;
pub mod error;
pub mod repository;
pub mod validation;

pub use booking::{Booking, BookingRequest, BookingStatus, NewBooking, SeatChange};
pub use catalog::{Movie, Showtime};
pub use error::{BookingError, Entity};
pub use repository::{CatalogRepository, LedgerRepository};
pub use validation::BookingPolicy;

pub type MovieId = i64;
pub type ShowtimeId = i64;
pub type BookingId = i64;

pub type CoreResult<T> = Result<T, BookingError>;
