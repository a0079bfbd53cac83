pub mod catalog;
pub mod seed;

pub use catalog::InMemoryCatalog;
pub use seed::{CatalogSeed, SeedError};
