pub mod ledger;
pub mod service;

pub use ledger::MemoryLedger;
pub use service::BookingService;
