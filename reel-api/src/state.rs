use std::sync::Arc;

use anyhow::Context;
use reel_catalog::{CatalogSeed, InMemoryCatalog};
use reel_ledger::{BookingService, MemoryLedger};
use reel_shared::BookingEvent;
use reel_store::app_config::{Config, StorageBackend};
use reel_store::{DbClient, PgCatalogRepository, PgLedgerRepository};
use tokio::sync::broadcast;
use tracing::info;

const EVENT_BUFFER: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BookingService>,
    pub events: broadcast::Sender<BookingEvent>,
}

impl AppState {
    /// Wires the configured storage backend into a booking service. The
    /// returned database handle, if any, must be closed at shutdown.
    pub async fn from_config(config: &Config) -> anyhow::Result<(Self, Option<DbClient>)> {
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let (service, db) = match config.storage.backend {
            StorageBackend::Memory => {
                let seed = CatalogSeed::from_file(&config.catalog.seed_file)
                    .with_context(|| format!("Failed to load catalog seed {}", config.catalog.seed_file.display()))?;
                let catalog = InMemoryCatalog::from_seed(seed)?;
                let ledger = MemoryLedger::from_catalog(&catalog).with_read_wait(config.booking.lock_wait());
                info!("Using in-memory ledger");
                (BookingService::new(Arc::new(catalog), Arc::new(ledger)), None)
            }
            StorageBackend::Postgres => {
                let db = DbClient::new(&config.database)
                    .await
                    .context("Failed to connect to Postgres")?;
                db.migrate().await?;
                info!("Using Postgres ledger");
                let service = BookingService::new(
                    Arc::new(PgCatalogRepository::new(db.pool.clone())),
                    Arc::new(PgLedgerRepository::new(db.pool.clone())),
                );
                (service, Some(db))
            }
        };

        let service = service
            .with_policy(config.booking.policy())
            .with_lock_wait(config.booking.lock_wait())
            .with_events(events.clone());

        Ok((
            Self {
                service: Arc::new(service),
                events,
            },
            db,
        ))
    }
}
