//! App Context

use std::{fmt, sync::Arc, time::Duration};

use thiserror::Error;
use tracing::info;

use crate::{
    clock::{Clock, system_clock},
    domain::{
        events::{BucketEventQueue, EventQueue, EventQueueConfig},
        issuers::{ConfiguredIssuersService, IssuersService, records::ProvidersConfig},
        poll::{PollService, QueuePollService, data::BatchSize},
        tokens::{
            AuthenticatorError, TokenKeeper, TokenKeeperConfig,
            arcgis::{ArcgisAuthenticator, ArcgisConfig},
            cache::TokenCache,
        },
    },
    storage::{BucketStore, KeyValueStore, MemoryStore, PgStore, StorageError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingDatabaseUrl,

    #[error("failed to initialise storage")]
    Storage(#[source] StorageError),
}

/// Where queued events and cached tokens live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StorageBackend {
    /// Process-local, lost on restart.
    Memory,

    /// Shared `PostgreSQL` database.
    #[default]
    Postgres,
}

/// Settings needed to assemble an [`AppContext`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub database_url: Option<String>,

    /// Apply pending migrations while connecting.
    pub run_migrations: bool,

    pub providers: ProvidersConfig,
    pub default_batch_size: BatchSize,
    pub event_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageBackend::Memory,
            database_url: None,
            run_migrations: false,
            providers: ProvidersConfig::default(),
            default_batch_size: BatchSize::default(),
            event_ttl: EventQueueConfig::default().event_ttl,
        }
    }
}

/// Stores shared by the services.
#[derive(Clone)]
pub struct Stores {
    pub buckets: Arc<dyn BucketStore>,
    pub cache: Arc<dyn KeyValueStore>,
}

impl Stores {
    /// Connect to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error when the postgres backend has no URL, cannot be
    /// reached or fails to migrate.
    pub async fn connect(
        backend: StorageBackend,
        database_url: Option<&str>,
        run_migrations: bool,
    ) -> Result<Self, AppInitError> {
        match backend {
            StorageBackend::Memory => Ok(Self::memory(MemoryStore::new())),
            StorageBackend::Postgres => {
                let url = database_url.ok_or(AppInitError::MissingDatabaseUrl)?;

                let store = PgStore::connect(url)
                    .await
                    .map_err(AppInitError::Storage)?;

                if run_migrations {
                    store.migrate().await.map_err(AppInitError::Storage)?;

                    info!("applied storage migrations");
                }

                let store = Arc::new(store);

                Ok(Self {
                    buckets: store.clone(),
                    cache: store,
                })
            }
        }
    }

    #[must_use]
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);

        Self {
            buckets: store.clone(),
            cache: store,
        }
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct AppContext {
    pub events: Arc<dyn EventQueue>,
    pub poll: Arc<dyn PollService>,
    pub issuers: Arc<dyn IssuersService>,
    pub stores: Stores,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    /// Build application context from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when storage cannot be initialised.
    pub async fn from_config(config: AppConfig) -> Result<Self, AppInitError> {
        let stores = Stores::connect(
            config.storage,
            config.database_url.as_deref(),
            config.run_migrations,
        )
        .await?;

        Ok(Self::from_stores(stores, &config))
    }

    /// Build application context over existing stores.
    #[must_use]
    pub fn from_stores(stores: Stores, config: &AppConfig) -> Self {
        let events: Arc<dyn EventQueue> = Arc::new(BucketEventQueue::new(
            stores.buckets.clone(),
            EventQueueConfig {
                event_ttl: config.event_ttl,
            },
        ));

        Self {
            poll: Arc::new(QueuePollService::new(
                events.clone(),
                config.default_batch_size,
            )),
            issuers: Arc::new(ConfiguredIssuersService::new(config.providers.clone())),
            events,
            stores,
            clock: system_clock(),
        }
    }

    /// Token keeper for the ArcGIS API sharing this context's cache.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn arcgis_token_keeper(
        &self,
        arcgis: ArcgisConfig,
        keeper: TokenKeeperConfig,
    ) -> Result<TokenKeeper, AuthenticatorError> {
        let cache = TokenCache::new(
            self.stores.cache.clone(),
            arcgis.cache_key(),
            self.clock.clone(),
        );

        Ok(TokenKeeper::new(
            keeper.strategy(),
            Arc::new(ArcgisAuthenticator::new(arcgis)?),
            cache,
            self.clock.clone(),
        ))
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
