//! Storage Config

use attempts_app::context::StorageBackend;
use clap::Args;

/// Event queue and token cache storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Storage backend (memory, postgres)
    #[arg(
        long,
        env = "ATTEMPTS_STORAGE_BACKEND",
        value_enum,
        default_value_t = StorageBackend::Postgres
    )]
    pub storage_backend: StorageBackend,

    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Apply pending migrations on startup.
    #[arg(long, env = "DATABASE_RUN_MIGRATIONS", default_value_t = false)]
    pub run_migrations: bool,
}
