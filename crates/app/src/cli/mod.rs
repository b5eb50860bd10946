use attempts_app::context::{AppConfig, AppContext, StorageBackend, Stores};
use clap::{Args, Parser, Subcommand};

mod arcgis;
mod db;
mod event;
mod issuer;

#[derive(Debug, Parser)]
#[command(name = "attempts-app", about = "Attempts API CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Issuer(issuer::IssuerCommand),
    Event(event::EventCommand),
    Arcgis(arcgis::ArcgisCommand),
    Db(db::DbCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Issuer(command) => issuer::run(command),
            Commands::Event(command) => event::run(command).await,
            Commands::Arcgis(command) => arcgis::run(command).await,
            Commands::Db(command) => db::run(command).await,
        }
    }
}

/// Storage selection shared by commands that touch the queue or cache.
#[derive(Debug, Args)]
pub(crate) struct StorageArgs {
    /// Storage backend
    #[arg(long, env = "ATTEMPTS_STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Postgres)]
    storage: StorageBackend,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,
}

impl StorageArgs {
    pub(crate) async fn context(&self) -> Result<AppContext, String> {
        let stores = Stores::connect(self.storage, self.database_url.as_deref(), false)
            .await
            .map_err(|error| format!("failed to open storage: {error}"))?;

        Ok(AppContext::from_stores(stores, &AppConfig::default()))
    }
}
