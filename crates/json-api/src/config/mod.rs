//! Server configuration module

use std::time::Duration;

use attempts_app::{
    context::AppConfig,
    domain::{
        issuers::{ProvidersConfigError, records::ProvidersConfig},
        poll::{PollServiceError, data::BatchSize},
    },
};
use clap::Parser;
use thiserror::Error;

use crate::config::{
    attempts::AttemptsConfig,
    observability::{LoggingConfig, ObservabilityConfig},
    server::ServerRuntimeConfig,
    storage::StorageConfig,
};

pub(crate) mod attempts;
pub(crate) mod observability;
pub(crate) mod server;
pub(crate) mod storage;

/// Errors raised while turning raw settings into application config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid ATTEMPTS_API_PROVIDERS")]
    Providers(#[source] ProvidersConfigError),

    #[error("invalid ATTEMPTS_API_DEFAULT_BATCH_SIZE")]
    DefaultBatchSize(#[source] PollServiceError),
}

/// Attempts JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "attempts-json", about = "Attempts JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Event and token storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Attempts API settings.
    #[command(flatten)]
    pub attempts: AttemptsConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Build the application context configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the providers JSON or default batch size is
    /// invalid.
    pub fn app_config(&self) -> Result<AppConfig, ConfigError> {
        let providers =
            ProvidersConfig::from_json(&self.attempts.providers).map_err(ConfigError::Providers)?;

        let default_batch_size = BatchSize::new(self.attempts.default_batch_size)
            .map_err(ConfigError::DefaultBatchSize)?;

        Ok(AppConfig {
            storage: self.storage.storage_backend,
            database_url: self.storage.database_url.clone(),
            run_migrations: self.storage.run_migrations,
            providers,
            default_batch_size,
            event_ttl: Duration::from_secs(self.attempts.event_ttl_seconds),
        })
    }
}

#[cfg(test)]
mod tests {
    use attempts_app::context::StorageBackend;
    use testresult::TestResult;

    use super::*;

    fn parse(args: &[&str]) -> Result<ServerConfig, clap::Error> {
        ServerConfig::try_parse_from(std::iter::once("attempts-json").chain(args.iter().copied()))
    }

    #[test]
    fn builds_app_config_from_flags() -> TestResult {
        let config = parse(&[
            "--storage-backend",
            "memory",
            "--attempts-api-providers",
            r#"[{"issuer":"sp1","tokens":[]}]"#,
            "--attempts-api-default-batch-size",
            "25",
            "--attempts-api-event-ttl-seconds",
            "60",
        ])?;

        let app = config.app_config()?;

        assert_eq!(app.storage, StorageBackend::Memory);
        assert_eq!(app.default_batch_size.get(), 25);
        assert_eq!(app.event_ttl, Duration::from_secs(60));
        assert!(app.providers.provider("sp1").is_some());

        Ok(())
    }

    #[test]
    fn rejects_out_of_range_default_batch_size() -> TestResult {
        let config = parse(&["--attempts-api-default-batch-size", "0"])?;

        assert!(matches!(
            config.app_config(),
            Err(ConfigError::DefaultBatchSize(_))
        ));

        Ok(())
    }

    #[test]
    fn rejects_malformed_providers() -> TestResult {
        let config = parse(&["--attempts-api-providers", "{not json"])?;

        assert!(matches!(config.app_config(), Err(ConfigError::Providers(_))));

        Ok(())
    }
}
