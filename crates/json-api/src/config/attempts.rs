//! Attempts API Config

use clap::Args;

/// Attempts API settings.
#[derive(Debug, Args)]
pub struct AttemptsConfig {
    /// Serve the poll endpoint; when off it answers 404.
    #[arg(
        long = "attempts-api-enabled",
        env = "ATTEMPTS_API_ENABLED",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub enabled: bool,

    /// JSON list of issuers and their request token digests.
    #[arg(
        long = "attempts-api-providers",
        env = "ATTEMPTS_API_PROVIDERS",
        default_value = "",
        hide_default_value = true
    )]
    pub providers: String,

    /// Events returned when a poll omits `maxEvents`.
    #[arg(
        long = "attempts-api-default-batch-size",
        env = "ATTEMPTS_API_DEFAULT_BATCH_SIZE",
        default_value_t = 1000
    )]
    pub default_batch_size: i64,

    /// Lifetime of an hourly event bucket after its last write.
    #[arg(
        long = "attempts-api-event-ttl-seconds",
        env = "ATTEMPTS_API_EVENT_TTL_SECONDS",
        default_value_t = 3600
    )]
    pub event_ttl_seconds: u64,
}
