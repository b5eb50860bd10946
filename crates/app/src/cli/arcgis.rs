use std::time::Duration;

use attempts_app::domain::tokens::{
    TokenKeeperConfig,
    arcgis::ArcgisConfig,
    keeper::DEFAULT_PREFETCH_TTL_SECONDS,
    retry::RetryPolicy,
};
use clap::{Args, Subcommand};
use reqwest::Url;

use super::StorageArgs;

#[derive(Debug, Args)]
pub(crate) struct ArcgisCommand {
    #[command(subcommand)]
    command: ArcgisSubcommand,
}

#[derive(Debug, Subcommand)]
enum ArcgisSubcommand {
    Token(TokenArgs),
}

#[derive(Debug, Args)]
struct TokenArgs {
    #[command(flatten)]
    storage: StorageArgs,

    #[command(flatten)]
    arcgis: ArcgisArgs,

    /// Fetch a new token even when a usable one is cached
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct ArcgisArgs {
    /// ArcGIS generateToken endpoint
    #[arg(long, env = "ARCGIS_API_GENERATE_TOKEN_URL")]
    arcgis_generate_token_url: Url,

    #[arg(long, env = "ARCGIS_API_USERNAME")]
    arcgis_username: String,

    #[arg(long, env = "ARCGIS_API_PASSWORD", hide_env_values = true)]
    arcgis_password: String,

    /// Referer the token is bound to
    #[arg(long, env = "ARCGIS_API_REFERER", default_value = "localhost")]
    arcgis_referer: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "ARCGIS_API_REQUEST_TIMEOUT", default_value_t = 5.0)]
    arcgis_request_timeout: f64,

    #[arg(long, env = "ARCGIS_GET_TOKEN_RETRY_MAX", default_value_t = 3)]
    arcgis_retry_max: u32,

    /// Base retry interval in seconds
    #[arg(long, env = "ARCGIS_GET_TOKEN_RETRY_INTERVAL", default_value_t = 1.0)]
    arcgis_retry_interval: f64,

    #[arg(long, env = "ARCGIS_GET_TOKEN_RETRY_BACKOFF_FACTOR", default_value_t = 2.0)]
    arcgis_retry_backoff_factor: f64,

    #[arg(long, env = "ARCGIS_TOKEN_SYNC_REQUEST_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    arcgis_token_sync_request_enabled: bool,

    #[arg(long, env = "ARCGIS_TOKEN_SLIDING_EXPIRATION_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    arcgis_token_sliding_expiration_enabled: bool,

    /// Sliding window increment in seconds
    #[arg(long, env = "ARCGIS_TOKEN_PREFETCH_TTL", default_value_t = DEFAULT_PREFETCH_TTL_SECONDS)]
    arcgis_token_prefetch_ttl: f64,
}

impl ArcgisArgs {
    fn config(&self) -> Result<ArcgisConfig, String> {
        let seconds = |name: &str, value: f64| {
            Duration::try_from_secs_f64(value).map_err(|error| format!("invalid {name}: {error}"))
        };

        Ok(ArcgisConfig {
            generate_token_url: self.arcgis_generate_token_url.clone(),
            username: self.arcgis_username.clone(),
            password: self.arcgis_password.clone(),
            referer: self.arcgis_referer.clone(),
            request_timeout: seconds("request timeout", self.arcgis_request_timeout)?,
            retry: RetryPolicy {
                max_retries: self.arcgis_retry_max,
                interval: seconds("retry interval", self.arcgis_retry_interval)?,
                backoff_factor: self.arcgis_retry_backoff_factor,
                ..RetryPolicy::default()
            },
        })
    }

    fn keeper(&self) -> TokenKeeperConfig {
        TokenKeeperConfig {
            sync_request_enabled: self.arcgis_token_sync_request_enabled,
            sliding_expiration_enabled: self.arcgis_token_sliding_expiration_enabled,
            prefetch_ttl_seconds: self.arcgis_token_prefetch_ttl,
        }
    }
}

pub(crate) async fn run(command: ArcgisCommand) -> Result<(), String> {
    match command.command {
        ArcgisSubcommand::Token(args) => token(args).await,
    }
}

async fn token(args: TokenArgs) -> Result<(), String> {
    let ctx = args.storage.context().await?;

    let keeper = ctx
        .arcgis_token_keeper(args.arcgis.config()?, args.arcgis.keeper())
        .map_err(|error| format!("failed to build arcgis client: {error}"))?;

    let token = if args.force {
        Some(keeper.retrieve_token().await.map(|token| token.token))
    } else {
        keeper.token().await.transpose()
    };

    match token {
        Some(Ok(token)) => {
            println!("strategy: {}", keeper.strategy().name());
            println!("arcgis_token: {token}");

            Ok(())
        }
        Some(Err(error)) => Err(format!("failed to acquire token: {error}")),
        None => Err("no token cached and synchronous requests are disabled".to_string()),
    }
}
