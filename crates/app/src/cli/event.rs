use attempts_app::domain::events::records::IssuerId;
use clap::{Args, Subcommand};
use jiff::Timestamp;
use uuid::Uuid;

use super::StorageArgs;

#[derive(Debug, Args)]
pub(crate) struct EventCommand {
    #[command(subcommand)]
    command: EventSubcommand,
}

#[derive(Debug, Subcommand)]
enum EventSubcommand {
    Write(WriteEventArgs),
}

#[derive(Debug, Args)]
struct WriteEventArgs {
    #[command(flatten)]
    storage: StorageArgs,

    /// Issuer whose queue receives the event
    #[arg(long)]
    issuer: String,

    /// Serialized security event token
    #[arg(long)]
    payload: String,

    /// Optional event key; a UUID v7 when omitted
    #[arg(long)]
    event_key: Option<String>,

    /// Optional enqueue timestamp (RFC 3339); now when omitted
    #[arg(long)]
    timestamp: Option<Timestamp>,
}

pub(crate) async fn run(command: EventCommand) -> Result<(), String> {
    match command.command {
        EventSubcommand::Write(args) => write(args).await,
    }
}

async fn write(args: WriteEventArgs) -> Result<(), String> {
    let ctx = args.storage.context().await?;
    let issuer = IssuerId::new(args.issuer);
    let event_key = args
        .event_key
        .unwrap_or_else(|| Uuid::now_v7().simple().to_string());

    ctx.events
        .write_event(
            &issuer,
            &event_key,
            &args.payload,
            args.timestamp.unwrap_or_else(Timestamp::now),
        )
        .await
        .map_err(|error| format!("failed to write event: {error}"))?;

    println!("issuer: {issuer}");
    println!("event_key: {event_key}");

    Ok(())
}
