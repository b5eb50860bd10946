use attempts_app::domain::{
    events::records::IssuerId,
    issuers::{digest::DEFAULT_SCRYPT_COST, issue_request_token},
};
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub(crate) struct IssuerCommand {
    #[command(subcommand)]
    command: IssuerSubcommand,
}

#[derive(Debug, Subcommand)]
enum IssuerSubcommand {
    Token(TokenArgs),
}

#[derive(Debug, Args)]
struct TokenArgs {
    /// Issuer the token authenticates
    #[arg(long)]
    issuer: String,

    /// Optional raw token; generated when omitted
    #[arg(long)]
    token: Option<String>,

    /// Scrypt cost in N$r$p$ form
    #[arg(long, default_value = DEFAULT_SCRYPT_COST)]
    cost: String,
}

pub(crate) fn run(command: IssuerCommand) -> Result<(), String> {
    match command.command {
        IssuerSubcommand::Token(args) => token(args),
    }
}

fn token(args: TokenArgs) -> Result<(), String> {
    if args.issuer.trim().is_empty() {
        return Err("issuer cannot be empty".to_string());
    }

    if args.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
        return Err("token cannot be empty".to_string());
    }

    let issued = issue_request_token(IssuerId::new(args.issuer), args.token, &args.cost)
        .map_err(|error| format!("failed to issue token: {error}"))?;

    let entry = serde_json::to_string_pretty(issued.provider())
        .map_err(|error| format!("failed to encode provider entry: {error}"))?;

    println!("issuer: {}", issued.provider().issuer);
    println!("request_token: {}", issued.token());
    println!("provider_entry: {entry}");
    println!("store this token now; only its digest belongs in ATTEMPTS_API_PROVIDERS");

    Ok(())
}
