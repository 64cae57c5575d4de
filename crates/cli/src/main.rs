//! Marketlink CLI - Gateway configuration and platform diagnostics.
//!
//! # Usage
//!
//! ```bash
//! # Print the authorization URL the gateway would redirect to
//! mlk-cli authorize-url
//!
//! # Try every catalog endpoint with a token and report each attempt
//! mlk-cli probe-catalog --token "$TOKEN" --vendor-id 42
//! ```
//!
//! # Commands
//!
//! - `authorize-url` - Check the OAuth client configuration
//! - `probe-catalog` - Run the catalog endpoint cascade against the platform

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mlk-cli")]
#[command(author, version, about = "Marketlink gateway CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the platform authorization URL for the configured client
    AuthorizeUrl,
    /// Probe the platform's catalog endpoints with an access token
    ProbeCatalog {
        /// Platform access token
        #[arg(short, long, env = "PLATFORM_ACCESS_TOKEN", hide_env_values = true)]
        token: String,

        /// Vendor ID for vendor-scoped endpoints
        #[arg(short, long)]
        vendor_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::AuthorizeUrl => commands::authorize::print_url()?,
        Commands::ProbeCatalog { token, vendor_id } => {
            commands::probe::probe_catalog(token, vendor_id).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_probe_catalog_args() {
        let cli = Cli::try_parse_from([
            "mlk-cli",
            "probe-catalog",
            "--token",
            "t",
            "--vendor-id",
            "7",
        ])
        .map_err(|e| e.to_string());

        match cli.map(|c| c.command) {
            Ok(Commands::ProbeCatalog { token, vendor_id }) => {
                assert_eq!(token, "t");
                assert_eq!(vendor_id.as_deref(), Some("7"));
            }
            _ => panic!("expected probe-catalog"),
        }
    }
}
