use std::process::ExitCode;

use anyhow::Context;
use casting_auth::{AuthPipeline, SigningKeyCache};
use casting_cli::commands;
use casting_config::AuthConfig;
use casting_core::permissions;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(name = "casting-cli")]
#[command(about = "Casting Agency CLI - Inspect signing keys and verify access tokens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the identity provider's key set and list the usable signing keys
    Keys,
    /// Run an access token through the full authorization pipeline
    Verify {
        /// The access token (without the "Bearer " prefix)
        #[arg(short = 't', long, env = "ACCESS_TOKEN")]
        token: String,

        /// Permission to require, e.g. "get:movies" (default: any valid token)
        #[arg(short = 'p', long, default_value = permissions::AUTHENTICATED)]
        permission: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    casting_observability::init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("\n❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = AuthConfig::from_env().context("Failed to load auth configuration")?;

    match cli.command {
        Commands::Keys => handle_keys(&config).await,
        Commands::Verify { token, permission } => handle_verify(&config, &token, &permission).await,
    }
}

async fn handle_keys(config: &AuthConfig) -> anyhow::Result<bool> {
    let cache = SigningKeyCache::from_config(config)?;

    match commands::keys(&cache).await {
        Ok(lines) => {
            println!("✅ {} usable signing keys at {}", lines.len(), config.jwks_url);
            for line in lines {
                println!("   {line}");
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("\n❌ Error fetching signing keys: {e}");
            Ok(false)
        }
    }
}

async fn handle_verify(config: &AuthConfig, token: &str, permission: &str) -> anyhow::Result<bool> {
    let pipeline = AuthPipeline::from_config(config)?;
    let outcome = commands::verify(&pipeline, token, permission).await;

    let rendered = serde_json::to_string_pretty(&outcome.body)?;
    if outcome.accepted {
        println!("{rendered}");
    } else {
        eprintln!("{rendered}");
    }

    Ok(outcome.accepted)
}
