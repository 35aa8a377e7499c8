//! HAL Post - send a work log entry to the monitor server
//!
//! # Usage
//!
//! ```bash
//! # Token from the environment
//! AUTH_TOKEN=secret hal-post -m "Deployed the pod bay controller" -t "ops, deploy"
//!
//! # Explicit server and token
//! hal-post --addr hal.example:8080 --token secret -m "Rotated keys"
//!
//! # Verbose logging
//! RUST_LOG=debug hal-post -m "..."
//! ```

mod client;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use client::{resolve_token, send_update, Update};

/// HAL Post - send a work log entry to the monitor server
#[derive(Parser, Debug)]
#[command(name = "hal-post")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address (host:port, :port, or URL)
    #[arg(short = 'a', long, default_value = ":8080")]
    addr: String,

    /// Authentication token (falls back to AUTH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Message to send
    #[arg(short = 'm', long = "message", value_name = "TEXT", default_value = "")]
    message: String,

    /// Comma-separated tags
    #[arg(short = 't', long = "tags", value_name = "LIST")]
    tags: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("monitor_post=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let token = resolve_token(args.token, std::env::var("AUTH_TOKEN").ok())?;
    let update = Update::new(&args.message, args.tags.as_deref())?;

    let reply = send_update(&args.addr, &token, &update)
        .await
        .context("Failed to post update")?;

    tracing::info!(status = %reply.status, body = %reply.body.trim_end(), "Response");
    if !reply.status.is_success() {
        anyhow::bail!("server rejected the update: {}", reply.status);
    }
    Ok(())
}
