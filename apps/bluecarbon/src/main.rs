//! # BlueCarbon - Blue Carbon Credit Marketplace
//!
//! The main binary for the BlueCarbon registry and marketplace.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for registry and marketplace operations
//! - Simulated storage, ledger, and verification transports
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  apps/bluecarbon (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐    │
//! │  │   CLI       │    │   HTTP API  │    │   Transports     │    │
//! │  │  (clap)     │    │   (axum)    │    │  (sim gateways)  │    │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘    │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                  ┌──────────────────┐                           │
//! │                  │ bluecarbon-core  │                           │
//! │                  │   (THE LOGIC)    │                           │
//! │                  └──────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! bluecarbon server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! bluecarbon projects --status issued
//! bluecarbon register -n "Reef Lagoon" -t mangrove -e site.jpg
//! bluecarbon buy 1 --amount 100
//! ```

use bluecarbon::cli;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — BLUECARBON_LOG_FORMAT=json enables machine-parseable output.
    let log_format =
        std::env::var("BLUECARBON_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bluecarbon=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the BlueCarbon startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ██╗     ██╗   ██╗███████╗ ██████╗ █████╗ ██████╗ ██████╗  ██████╗ ███╗   ██╗
  ██╔══██╗██║     ██║   ██║██╔════╝██╔════╝██╔══██╗██╔══██╗██╔══██╗██╔═══██╗████╗  ██║
  ██████╔╝██║     ██║   ██║█████╗  ██║     ███████║██████╔╝██████╔╝██║   ██║██╔██╗ ██║
  ██╔══██╗██║     ██║   ██║██╔══╝  ██║     ██╔══██║██╔══██╗██╔══██╗██║   ██║██║╚██╗██║
  ██████╔╝███████╗╚██████╔╝███████╗╚██████╗██║  ██║██║  ██║██████╔╝╚██████╔╝██║ ╚████║
  ╚═════╝ ╚══════╝ ╚═════╝ ╚══════╝ ╚═════╝╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝  ╚═════╝ ╚═╝  ╚═══╝

  Blue Carbon Credit Marketplace v{}

  Register • Verify • Trade • Retire
"#,
        env!("CARGO_PKG_VERSION")
    );
}
