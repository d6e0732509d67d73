//! # BlueCarbon CLI Module
//!
//! This module implements the CLI interface for BlueCarbon.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `status` - Show registry status
//! - `projects` - Browse the project explorer
//! - `register` - Run the registration flow end to end
//! - `review` - Approve or reject a registered project
//! - `issue` - Issue and list the credits of a verified project
//! - `listings` - Show active credit listings
//! - `buy` - Purchase credits from a listing
//! - `retire` - Retire credits for a certificate
//! - `balance` - Show the wallet's holdings and history
//!
//! Every command except `server` runs against the seeded demo registry
//! and the simulated transports; there is no persistence.

mod commands;

use bluecarbon_core::MarketError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// BlueCarbon - Blue Carbon Credit Marketplace
///
/// A registry and marketplace for coastal carbon projects: register,
/// verify, issue, trade, and retire blue carbon credits.
#[derive(Parser, Debug)]
#[command(name = "bluecarbon")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Wallet address acting as the caller
    #[arg(short = 'w', long, global = true, default_value = "0x9876...4321")]
    pub wallet: String,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show registry status
    Status,

    /// Browse projects
    Projects {
        /// Free-text search over name, location, and description
        #[arg(short = 'Q', long)]
        query: Option<String>,

        /// Filter by status (registered, verified, rejected, issued, retired)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by type (mangrove, seagrass, saltmarsh, kelp)
        #[arg(short = 't', long = "type")]
        project_type: Option<String>,
    },

    /// Register a new project (runs the full wizard flow)
    Register {
        /// Project name
        #[arg(short, long)]
        name: String,

        /// Project description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Project location
        #[arg(short, long, default_value = "")]
        location: String,

        /// Area in hectares
        #[arg(short, long, default_value = "0")]
        area: u64,

        /// Project type (mangrove, seagrass, saltmarsh, kelp)
        #[arg(short = 't', long = "type", default_value = "mangrove")]
        project_type: String,

        /// Estimated credits
        #[arg(short = 'c', long, default_value = "0")]
        credits: u64,

        /// Evidence files to upload
        #[arg(short, long)]
        evidence: Vec<PathBuf>,

        /// Supporting metadata files to upload
        #[arg(short, long)]
        metadata: Vec<PathBuf>,
    },

    /// Review a registered project
    Review {
        /// Project id
        id: u64,

        /// Reject instead of approve
        #[arg(short, long)]
        reject: bool,

        /// Review notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Issue and list the credits of a verified project
    Issue {
        /// Project id
        id: u64,

        /// Listing price in whole tokens per credit
        #[arg(short, long)]
        price: u64,
    },

    /// Show active credit listings
    Listings,

    /// Purchase credits from a listing
    Buy {
        /// Project id
        id: u64,

        /// Credits to purchase
        #[arg(short, long)]
        amount: u64,
    },

    /// Retire credits for an offset certificate
    Retire {
        /// Project id
        id: u64,

        /// Credits to retire
        #[arg(short, long)]
        amount: u64,

        /// Retirement reason
        #[arg(short, long, default_value = "Voluntary offset")]
        reason: String,
    },

    /// Show the wallet's holdings and history
    Balance,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), MarketError> {
    let json_mode = cli.json_mode;
    let wallet = cli.wallet.as_str();

    match cli.command {
        Some(Commands::Server { host, port, config }) => {
            cmd_server(host, port, config.as_deref()).await
        }
        Some(Commands::Status) => cmd_status(json_mode),
        Some(Commands::Projects {
            query,
            status,
            project_type,
        }) => cmd_projects(json_mode, query, status, project_type),
        Some(Commands::Register {
            name,
            description,
            location,
            area,
            project_type,
            credits,
            evidence,
            metadata,
        }) => {
            cmd_register(
                json_mode,
                wallet,
                RegisterArgs {
                    name,
                    description,
                    location,
                    area,
                    project_type,
                    credits,
                    evidence,
                    metadata,
                },
            )
            .await
        }
        Some(Commands::Review { id, reject, notes }) => {
            cmd_review(json_mode, id, reject, notes.as_deref())
        }
        Some(Commands::Issue { id, price }) => cmd_issue(json_mode, id, price),
        Some(Commands::Listings) => cmd_listings(json_mode),
        Some(Commands::Buy { id, amount }) => cmd_buy(json_mode, wallet, id, amount).await,
        Some(Commands::Retire { id, amount, reason }) => {
            cmd_retire(json_mode, wallet, id, amount, &reason).await
        }
        Some(Commands::Balance) => cmd_balance(json_mode, wallet).await,
        None => {
            // No subcommand - show status by default
            cmd_status(json_mode)
        }
    }
}
