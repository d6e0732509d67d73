//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Apart from `server`, every command builds the seeded demo registry
//! and the zero-delay simulated transports, runs one operation, and
//! prints the result. Nothing is persisted between invocations.

use crate::api;
use crate::config::ServerConfig;
use crate::orchestrator::{self, WizardSession};
use crate::transport::Gateways;
use bluecarbon_core::{
    Address, FileKind, FileSelection, MarketError, ProjectFilter, ProjectId, ProjectStatus,
    ProjectType, Registry, demo_registry,
};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a single evidence or metadata file (10 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_UPLOAD_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &PathBuf, max_size: u64) -> Result<(), MarketError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| MarketError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(MarketError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate file path for security.
///
/// This function:
/// 1. Canonicalizes the path to resolve symlinks and ".."
/// 2. Ensures the path exists
/// 3. Ensures the path is a file (not a directory)
///
/// # Security Note
///
/// This prevents path traversal attacks where a malicious path like
/// "../../../etc/passwd" could be used to access sensitive files.
fn validate_file_path(path: &Path) -> Result<PathBuf, MarketError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        MarketError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    // Ensure it's a file, not a directory
    if !canonical.is_file() {
        return Err(MarketError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// DEMO CONTEXT
// =============================================================================

/// The seeded demo registry plus zero-delay simulated transports.
fn demo_context() -> (Registry, Gateways) {
    (demo_registry(), Gateways::simulated(0))
}

fn print_project(project: &bluecarbon_core::Project) {
    println!(
        "{}  {:<32} {:<10} {:<10} {:>6} issued / {:>6} available",
        project.id,
        project.name,
        project.project_type.tag(),
        project.status.tag(),
        project.issued_credits,
        project.available_credits,
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<(), MarketError> {
    let mut config = match config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    let registry = if config.seed_demo {
        demo_registry()
    } else {
        Registry::new()
    };
    let gateways = Gateways::simulated(config.gateway_delay_ms);

    println!("BlueCarbon Marketplace Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:          {}", config.host);
    println!("  Port:          {}", config.port);
    println!("  Gateway delay: {} ms", config.gateway_delay_ms);
    println!("  Demo seed:     {}", config.seed_demo);
    println!();
    println!("Endpoints:");
    println!("  GET  /projects - Project explorer");
    println!("  POST /wizard   - Start a registration wizard");
    println!("  GET  /listings - Active credit listings");
    println!("  POST /purchase - Buy credits");
    println!("  POST /retire   - Retire credits");
    println!("  GET  /health   - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&config.bind_addr(), registry, gateways).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show registry status.
pub fn cmd_status(json_mode: bool) -> Result<(), MarketError> {
    let (registry, _) = demo_context();
    let stats = registry.stats();

    if json_mode {
        let output = serde_json::json!({
            "project_count": stats.project_count,
            "pending_reviews": stats.pending_reviews,
            "credits_issued": stats.credits_issued,
            "credits_retired": stats.credits_retired,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("BlueCarbon Registry Status");
    println!("==========================");
    println!();
    println!("Projects:        {}", stats.project_count);
    println!("Pending reviews: {}", stats.pending_reviews);
    println!("Credits issued:  {}", stats.credits_issued);
    println!("Credits retired: {}", stats.credits_retired);

    Ok(())
}

// =============================================================================
// PROJECTS COMMAND
// =============================================================================

/// Browse the project explorer.
pub fn cmd_projects(
    json_mode: bool,
    query: Option<String>,
    status: Option<String>,
    project_type: Option<String>,
) -> Result<(), MarketError> {
    let (registry, _) = demo_context();

    let mut filter = ProjectFilter::all();
    if let Some(query) = query {
        filter = filter.with_query(query);
    }
    if let Some(status) = status {
        filter = filter.with_status(ProjectStatus::from_str(&status)?);
    }
    if let Some(project_type) = project_type {
        filter = filter.with_type(ProjectType::from_str(&project_type)?);
    }

    let projects = filter.apply(registry.projects());

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&projects).unwrap_or_default()
        );
        return Ok(());
    }

    if projects.is_empty() {
        println!("No projects match the filter");
        return Ok(());
    }
    for project in projects {
        print_project(project);
    }

    Ok(())
}

// =============================================================================
// REGISTER COMMAND
// =============================================================================

/// Arguments of the register command.
pub struct RegisterArgs {
    pub name: String,
    pub description: String,
    pub location: String,
    pub area: u64,
    pub project_type: String,
    pub credits: u64,
    pub evidence: Vec<PathBuf>,
    pub metadata: Vec<PathBuf>,
}

/// Run the registration flow end to end: fill the draft, upload the
/// files, and submit.
pub async fn cmd_register(
    json_mode: bool,
    wallet: &str,
    args: RegisterArgs,
) -> Result<(), MarketError> {
    let (registry, gateways) = demo_context();
    let registry = tokio::sync::RwLock::new(registry);

    let mut session = WizardSession::new();
    {
        let draft = session.wizard.draft_mut();
        draft.name = args.name;
        draft.description = args.description;
        draft.location = args.location;
        draft.area_hectares = args.area;
        draft.project_type = ProjectType::from_str(&args.project_type)?;
        draft.estimated_credits = args.credits;
    }
    session.wizard.advance()?;

    for (paths, kind) in [
        (&args.evidence, FileKind::Evidence),
        (&args.metadata, FileKind::Metadata),
    ] {
        for path in paths {
            let validated = validate_file_path(path)?;
            validate_file_size(&validated, MAX_UPLOAD_FILE_SIZE)?;
            let bytes = std::fs::read(&validated)
                .map_err(|e| MarketError::IoError(format!("Read file: {}", e)))?;
            let name = validated
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| validated.display().to_string());
            let ids = session.wizard.add_files(
                [FileSelection {
                    name,
                    size_bytes: bytes.len() as u64,
                }],
                kind,
            );
            if let Some(id) = ids.first() {
                session.payloads.insert(*id, bytes);
            }
        }
    }

    let outcomes = orchestrator::upload_pending(&mut session, &gateways).await?;
    for outcome in &outcomes {
        if let Some(error) = &outcome.error {
            return Err(MarketError::GatewayError(format!(
                "Upload failed for entry {:?}: {}",
                outcome.entry_id, error
            )));
        }
    }
    session.wizard.advance()?;

    let outcome =
        orchestrator::submit(&mut session, &registry, &gateways, Address::new(wallet)).await?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&outcome).unwrap_or_default()
        );
        return Ok(());
    }

    if outcome.registered {
        println!("Project registered");
        if let Some(id) = outcome.project_id {
            println!("  Id:       {}", id);
        }
        if let Some(tx) = &outcome.tx_hash {
            println!("  Tx:       {}", tx.as_str());
        }
        if let Some(cid) = &outcome.metadata_cid {
            println!("  Metadata: {}", cid.as_str());
        }
        println!("  Files:    {} uploaded", outcomes.len());
    } else {
        println!(
            "Registration failed: {}",
            outcome.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }

    Ok(())
}

// =============================================================================
// REVIEW & ISSUE COMMANDS
// =============================================================================

/// Approve or reject a registered project.
pub fn cmd_review(
    json_mode: bool,
    id: u64,
    reject: bool,
    notes: Option<&str>,
) -> Result<(), MarketError> {
    let (mut registry, _) = demo_context();
    let id = ProjectId(id);

    if reject {
        registry.reject(id)?;
    } else {
        registry.approve(id, orchestrator::today())?;
    }
    if let Some(notes) = notes {
        tracing::info!(project = %id, notes, "review notes recorded");
    }

    let project = registry
        .project(id)
        .ok_or(MarketError::ProjectNotFound(id))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(project).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Project {} {}",
        id,
        if reject { "rejected" } else { "approved" }
    );
    print_project(project);

    Ok(())
}

/// Issue and list the credits of a verified project.
pub fn cmd_issue(json_mode: bool, id: u64, price: u64) -> Result<(), MarketError> {
    let (mut registry, _) = demo_context();
    let id = ProjectId(id);

    registry.issue(id, price, orchestrator::today())?;

    let project = registry
        .project(id)
        .ok_or(MarketError::ProjectNotFound(id))?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(project).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "Issued {} credits at {} tokens each",
        project.issued_credits, price
    );
    print_project(project);

    Ok(())
}

// =============================================================================
// MARKET COMMANDS
// =============================================================================

/// Show active credit listings.
pub fn cmd_listings(json_mode: bool) -> Result<(), MarketError> {
    let (registry, _) = demo_context();
    let listings = registry.listings();

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&listings).unwrap_or_default()
        );
        return Ok(());
    }

    if listings.is_empty() {
        println!("No active listings");
        return Ok(());
    }
    for listing in &listings {
        println!(
            "{}  {:<32} {:<10} {:>6} credits @ {:>4} tokens",
            listing.project_id,
            listing.project_name,
            listing.project_type.tag(),
            listing.available_credits,
            listing.price_per_credit,
        );
    }

    Ok(())
}

/// Purchase credits from a listing.
pub async fn cmd_buy(
    json_mode: bool,
    wallet: &str,
    id: u64,
    amount: u64,
) -> Result<(), MarketError> {
    let (mut registry, gateways) = demo_context();
    let buyer = Address::new(wallet);

    let tx = orchestrator::purchase(&mut registry, &gateways, buyer.clone(), ProjectId(id), amount)
        .await?;

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&tx).unwrap_or_default());
        return Ok(());
    }

    println!("Purchased {} credits from project {}", amount, tx.project_id);
    println!("  Tx:      {}", tx.tx_hash.as_str());
    println!("  Balance: {} credits", registry.balance(&buyer));

    Ok(())
}

/// Retire credits for an offset certificate.
pub async fn cmd_retire(
    json_mode: bool,
    wallet: &str,
    id: u64,
    amount: u64,
    reason: &str,
) -> Result<(), MarketError> {
    let (mut registry, gateways) = demo_context();
    let account = Address::new(wallet);

    let record = orchestrator::retire(
        &mut registry,
        &gateways,
        account.clone(),
        ProjectId(id),
        amount,
        reason,
    )
    .await?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&record).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Retired {} credits from project {}", amount, record.project_id);
    println!("  Certificate: {}", record.certificate.0);
    println!("  Tx:          {}", record.tx_hash.as_str());
    println!("  Balance:     {} credits", registry.balance(&account));

    Ok(())
}

/// Show the wallet's holdings and history.
pub async fn cmd_balance(json_mode: bool, wallet: &str) -> Result<(), MarketError> {
    let (registry, gateways) = demo_context();
    let account = Address::new(wallet);

    let token_balance = gateways
        .ledger
        .token_balance(&account)
        .await
        .map_err(MarketError::from)?;
    let credits = registry.balance(&account);
    let transactions = registry.transactions(&account);
    let retirements = registry.retirements(&account);

    if json_mode {
        let output = serde_json::json!({
            "account": account.as_str(),
            "credits": credits,
            "token_balance": token_balance,
            "transactions": transactions,
            "retirements": retirements,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Balance for {}", account.as_str());
    println!("=================================");
    println!();
    println!("Credits:       {}", credits);
    println!("Token balance: {}", token_balance);
    println!();
    if transactions.is_empty() {
        println!("No transactions");
    } else {
        println!("Transactions:");
        for tx in transactions {
            println!(
                "  {:?} {:>6} credits  project {}  {}",
                tx.kind, tx.amount, tx.project_id, tx.date
            );
        }
    }
    if !retirements.is_empty() {
        println!();
        println!("Retirements:");
        for record in retirements {
            println!(
                "  {:>6} credits  {}  {}",
                record.amount, record.certificate.0, record.date
            );
        }
    }

    Ok(())
}
