//! # Wizard & Market Orchestration
//!
//! The async glue between the pure core state machines and the gateway
//! transports: driving pending file uploads, submitting a finished
//! wizard, purchasing, and retiring credits.
//!
//! Every operation here follows the same error posture: a failed
//! gateway call is surfaced as a status flag on the affected entity or
//! an error in the response, never retried, and never fatal — the
//! state left behind is always consistent and continuable.

use crate::transport::Gateways;
use bluecarbon_core::{
    Address, Cid, EntryId, MarketError, ProjectId, ProjectStatus, Registry, RetirementRecord,
    Transaction, TxHash, Wizard,
};
use serde::Serialize;
use std::collections::BTreeMap;
use time::OffsetDateTime;
use time::format_description::well_known::Iso8601;
use tokio::sync::RwLock;

// =============================================================================
// DATES
// =============================================================================

/// Today's date as an ISO-8601 calendar date string.
#[must_use]
pub fn today() -> String {
    let now = OffsetDateTime::now_utc().date();
    now.format(&Iso8601::DATE)
        .unwrap_or_else(|_| now.to_string())
}

// =============================================================================
// WIZARD SESSION
// =============================================================================

/// A wizard plus the raw bytes of its selected files.
///
/// The core tracks entry metadata only; payload bytes wait here until
/// the upload transport consumes them.
#[derive(Default)]
pub struct WizardSession {
    /// The wizard state machine.
    pub wizard: Wizard,
    /// File payloads keyed by entry identity.
    pub payloads: BTreeMap<EntryId, Vec<u8>>,
}

impl WizardSession {
    /// Create a fresh session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            wizard: Wizard::new(),
            payloads: BTreeMap::new(),
        }
    }
}

// =============================================================================
// UPLOADS
// =============================================================================

/// Outcome of one entry's upload attempt.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    /// The entry that was attempted.
    pub entry_id: EntryId,
    /// The assigned identifier on success.
    pub cid: Option<Cid>,
    /// The failure message on error.
    pub error: Option<String>,
}

/// Upload every pending entry of the session, independently.
///
/// Each entry moves pending → uploading, awaits the storage gateway,
/// and lands in uploaded or error. One entry's failure never blocks
/// the rest, and after this resolves no entry remains pending.
pub async fn upload_pending(
    session: &mut WizardSession,
    gateways: &Gateways,
) -> Result<Vec<UploadOutcome>, MarketError> {
    let mut outcomes = Vec::new();

    for id in session.wizard.pending_ids() {
        session.wizard.begin_upload(id)?;

        let name = session
            .wizard
            .entries()
            .find(|e| e.id == id)
            .map(|e| e.name.clone())
            .unwrap_or_default();
        let bytes = session.payloads.get(&id).cloned().unwrap_or_default();

        match gateways.storage.store(&name, &bytes).await {
            Ok(cid) => {
                session.wizard.finish_upload(id, cid.clone())?;
                outcomes.push(UploadOutcome {
                    entry_id: id,
                    cid: Some(cid),
                    error: None,
                });
            }
            Err(err) => {
                tracing::warn!(entry = ?id, name, %err, "upload failed");
                session.wizard.fail_upload(id)?;
                outcomes.push(UploadOutcome {
                    entry_id: id,
                    cid: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    Ok(outcomes)
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Result of a submission attempt.
///
/// The wizard lands on the terminal step in both cases; `registered`
/// tells the user whether the ledger write went through.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    /// Whether the registration reached the registry.
    pub registered: bool,
    /// The new project, when registered.
    pub project_id: Option<ProjectId>,
    /// The ledger acknowledgment, when registered.
    pub tx_hash: Option<TxHash>,
    /// The metadata document identifier, once stored.
    pub metadata_cid: Option<Cid>,
    /// Failure message otherwise.
    pub error: Option<String>,
}

/// Submit a finished wizard: store the metadata document, write the
/// registration to the ledger, insert the project into the registry,
/// and ask the review pipeline for verification.
///
/// Already-uploaded files are never rolled back on failure, and the
/// wizard advances to the terminal step regardless of the outcome.
/// The registry lock is taken only for the in-memory insert, never
/// across a gateway call.
pub async fn submit(
    session: &mut WizardSession,
    registry: &RwLock<Registry>,
    gateways: &Gateways,
    owner: Address,
) -> Result<SubmissionOutcome, MarketError> {
    let metadata = session.wizard.finalize()?;

    let document = serde_json::to_vec(&metadata)
        .map_err(|e| MarketError::SerializationError(e.to_string()))?;
    let doc_name = format!("{}.metadata.json", metadata.name);

    let outcome = match gateways.storage.store(&doc_name, &document).await {
        Err(err) => {
            tracing::warn!(%err, "metadata upload failed; submission aborted");
            SubmissionOutcome {
                registered: false,
                project_id: None,
                tx_hash: None,
                metadata_cid: None,
                error: Some(err.to_string()),
            }
        }
        Ok(metadata_cid) => match gateways.ledger.register_project(&metadata_cid).await {
            Err(err) => {
                tracing::warn!(%err, "ledger registration failed");
                SubmissionOutcome {
                    registered: false,
                    project_id: None,
                    tx_hash: None,
                    metadata_cid: Some(metadata_cid),
                    error: Some(err.to_string()),
                }
            }
            Ok(tx_hash) => {
                let id = registry.write().await.register(
                    metadata,
                    owner,
                    metadata_cid.clone(),
                    tx_hash.clone(),
                    today(),
                );
                tracing::info!(project = %id, tx = tx_hash.as_str(), "project registered");

                // Review trigger failure is non-fatal: verifiers can
                // still find the project in their pending queue.
                if let Err(err) = gateways.review.trigger_verification(id).await {
                    tracing::warn!(project = %id, %err, "verification trigger failed");
                }

                SubmissionOutcome {
                    registered: true,
                    project_id: Some(id),
                    tx_hash: Some(tx_hash),
                    metadata_cid: Some(metadata_cid),
                    error: None,
                }
            }
        },
    };

    session.wizard.mark_submitted();
    Ok(outcome)
}

// =============================================================================
// MARKET OPERATIONS
// =============================================================================

/// Purchase credits: ledger write first, then registry bookkeeping.
pub async fn purchase(
    registry: &mut Registry,
    gateways: &Gateways,
    buyer: Address,
    project: ProjectId,
    amount: u64,
) -> Result<Transaction, MarketError> {
    // Validate against registry state before paying for a ledger write.
    let listing = registry
        .project(project)
        .ok_or(MarketError::ProjectNotFound(project))?;
    if amount == 0 {
        return Err(MarketError::ZeroAmount);
    }
    if listing.status != ProjectStatus::Issued {
        return Err(MarketError::InvalidStatus {
            id: project,
            status: listing.status,
            action: "purchase credits from",
        });
    }
    if amount > listing.available_credits {
        return Err(MarketError::InsufficientCredits {
            requested: amount,
            available: listing.available_credits,
        });
    }

    let tx_hash = gateways.ledger.purchase_credits(project, amount).await?;
    registry.purchase(project, amount, buyer, tx_hash, today())
}

/// Retire credits: store the reason document, write the retirement to
/// the ledger, then debit the balance and record the certificate.
pub async fn retire(
    registry: &mut Registry,
    gateways: &Gateways,
    account: Address,
    project: ProjectId,
    amount: u64,
    reason: &str,
) -> Result<RetirementRecord, MarketError> {
    let balance = registry.balance(&account);
    if amount == 0 {
        return Err(MarketError::ZeroAmount);
    }
    if amount > balance {
        return Err(MarketError::InsufficientBalance {
            requested: amount,
            balance,
        });
    }

    let document = serde_json::json!({
        "account": account.as_str(),
        "project_id": project,
        "amount": amount,
        "reason": reason,
    });
    let bytes = serde_json::to_vec(&document)
        .map_err(|e| MarketError::SerializationError(e.to_string()))?;
    let retirement_cid = gateways
        .storage
        .store("retirement.json", &bytes)
        .await?;

    let (tx_hash, certificate) = gateways
        .ledger
        .retire_credits(amount, &retirement_cid)
        .await?;
    registry.retire(account, project, amount, reason, certificate, tx_hash, today())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::sim::{SimulatedLedger, SimulatedStorage};
    use bluecarbon_core::{FileKind, FileSelection, UploadState, WizardStep, demo_registry};
    use std::sync::Arc;
    use std::time::Duration;

    fn gateways() -> Gateways {
        Gateways::simulated(0)
    }

    fn add_file(session: &mut WizardSession, name: &str, kind: FileKind) -> EntryId {
        let id = session.wizard.add_files(
            [FileSelection {
                name: name.to_string(),
                size_bytes: 3,
            }],
            kind,
        )[0];
        session.payloads.insert(id, b"abc".to_vec());
        id
    }

    #[tokio::test]
    async fn upload_pending_resolves_every_entry() {
        let mut session = WizardSession::new();
        add_file(&mut session, "north.jpg", FileKind::Evidence);
        add_file(&mut session, "south.jpg", FileKind::Evidence);

        let outcomes = upload_pending(&mut session, &gateways()).await.expect("upload");
        assert_eq!(outcomes.len(), 2);
        assert!(session.wizard.pending_ids().is_empty());
        assert!(session.wizard.uploads_complete());

        let cids = session.wizard.uploaded_cids(FileKind::Evidence);
        assert_eq!(cids.len(), 2);
        assert_ne!(cids[0], cids[1]);
    }

    #[tokio::test]
    async fn one_failure_never_blocks_the_rest() {
        let mut gateways = gateways();
        gateways.storage = Arc::new(
            SimulatedStorage::new(Duration::ZERO).with_failure("corrupt"),
        );

        let mut session = WizardSession::new();
        let bad = add_file(&mut session, "corrupt.jpg", FileKind::Evidence);
        let good = add_file(&mut session, "fine.jpg", FileKind::Evidence);

        let outcomes = upload_pending(&mut session, &gateways).await.expect("upload");
        assert_eq!(outcomes.len(), 2);
        assert!(session.wizard.pending_ids().is_empty());
        assert!(!session.wizard.uploads_complete());

        let states: BTreeMap<EntryId, UploadState> = session
            .wizard
            .entries()
            .map(|e| (e.id, e.state.clone()))
            .collect();
        assert_eq!(states[&bad], UploadState::Error);
        assert!(states[&good].is_uploaded());
    }

    #[tokio::test]
    async fn submit_registers_and_lands_on_terminal_step() {
        let gateways = gateways();
        let registry = RwLock::new(Registry::new());
        let mut session = WizardSession::new();
        session.wizard.draft_mut().name = "Reef Lagoon Restoration".to_string();

        add_file(&mut session, "site.jpg", FileKind::Evidence);
        upload_pending(&mut session, &gateways).await.expect("upload");

        let outcome = submit(
            &mut session,
            &registry,
            &gateways,
            Address::new("0x1234...5678"),
        )
        .await
        .expect("submit");

        assert!(outcome.registered);
        let id = outcome.project_id.expect("project id");
        let registry = registry.into_inner();
        assert_eq!(
            registry.project(id).expect("project").name,
            "Reef Lagoon Restoration"
        );
        assert!(session.wizard.is_submitted());
        assert_eq!(session.wizard.step(), WizardStep::Submit);

        // The stored metadata document reads back through the gateway.
        let cid = outcome.metadata_cid.expect("cid");
        let fetched = gateways
            .storage
            .fetch_metadata(&cid)
            .await
            .expect("fetch")
            .expect("metadata");
        assert_eq!(fetched.name, "Reef Lagoon Restoration");
    }

    #[tokio::test]
    async fn failed_ledger_still_reaches_terminal_step() {
        let mut gateways = gateways();
        gateways.ledger = Arc::new(SimulatedLedger::failing(Duration::ZERO));

        let registry = RwLock::new(Registry::new());
        let mut session = WizardSession::new();
        add_file(&mut session, "site.jpg", FileKind::Evidence);
        upload_pending(&mut session, &gateways).await.expect("upload");

        let outcome = submit(
            &mut session,
            &registry,
            &gateways,
            Address::new("0x1234...5678"),
        )
        .await
        .expect("submit");

        assert!(!outcome.registered);
        assert!(outcome.error.is_some());
        assert_eq!(registry.read().await.projects().count(), 0);
        // Optimistic terminal step: submission was attempted.
        assert!(session.wizard.is_submitted());
        assert_eq!(session.wizard.step(), WizardStep::Submit);
        // Uploaded files are not rolled back.
        assert!(session.wizard.uploads_complete());
    }

    #[tokio::test]
    async fn submit_requires_complete_uploads() {
        let gateways = gateways();
        let registry = RwLock::new(Registry::new());
        let mut session = WizardSession::new();

        let result = submit(
            &mut session,
            &registry,
            &gateways,
            Address::new("0x1"),
        )
        .await;
        assert!(matches!(result, Err(MarketError::UploadsIncomplete)));
        assert!(!session.wizard.is_submitted());
    }

    #[tokio::test]
    async fn purchase_and_retire_flow() {
        let gateways = gateways();
        let mut registry = demo_registry();
        let buyer = Address::new("0xAAAA...BBBB");

        let tx = purchase(&mut registry, &gateways, buyer.clone(), ProjectId(1), 200)
            .await
            .expect("purchase");
        assert_eq!(tx.amount, 200);
        assert_eq!(registry.balance(&buyer), 200);

        let record = retire(
            &mut registry,
            &gateways,
            buyer.clone(),
            ProjectId(1),
            50,
            "Annual offset program",
        )
        .await
        .expect("retire");
        assert_eq!(record.amount, 50);
        assert!(record.certificate.0.starts_with("CERT-"));
        assert_eq!(registry.balance(&buyer), 150);
    }

    #[tokio::test]
    async fn purchase_rejects_unissued_project_before_ledger_write() {
        let mut gateways = gateways();
        // A failing ledger proves the status check fires before any
        // ledger write is attempted.
        gateways.ledger = Arc::new(SimulatedLedger::failing(Duration::ZERO));
        let mut registry = demo_registry();
        let buyer = Address::new("0xAAAA...BBBB");

        // Project 4 is verified but its credits were never issued.
        let result = purchase(&mut registry, &gateways, buyer, ProjectId(4), 10).await;
        assert!(matches!(result, Err(MarketError::InvalidStatus { .. })));
    }

    #[tokio::test]
    async fn purchase_validates_before_ledger_write() {
        let gateways = gateways();
        let mut registry = demo_registry();
        let buyer = Address::new("0xAAAA...BBBB");

        let result = purchase(
            &mut registry,
            &gateways,
            buyer,
            ProjectId(1),
            u64::MAX,
        )
        .await;
        assert!(matches!(
            result,
            Err(MarketError::InsufficientCredits { .. })
        ));
    }
}
