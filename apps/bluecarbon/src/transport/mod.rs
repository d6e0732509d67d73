//! # Gateway Transports
//!
//! The external collaborators of the registry, behind trait objects:
//! content-addressed storage, the ledger, and the verification
//! pipeline. Wizard and registry logic only ever sees these traits;
//! production deployments swap in real transports, tests and the demo
//! server use the simulations in [`sim`].

pub mod sim;

use async_trait::async_trait;
use bluecarbon_core::{Address, CertificateId, Cid, MarketError, ProjectId, ProjectMetadata, TxHash};
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// GATEWAY ERROR
// =============================================================================

/// A failed gateway call.
///
/// Gateways report failure as a unit the caller surfaces as a status
/// flag or notification; nothing is retried automatically and nothing
/// is fatal to the application.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The storage transport rejected or lost the object.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The ledger write was not acknowledged.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// The verification pipeline could not be reached.
    #[error("Verification error: {0}")]
    Verification(String),
}

impl From<GatewayError> for MarketError {
    fn from(err: GatewayError) -> Self {
        Self::GatewayError(err.to_string())
    }
}

// =============================================================================
// GATEWAY TRAITS
// =============================================================================

/// Content-addressed storage: accepts a file, returns its content
/// identifier; fetches parsed project metadata back by identifier.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Store a file and return its assigned content identifier.
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<Cid, GatewayError>;

    /// Fetch and parse a project metadata document by identifier.
    ///
    /// Returns `None` when the object is missing or unparseable; the
    /// dashboard shows a placeholder in that case.
    async fn fetch_metadata(&self, cid: &Cid) -> Result<Option<ProjectMetadata>, GatewayError>;
}

/// Ledger writes: registration, purchase, and retirement transactions
/// plus the token balance read.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Write a project registration referencing its metadata document.
    async fn register_project(&self, metadata_cid: &Cid) -> Result<TxHash, GatewayError>;

    /// Write a credit purchase.
    async fn purchase_credits(
        &self,
        project: ProjectId,
        amount: u64,
    ) -> Result<TxHash, GatewayError>;

    /// Write a credit retirement referencing its reason document.
    /// Returns the transaction and the issued certificate.
    async fn retire_credits(
        &self,
        amount: u64,
        retirement_cid: &Cid,
    ) -> Result<(TxHash, CertificateId), GatewayError>;

    /// On-chain token balance of an account.
    async fn token_balance(&self, account: &Address) -> Result<u64, GatewayError>;
}

/// The review pipeline trigger: notifies verifiers that a project is
/// ready for review. Stands in for a human or automated pipeline.
#[async_trait]
pub trait ReviewGateway: Send + Sync {
    /// Request verification of a registered project.
    async fn trigger_verification(&self, project: ProjectId) -> Result<(), GatewayError>;
}

// =============================================================================
// GATEWAY SET
// =============================================================================

/// The full set of injected transports, shared across handlers.
#[derive(Clone)]
pub struct Gateways {
    /// Content-addressed storage.
    pub storage: Arc<dyn StorageGateway>,
    /// Ledger writes.
    pub ledger: Arc<dyn LedgerGateway>,
    /// Verification pipeline trigger.
    pub review: Arc<dyn ReviewGateway>,
}

impl Gateways {
    /// Build the simulated gateway set with the given artificial delay
    /// in milliseconds (0 for tests).
    #[must_use]
    pub fn simulated(delay_ms: u64) -> Self {
        let delay = std::time::Duration::from_millis(delay_ms);
        Self {
            storage: Arc::new(sim::SimulatedStorage::new(delay)),
            ledger: Arc::new(sim::SimulatedLedger::new(delay)),
            review: Arc::new(sim::SimulatedReviewPipeline::new(delay)),
        }
    }
}
