//! # Simulated Gateways
//!
//! Mock transports standing in for IPFS, the carbon-token ledger, and
//! the verification pipeline. Every call is a cooperative suspension:
//! the caller awaits an artificial delay and receives a canned,
//! deterministic value. No cancellation, no retries.
//!
//! Failure injection: a gateway built `with_failure(marker)` fails any
//! call whose file name contains the marker, leaving the affected
//! entry in its error state exactly like a real transport outage.

use super::{GatewayError, LedgerGateway, ReviewGateway, StorageGateway};
use async_trait::async_trait;
use bluecarbon_core::{Address, CertificateId, Cid, ProjectId, ProjectMetadata, TxHash};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use time::OffsetDateTime;

// =============================================================================
// SIMULATED STORAGE
// =============================================================================

/// In-memory content-addressed storage with counter-derived CIDs.
pub struct SimulatedStorage {
    delay: Duration,
    counter: AtomicU64,
    objects: Mutex<BTreeMap<Cid, Vec<u8>>>,
    fail_marker: Option<String>,
}

impl SimulatedStorage {
    /// Create a storage simulation with the given per-call delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            counter: AtomicU64::new(0),
            objects: Mutex::new(BTreeMap::new()),
            fail_marker: None,
        }
    }

    /// Fail any `store` whose file name contains `marker`.
    #[must_use]
    pub fn with_failure(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    fn next_cid(&self) -> Cid {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        Cid::new(format!("Qm{:016x}", n))
    }
}

#[async_trait]
impl StorageGateway for SimulatedStorage {
    async fn store(&self, name: &str, bytes: &[u8]) -> Result<Cid, GatewayError> {
        tokio::time::sleep(self.delay).await;

        if let Some(marker) = &self.fail_marker {
            if name.contains(marker.as_str()) {
                return Err(GatewayError::Storage(format!(
                    "simulated upload failure for '{}'",
                    name
                )));
            }
        }

        let cid = self.next_cid();
        let mut objects = self
            .objects
            .lock()
            .map_err(|_| GatewayError::Storage("storage mutex poisoned".to_string()))?;
        objects.insert(cid.clone(), bytes.to_vec());
        tracing::debug!(name, cid = %cid, size = bytes.len(), "stored object");
        Ok(cid)
    }

    async fn fetch_metadata(&self, cid: &Cid) -> Result<Option<ProjectMetadata>, GatewayError> {
        tokio::time::sleep(self.delay).await;

        let objects = self
            .objects
            .lock()
            .map_err(|_| GatewayError::Storage("storage mutex poisoned".to_string()))?;
        let Some(bytes) = objects.get(cid) else {
            return Ok(None);
        };
        // Unparseable objects surface as missing, not as errors.
        Ok(serde_json::from_slice(bytes).ok())
    }
}

// =============================================================================
// SIMULATED LEDGER
// =============================================================================

/// Ledger simulation issuing sequential transaction hashes and
/// certificate ids.
pub struct SimulatedLedger {
    delay: Duration,
    counter: AtomicU64,
    fail_all: bool,
}

impl SimulatedLedger {
    /// Create a ledger simulation with the given per-call delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            counter: AtomicU64::new(0),
            fail_all: false,
        }
    }

    /// Fail every write. Used to exercise submission-failure paths.
    #[must_use]
    pub fn failing(delay: Duration) -> Self {
        Self {
            delay,
            counter: AtomicU64::new(0),
            fail_all: true,
        }
    }

    fn next_tx(&self) -> TxHash {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        TxHash::new(format!("0x{:016x}", n))
    }

    fn check(&self, what: &str) -> Result<(), GatewayError> {
        if self.fail_all {
            return Err(GatewayError::Ledger(format!(
                "simulated ledger failure during {}",
                what
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for SimulatedLedger {
    async fn register_project(&self, metadata_cid: &Cid) -> Result<TxHash, GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.check("registration")?;
        let tx = self.next_tx();
        tracing::debug!(metadata_cid = %metadata_cid, tx = tx.as_str(), "registered project");
        Ok(tx)
    }

    async fn purchase_credits(
        &self,
        project: ProjectId,
        amount: u64,
    ) -> Result<TxHash, GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.check("purchase")?;
        let tx = self.next_tx();
        tracing::debug!(%project, amount, tx = tx.as_str(), "purchased credits");
        Ok(tx)
    }

    async fn retire_credits(
        &self,
        amount: u64,
        retirement_cid: &Cid,
    ) -> Result<(TxHash, CertificateId), GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.check("retirement")?;
        let tx = self.next_tx();
        let n = self.counter.load(Ordering::Relaxed);
        let year = OffsetDateTime::now_utc().year();
        let certificate = CertificateId::new(format!("CERT-{}-{:03}", year, n));
        tracing::debug!(
            amount,
            retirement_cid = %retirement_cid,
            tx = tx.as_str(),
            "retired credits"
        );
        Ok((tx, certificate))
    }

    async fn token_balance(&self, account: &Address) -> Result<u64, GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.check("balance query")?;
        // Canned balance derived from the address so repeated queries
        // agree with each other.
        let sum: u64 = account.as_str().bytes().map(u64::from).sum();
        Ok(sum % 5000)
    }
}

// =============================================================================
// SIMULATED REVIEW PIPELINE
// =============================================================================

/// Verification trigger that always accepts.
pub struct SimulatedReviewPipeline {
    delay: Duration,
}

impl SimulatedReviewPipeline {
    /// Create a review-pipeline simulation with the given delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl ReviewGateway for SimulatedReviewPipeline {
    async fn trigger_verification(&self, project: ProjectId) -> Result<(), GatewayError> {
        tokio::time::sleep(self.delay).await;
        tracing::debug!(%project, "verification requested");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
