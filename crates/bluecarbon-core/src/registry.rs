//! # Project Registry
//!
//! The in-memory marketplace state behind the dashboard screens:
//! registered projects, verifier review decisions, credit issuance,
//! purchases, retirements, and account balances.
//!
//! All mutations follow the fixed project lifecycle
//! (registered → verified → issued, or registered → rejected) and all
//! credit arithmetic is saturating integer arithmetic. Collections are
//! `BTreeMap` keyed by stable identifiers for deterministic iteration.

use crate::types::{
    Address, CertificateId, Cid, MarketError, ProjectId, ProjectMetadata, ProjectStatus,
    ProjectType, TxHash,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PROJECT
// =============================================================================

/// A registered blue carbon project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Registry identifier.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Wallet address of the project owner.
    pub owner: Address,
    /// Ecosystem type.
    pub project_type: ProjectType,
    /// Geographic location.
    pub location: String,
    /// Project area in hectares.
    pub area_hectares: u64,
    /// Estimated credits over the project lifetime.
    pub estimated_credits: u64,
    /// Credits issued so far (0 until issuance).
    pub issued_credits: u64,
    /// Credits retired so far.
    pub retired_credits: u64,
    /// Credits currently available for purchase.
    pub available_credits: u64,
    /// Listing price in whole tokens per credit, set at issuance.
    pub price_per_credit: Option<u64>,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// ISO-8601 registration date.
    pub registered_at: String,
    /// ISO-8601 verification date, once reviewed.
    pub verified_at: Option<String>,
    /// ISO-8601 issuance date, once issued.
    pub issued_at: Option<String>,
    /// Content identifier of the project metadata document.
    pub metadata_cid: Cid,
    /// Content identifiers of the uploaded evidence files.
    pub evidence_files: Vec<Cid>,
    /// Ledger acknowledgment of the registration write.
    pub tx_hash: TxHash,
}

// =============================================================================
// MARKET RECORDS
// =============================================================================

/// A project's credits as listed on the buyer screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditListing {
    /// The listed project.
    pub project_id: ProjectId,
    /// Project name.
    pub project_name: String,
    /// Owner wallet address.
    pub project_owner: Address,
    /// Ecosystem type.
    pub project_type: ProjectType,
    /// Geographic location.
    pub location: String,
    /// Price in whole tokens per credit.
    pub price_per_credit: u64,
    /// Credits still available.
    pub available_credits: u64,
    /// Total credits issued.
    pub total_credits: u64,
    /// ISO-8601 verification date.
    pub verification_date: Option<String>,
}

/// Kind of a ledger-visible marketplace transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credits purchased from a listing.
    Purchase,
    /// Credits retired from a balance.
    Retirement,
}

/// One completed marketplace transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequential transaction identifier.
    pub id: u64,
    /// Purchase or retirement.
    pub kind: TransactionKind,
    /// The account that acted.
    pub account: Address,
    /// The project involved.
    pub project_id: ProjectId,
    /// Credit amount.
    pub amount: u64,
    /// Ledger acknowledgment.
    pub tx_hash: TxHash,
    /// ISO-8601 date.
    pub date: String,
}

/// A retirement with its issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementRecord {
    /// Sequential retirement identifier.
    pub id: u64,
    /// The retiring account.
    pub account: Address,
    /// The project the credits came from.
    pub project_id: ProjectId,
    /// Credits retired.
    pub amount: u64,
    /// User-supplied retirement reason.
    pub reason: String,
    /// Issued certificate.
    pub certificate: CertificateId,
    /// Ledger acknowledgment.
    pub tx_hash: TxHash,
    /// ISO-8601 date.
    pub date: String,
}

/// Aggregate registry counters for the status screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistryStats {
    /// Total registered projects (all statuses).
    pub project_count: usize,
    /// Projects awaiting verifier review.
    pub pending_reviews: usize,
    /// Total credits issued across all projects.
    pub credits_issued: u64,
    /// Total credits retired across all projects.
    pub credits_retired: u64,
}

// =============================================================================
// REGISTRY
// =============================================================================

/// The in-memory project registry and credit ledger view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    projects: BTreeMap<ProjectId, Project>,
    balances: BTreeMap<Address, u64>,
    transactions: Vec<Transaction>,
    retirements: Vec<RetirementRecord>,
    next_project: u64,
    next_transaction: u64,
    next_retirement: u64,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // REGISTRATION
    // -------------------------------------------------------------------------

    /// Register a submitted project. It enters the `Registered` status
    /// and awaits verifier review.
    pub fn register(
        &mut self,
        metadata: ProjectMetadata,
        owner: Address,
        metadata_cid: Cid,
        tx_hash: TxHash,
        date: impl Into<String>,
    ) -> ProjectId {
        self.next_project = self.next_project.saturating_add(1);
        let id = ProjectId(self.next_project);
        self.projects.insert(
            id,
            Project {
                id,
                name: metadata.name,
                description: metadata.description,
                owner,
                project_type: metadata.project_type,
                location: metadata.location,
                area_hectares: metadata.area_hectares,
                estimated_credits: metadata.estimated_credits,
                issued_credits: 0,
                retired_credits: 0,
                available_credits: 0,
                price_per_credit: None,
                status: ProjectStatus::Registered,
                registered_at: date.into(),
                verified_at: None,
                issued_at: None,
                metadata_cid,
                evidence_files: metadata.evidence_files,
                tx_hash,
            },
        );
        id
    }

    // -------------------------------------------------------------------------
    // LOOKUP
    // -------------------------------------------------------------------------

    /// Look up one project.
    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get(&id)
    }

    /// All projects in id order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Projects awaiting verifier review, in id order.
    pub fn pending_reviews(&self) -> impl Iterator<Item = &Project> {
        self.projects
            .values()
            .filter(|p| p.status == ProjectStatus::Registered)
    }

    // -------------------------------------------------------------------------
    // REVIEW
    // -------------------------------------------------------------------------

    /// Approve a project under review.
    pub fn approve(&mut self, id: ProjectId, date: impl Into<String>) -> Result<(), MarketError> {
        let project = self.project_mut(id)?;
        if project.status != ProjectStatus::Registered {
            return Err(MarketError::InvalidStatus {
                id,
                status: project.status,
                action: "approve",
            });
        }
        project.status = ProjectStatus::Verified;
        project.verified_at = Some(date.into());
        Ok(())
    }

    /// Reject a project under review. Terminal.
    pub fn reject(&mut self, id: ProjectId) -> Result<(), MarketError> {
        let project = self.project_mut(id)?;
        if project.status != ProjectStatus::Registered {
            return Err(MarketError::InvalidStatus {
                id,
                status: project.status,
                action: "reject",
            });
        }
        project.status = ProjectStatus::Rejected;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // ISSUANCE
    // -------------------------------------------------------------------------

    /// Issue the estimated credits of a verified project and list them
    /// at the given price.
    pub fn issue(
        &mut self,
        id: ProjectId,
        price_per_credit: u64,
        date: impl Into<String>,
    ) -> Result<(), MarketError> {
        let project = self.project_mut(id)?;
        if project.status != ProjectStatus::Verified {
            return Err(MarketError::InvalidStatus {
                id,
                status: project.status,
                action: "issue credits for",
            });
        }
        project.status = ProjectStatus::Issued;
        project.issued_credits = project.estimated_credits;
        project.available_credits = project.estimated_credits;
        project.price_per_credit = Some(price_per_credit);
        project.issued_at = Some(date.into());
        Ok(())
    }

    // -------------------------------------------------------------------------
    // MARKET
    // -------------------------------------------------------------------------

    /// Listings the buyer screen shows: issued projects with credits
    /// still available.
    #[must_use]
    pub fn listings(&self) -> Vec<CreditListing> {
        self.projects
            .values()
            .filter(|p| p.status == ProjectStatus::Issued && p.available_credits > 0)
            .map(|p| CreditListing {
                project_id: p.id,
                project_name: p.name.clone(),
                project_owner: p.owner.clone(),
                project_type: p.project_type,
                location: p.location.clone(),
                price_per_credit: p.price_per_credit.unwrap_or_default(),
                available_credits: p.available_credits,
                total_credits: p.issued_credits,
                verification_date: p.verified_at.clone(),
            })
            .collect()
    }

    /// Purchase credits from an issued project, crediting the buyer's
    /// balance and recording a completed transaction.
    pub fn purchase(
        &mut self,
        id: ProjectId,
        amount: u64,
        buyer: Address,
        tx_hash: TxHash,
        date: impl Into<String>,
    ) -> Result<Transaction, MarketError> {
        if amount == 0 {
            return Err(MarketError::ZeroAmount);
        }
        let project = self.project_mut(id)?;
        if project.status != ProjectStatus::Issued {
            return Err(MarketError::InvalidStatus {
                id,
                status: project.status,
                action: "purchase credits from",
            });
        }
        if amount > project.available_credits {
            return Err(MarketError::InsufficientCredits {
                requested: amount,
                available: project.available_credits,
            });
        }
        project.available_credits = project.available_credits.saturating_sub(amount);

        let balance = self.balances.entry(buyer.clone()).or_default();
        *balance = balance.saturating_add(amount);

        Ok(self.record_transaction(TransactionKind::Purchase, buyer, id, amount, tx_hash, date))
    }

    /// Retire credits from an account's balance against a project,
    /// recording the certificate issued for the retirement.
    pub fn retire(
        &mut self,
        account: Address,
        id: ProjectId,
        amount: u64,
        reason: impl Into<String>,
        certificate: CertificateId,
        tx_hash: TxHash,
        date: impl Into<String>,
    ) -> Result<RetirementRecord, MarketError> {
        if amount == 0 {
            return Err(MarketError::ZeroAmount);
        }
        let balance = self.balances.get(&account).copied().unwrap_or_default();
        if amount > balance {
            return Err(MarketError::InsufficientBalance {
                requested: amount,
                balance,
            });
        }

        let project = self.project_mut(id)?;
        project.retired_credits = project.retired_credits.saturating_add(amount);
        if project.issued_credits > 0 && project.retired_credits >= project.issued_credits {
            project.status = ProjectStatus::Retired;
        }

        self.balances
            .insert(account.clone(), balance.saturating_sub(amount));

        let date = date.into();
        self.record_transaction(
            TransactionKind::Retirement,
            account.clone(),
            id,
            amount,
            tx_hash.clone(),
            date.clone(),
        );

        self.next_retirement = self.next_retirement.saturating_add(1);
        let record = RetirementRecord {
            id: self.next_retirement,
            account,
            project_id: id,
            amount,
            reason: reason.into(),
            certificate,
            tx_hash,
            date,
        };
        self.retirements.push(record.clone());
        Ok(record)
    }

    /// Credit balance of an account (0 for unknown accounts).
    #[must_use]
    pub fn balance(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Directly credit an account. Used by seeding.
    pub fn credit_balance(&mut self, account: Address, amount: u64) {
        let balance = self.balances.entry(account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Transactions of one account, newest last.
    #[must_use]
    pub fn transactions(&self, account: &Address) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| &t.account == account)
            .collect()
    }

    /// Retirement records of one account, newest last.
    #[must_use]
    pub fn retirements(&self, account: &Address) -> Vec<&RetirementRecord> {
        self.retirements
            .iter()
            .filter(|r| &r.account == account)
            .collect()
    }

    // -------------------------------------------------------------------------
    // STATS
    // -------------------------------------------------------------------------

    /// Aggregate counters for the status screen.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats {
            project_count: self.projects.len(),
            ..RegistryStats::default()
        };
        for project in self.projects.values() {
            if project.status == ProjectStatus::Registered {
                stats.pending_reviews += 1;
            }
            stats.credits_issued = stats.credits_issued.saturating_add(project.issued_credits);
            stats.credits_retired = stats
                .credits_retired
                .saturating_add(project.retired_credits);
        }
        stats
    }

    // -------------------------------------------------------------------------
    // INTERNAL
    // -------------------------------------------------------------------------

    fn project_mut(&mut self, id: ProjectId) -> Result<&mut Project, MarketError> {
        self.projects
            .get_mut(&id)
            .ok_or(MarketError::ProjectNotFound(id))
    }

    fn record_transaction(
        &mut self,
        kind: TransactionKind,
        account: Address,
        project_id: ProjectId,
        amount: u64,
        tx_hash: TxHash,
        date: impl Into<String>,
    ) -> Transaction {
        self.next_transaction = self.next_transaction.saturating_add(1);
        let transaction = Transaction {
            id: self.next_transaction,
            kind,
            account,
            project_id,
            amount,
            tx_hash,
            date: date.into(),
        };
        self.transactions.push(transaction.clone());
        transaction
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectType;

    fn metadata(name: &str, credits: u64) -> ProjectMetadata {
        ProjectMetadata {
            name: name.to_string(),
            description: "test project".to_string(),
            location: "Florida Keys, USA".to_string(),
            area_hectares: 150,
            project_type: ProjectType::Mangrove,
            estimated_credits: credits,
            start_date: "2026-01-01".to_string(),
            end_date: "2030-12-31".to_string(),
            evidence_files: vec![Cid::new("Qm01")],
            metadata_files: vec![Cid::new("Qm02")],
        }
    }

    fn owner() -> Address {
        Address::new("0x1234...5678")
    }

    fn register_one(registry: &mut Registry, credits: u64) -> ProjectId {
        registry.register(
            metadata("Mangrove Restoration Initiative", credits),
            owner(),
            Cid::new("QmMeta"),
            TxHash::new("0xabc"),
            "2026-08-01",
        )
    }

    #[test]
    fn register_enters_review_queue() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 2500);

        let project = registry.project(id).expect("project");
        assert_eq!(project.status, ProjectStatus::Registered);
        assert_eq!(project.issued_credits, 0);
        assert_eq!(registry.pending_reviews().count(), 1);
    }

    #[test]
    fn approve_then_issue_lists_credits() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 2500);

        registry.approve(id, "2026-08-05").expect("approve");
        assert_eq!(
            registry.project(id).expect("project").status,
            ProjectStatus::Verified
        );
        assert!(registry.listings().is_empty());

        registry.issue(id, 25, "2026-08-07").expect("issue");
        let listings = registry.listings();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].available_credits, 2500);
        assert_eq!(listings[0].price_per_credit, 25);
    }

    #[test]
    fn review_only_from_registered() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 2500);
        registry.reject(id).expect("reject");

        assert!(matches!(
            registry.approve(id, "2026-08-05"),
            Err(MarketError::InvalidStatus { action: "approve", .. })
        ));
        assert!(registry.reject(id).is_err());
    }

    #[test]
    fn issue_requires_verified() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 2500);
        assert!(registry.issue(id, 25, "2026-08-07").is_err());
    }

    #[test]
    fn purchase_moves_credits_to_buyer() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 2500);
        registry.approve(id, "2026-08-05").expect("approve");
        registry.issue(id, 25, "2026-08-07").expect("issue");

        let buyer = Address::new("0x9876...4321");
        let tx = registry
            .purchase(id, 500, buyer.clone(), TxHash::new("0xdef"), "2026-08-10")
            .expect("purchase");
        assert_eq!(tx.kind, TransactionKind::Purchase);
        assert_eq!(tx.amount, 500);

        assert_eq!(registry.balance(&buyer), 500);
        assert_eq!(
            registry.project(id).expect("project").available_credits,
            2000
        );
        assert_eq!(registry.transactions(&buyer).len(), 1);
    }

    #[test]
    fn purchase_rejects_overdraw_and_zero() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 100);
        registry.approve(id, "2026-08-05").expect("approve");
        registry.issue(id, 25, "2026-08-07").expect("issue");

        let buyer = Address::new("0x9876...4321");
        assert!(matches!(
            registry.purchase(id, 0, buyer.clone(), TxHash::new("0x1"), "d"),
            Err(MarketError::ZeroAmount)
        ));
        assert!(matches!(
            registry.purchase(id, 101, buyer, TxHash::new("0x1"), "d"),
            Err(MarketError::InsufficientCredits {
                requested: 101,
                available: 100
            })
        ));
    }

    #[test]
    fn retire_debits_balance_and_issues_certificate() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 1000);
        registry.approve(id, "2026-08-05").expect("approve");
        registry.issue(id, 25, "2026-08-07").expect("issue");

        let buyer = Address::new("0x9876...4321");
        registry
            .purchase(id, 300, buyer.clone(), TxHash::new("0xdef"), "2026-08-10")
            .expect("purchase");

        let record = registry
            .retire(
                buyer.clone(),
                id,
                100,
                "Corporate carbon neutrality program",
                CertificateId::new("CERT-2026-001"),
                TxHash::new("0xfed"),
                "2026-08-11",
            )
            .expect("retire");
        assert_eq!(record.amount, 100);
        assert_eq!(record.certificate, CertificateId::new("CERT-2026-001"));

        assert_eq!(registry.balance(&buyer), 200);
        assert_eq!(registry.project(id).expect("project").retired_credits, 100);
        assert_eq!(registry.retirements(&buyer).len(), 1);
        assert_eq!(registry.transactions(&buyer).len(), 2);
    }

    #[test]
    fn retire_rejects_overdraw() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 1000);
        registry.approve(id, "2026-08-05").expect("approve");
        registry.issue(id, 25, "2026-08-07").expect("issue");

        let buyer = Address::new("0x9876...4321");
        assert!(matches!(
            registry.retire(
                buyer,
                id,
                1,
                "reason",
                CertificateId::new("CERT-2026-001"),
                TxHash::new("0x1"),
                "d",
            ),
            Err(MarketError::InsufficientBalance {
                requested: 1,
                balance: 0
            })
        ));
    }

    #[test]
    fn fully_retired_project_changes_status() {
        let mut registry = Registry::new();
        let id = register_one(&mut registry, 10);
        registry.approve(id, "2026-08-05").expect("approve");
        registry.issue(id, 25, "2026-08-07").expect("issue");

        let buyer = Address::new("0x9876...4321");
        registry
            .purchase(id, 10, buyer.clone(), TxHash::new("0x1"), "d")
            .expect("purchase");
        registry
            .retire(
                buyer,
                id,
                10,
                "offset",
                CertificateId::new("CERT-2026-002"),
                TxHash::new("0x2"),
                "d",
            )
            .expect("retire");

        assert_eq!(
            registry.project(id).expect("project").status,
            ProjectStatus::Retired
        );
    }

    #[test]
    fn stats_aggregate_counters() {
        let mut registry = Registry::new();
        let first = register_one(&mut registry, 2500);
        register_one(&mut registry, 1200);
        registry.approve(first, "2026-08-05").expect("approve");
        registry.issue(first, 25, "2026-08-07").expect("issue");

        let stats = registry.stats();
        assert_eq!(stats.project_count, 2);
        assert_eq!(stats.pending_reviews, 1);
        assert_eq!(stats.credits_issued, 2500);
        assert_eq!(stats.credits_retired, 0);
    }

    #[test]
    fn unknown_project_errors() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.approve(ProjectId(99), "d"),
            Err(MarketError::ProjectNotFound(ProjectId(99)))
        ));
        assert!(registry.project(ProjectId(99)).is_none());
    }
}
