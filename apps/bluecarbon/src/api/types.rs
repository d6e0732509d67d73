//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use bluecarbon_core::{
    CertificateId, Cid, CreditListing, EntryId, FileKind, FileUploadEntry, Project, ProjectId,
    ProjectStatus, ProjectType, RegistryStats, RetirementRecord, Transaction, TxHash, Wizard,
};
use serde::{Deserialize, Serialize};

/// Maximum decoded size of a single uploaded file (10 MB).
///
/// Enforced at the API boundary before payloads reach the wizard.
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Registry status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub project_count: usize,
    pub pending_reviews: usize,
    pub credits_issued: u64,
    pub credits_retired: u64,
}

impl From<RegistryStats> for StatusResponse {
    fn from(stats: RegistryStats) -> Self {
        Self {
            project_count: stats.project_count,
            pending_reviews: stats.pending_reviews,
            credits_issued: stats.credits_issued,
            credits_retired: stats.credits_retired,
        }
    }
}

// =============================================================================
// PROJECT RESPONSES
// =============================================================================

/// Query parameters of the project list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectListParams {
    /// Free-text search over name, location, and description.
    pub query: Option<String>,
    /// Exact status tag (e.g. "issued").
    pub status: Option<String>,
    /// Exact project type tag (e.g. "mangrove").
    #[serde(rename = "type")]
    pub project_type: Option<String>,
}

/// One project as the explorer renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectJson {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub project_type: ProjectType,
    pub location: String,
    pub area_hectares: u64,
    pub estimated_credits: u64,
    pub issued_credits: u64,
    pub retired_credits: u64,
    pub available_credits: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_credit: Option<u64>,
    pub status: ProjectStatus,
    pub registered_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    pub metadata_cid: Cid,
    pub evidence_files: Vec<Cid>,
    pub tx_hash: TxHash,
}

impl From<&Project> for ProjectJson {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            owner: p.owner.as_str().to_string(),
            project_type: p.project_type,
            location: p.location.clone(),
            area_hectares: p.area_hectares,
            estimated_credits: p.estimated_credits,
            issued_credits: p.issued_credits,
            retired_credits: p.retired_credits,
            available_credits: p.available_credits,
            price_per_credit: p.price_per_credit,
            status: p.status,
            registered_at: p.registered_at.clone(),
            verified_at: p.verified_at.clone(),
            issued_at: p.issued_at.clone(),
            metadata_cid: p.metadata_cid.clone(),
            evidence_files: p.evidence_files.clone(),
            tx_hash: p.tx_hash.clone(),
        }
    }
}

/// Project list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectJson>,
}

// =============================================================================
// REVIEW & ISSUANCE
// =============================================================================

/// Verifier review decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "decision")]
pub enum ReviewRequest {
    /// Approve the project.
    Approve {
        #[serde(default)]
        notes: Option<String>,
    },
    /// Reject the project.
    Reject {
        #[serde(default)]
        notes: Option<String>,
    },
}

/// Credit issuance request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    /// Listing price in whole tokens per credit.
    pub price_per_credit: u64,
}

// =============================================================================
// MARKET TYPES
// =============================================================================

/// Listings response for the buyer screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsResponse {
    pub listings: Vec<CreditListing>,
}

/// Purchase request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    pub project_id: ProjectId,
    pub amount: u64,
}

/// Purchase response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    pub new_balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Retirement request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetireRequest {
    pub project_id: ProjectId,
    pub amount: u64,
    pub reason: String,
}

/// Retirement response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetireResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<CertificateId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    pub new_balance: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Balance response: marketplace holdings plus on-chain token balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account: String,
    pub credits: u64,
    pub token_balance: u64,
    pub transactions: Vec<Transaction>,
    pub retirements: Vec<RetirementRecord>,
}

// =============================================================================
// WIZARD TYPES
// =============================================================================

/// Wizard creation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardCreated {
    pub wizard_id: u64,
}

/// A wizard as rendered by the registration form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSnapshot {
    pub wizard_id: u64,
    pub step: u8,
    pub step_label: String,
    pub draft: bluecarbon_core::ProjectDraft,
    pub entries: Vec<FileUploadEntry>,
    pub uploads_complete: bool,
    pub submitted: bool,
}

impl WizardSnapshot {
    /// Capture the current wizard state.
    #[must_use]
    pub fn capture(wizard_id: u64, wizard: &Wizard) -> Self {
        Self {
            wizard_id,
            step: wizard.step().index(),
            step_label: wizard.step().label().to_string(),
            draft: wizard.draft().clone(),
            entries: wizard.entries().cloned().collect(),
            uploads_complete: wizard.uploads_complete(),
            submitted: wizard.is_submitted(),
        }
    }
}

/// Field-by-field draft patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub area_hectares: Option<u64>,
    pub project_type: Option<ProjectType>,
    pub estimated_credits: Option<u64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DraftPatch {
    /// Apply the present fields to a draft.
    pub fn apply(self, draft: &mut bluecarbon_core::ProjectDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(location) = self.location {
            draft.location = location;
        }
        if let Some(area) = self.area_hectares {
            draft.area_hectares = area;
        }
        if let Some(project_type) = self.project_type {
            draft.project_type = project_type;
        }
        if let Some(credits) = self.estimated_credits {
            draft.estimated_credits = credits;
        }
        if let Some(start) = self.start_date {
            draft.start_date = start;
        }
        if let Some(end) = self.end_date {
            draft.end_date = end;
        }
    }
}

/// One file in an add-files request; content travels base64-encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePayloadJson {
    pub name: String,
    pub content_base64: String,
}

/// Add-files request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFilesRequest {
    pub kind: FileKind,
    pub files: Vec<FilePayloadJson>,
}

/// Add-files response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddFilesResponse {
    pub entry_ids: Vec<EntryId>,
}

/// Step-change response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResponse {
    pub step: u8,
    pub step_label: String,
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Uniform error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// Build an error body.
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}
