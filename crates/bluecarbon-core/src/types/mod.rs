//! # Core Type Definitions
//!
//! This module contains all core types for the blue carbon registry:
//! - Identifiers (`ProjectId`, `EntryId`, `Cid`, `TxHash`, `Address`,
//!   `CertificateId`)
//! - Domain enums (`ProjectType`, `FileKind`, `UploadState`,
//!   `ProjectStatus`)
//! - The registration draft and the metadata document derived from it
//! - Error types (`MarketError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (credits and prices are whole tokens)
//! - Implement `Ord` where used as `BTreeMap` keys
//! - Use saturating arithmetic for credit counters to prevent overflow

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a registered project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub u64);

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proj_{:03}", self.0)
    }
}

/// Unique identifier for a file-upload entry inside a wizard.
///
/// Entries are keyed by this identifier rather than positional index,
/// so a status update always targets the same entry regardless of how
/// many entries were appended in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(pub u64);

/// Content identifier: opaque handle returned by content-addressed storage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cid(pub String);

impl Cid {
    /// Create a new content identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger transaction acknowledgment handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    /// Create a new transaction hash from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the hash as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Wallet address of a marketplace participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Create a new address from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Retirement certificate identifier (e.g. `CERT-2026-001`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateId(pub String);

impl CertificateId {
    /// Create a new certificate identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

// =============================================================================
// PROJECT TYPE
// =============================================================================

/// The kind of blue carbon ecosystem a project restores or protects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Mangrove restoration.
    #[default]
    Mangrove,
    /// Seagrass conservation.
    Seagrass,
    /// Salt marsh protection.
    Saltmarsh,
    /// Kelp forest restoration.
    Kelp,
}

impl ProjectType {
    /// Human-readable name for dashboard display.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mangrove => "Mangrove Restoration",
            Self::Seagrass => "Seagrass Conservation",
            Self::Saltmarsh => "Salt Marsh Protection",
            Self::Kelp => "Kelp Forest Restoration",
        }
    }

    /// Lowercase tag used in filters and the JSON API.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Mangrove => "mangrove",
            Self::Seagrass => "seagrass",
            Self::Saltmarsh => "saltmarsh",
            Self::Kelp => "kelp",
        }
    }
}

impl FromStr for ProjectType {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mangrove" => Ok(Self::Mangrove),
            "seagrass" => Ok(Self::Seagrass),
            "saltmarsh" => Ok(Self::Saltmarsh),
            "kelp" => Ok(Self::Kelp),
            other => Err(MarketError::UnknownProjectType(other.to_string())),
        }
    }
}

// =============================================================================
// FILE KIND
// =============================================================================

/// Type tag of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    /// Photos, satellite imagery, or other visual evidence.
    Evidence,
    /// JSON files with detailed project specifications.
    Metadata,
}

// =============================================================================
// UPLOAD STATE
// =============================================================================

/// Lifecycle state of one file-upload entry.
///
/// Transitions are driven solely by the upload transport:
/// pending → uploading → uploaded | error. A failed entry stays in
/// `Error` permanently; there is no retry, the user re-adds the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum UploadState {
    /// Entry created, upload not yet initiated.
    Pending,
    /// Upload in flight.
    Uploading,
    /// Upload succeeded; carries the assigned content identifier.
    Uploaded {
        /// Content identifier assigned by storage.
        cid: Cid,
    },
    /// Upload failed. Terminal.
    Error,
}

impl UploadState {
    /// Whether the entry reached the uploaded state.
    #[must_use]
    pub const fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }

    /// Whether the entry is still awaiting an upload attempt.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

// =============================================================================
// PROJECT STATUS
// =============================================================================

/// Lifecycle status of a registered project.
///
/// A freshly registered project awaits verifier review. Approval moves
/// it to `Verified`, after which credits can be issued and listed for
/// sale. `Retired` means every issued credit has been retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Registered on the ledger, awaiting review.
    Registered,
    /// Approved by a verifier.
    Verified,
    /// Rejected by a verifier. Terminal.
    Rejected,
    /// Credits issued and available for purchase.
    Issued,
    /// All issued credits have been retired.
    Retired,
}

impl ProjectStatus {
    /// Lowercase tag used in filters and the JSON API.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Issued => "issued",
            Self::Retired => "retired",
        }
    }
}

impl FromStr for ProjectStatus {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(Self::Registered),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            "issued" => Ok(Self::Issued),
            "retired" => Ok(Self::Retired),
            other => Err(MarketError::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// PROJECT DRAFT
// =============================================================================

/// The accumulated project-detail fields of an in-progress wizard.
///
/// Created empty at wizard start, mutated field-by-field by user input,
/// and consumed on successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProjectDraft {
    /// Project name.
    pub name: String,
    /// Project description: environmental impact and methodology.
    pub description: String,
    /// Geographic location, free-form (e.g. "Florida Keys, USA").
    pub location: String,
    /// Project area in hectares.
    pub area_hectares: u64,
    /// Ecosystem type. Defaults to mangrove, matching the form.
    pub project_type: ProjectType,
    /// Estimated carbon credits over the project lifetime.
    pub estimated_credits: u64,
    /// ISO-8601 start date.
    pub start_date: String,
    /// ISO-8601 end date.
    pub end_date: String,
}

// =============================================================================
// PROJECT METADATA
// =============================================================================

/// The project metadata document stored in content-addressed storage
/// at submission time, and fetched back by CID on the review screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Project name.
    pub name: String,
    /// Project description.
    pub description: String,
    /// Geographic location.
    pub location: String,
    /// Project area in hectares.
    pub area_hectares: u64,
    /// Ecosystem type.
    pub project_type: ProjectType,
    /// Estimated carbon credits.
    pub estimated_credits: u64,
    /// ISO-8601 start date.
    pub start_date: String,
    /// ISO-8601 end date.
    pub end_date: String,
    /// Content identifiers of the uploaded evidence files.
    pub evidence_files: Vec<Cid>,
    /// Content identifiers of the uploaded metadata files.
    pub metadata_files: Vec<Cid>,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the blue carbon registry.
///
/// - No silent failures
/// - Use `Result<T, MarketError>` for fallible operations
/// - The core should never panic; all errors must be recoverable
#[derive(Debug, Error)]
pub enum MarketError {
    /// The requested project does not exist.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// The requested file-upload entry does not exist.
    #[error("Upload entry not found: {0:?}")]
    EntryNotFound(EntryId),

    /// An upload entry was not in the state required for the transition.
    #[error("Upload entry {0:?} is not {1}")]
    EntryNotIn(EntryId, &'static str),

    /// Leaving the upload step requires at least one entry and every
    /// entry in the uploaded state.
    #[error("Uploads incomplete: every added file must be uploaded before continuing")]
    UploadsIncomplete,

    /// A project status transition that the lifecycle does not allow.
    #[error("Project {id} is {status:?}; cannot {action}")]
    InvalidStatus {
        /// The project in question.
        id: ProjectId,
        /// Its current status.
        status: ProjectStatus,
        /// The attempted operation.
        action: &'static str,
    },

    /// Purchase amount exceeds the credits available on the listing.
    #[error("Requested {requested} credits but only {available} are available")]
    InsufficientCredits {
        /// Credits requested.
        requested: u64,
        /// Credits available.
        available: u64,
    },

    /// Retirement amount exceeds the account balance.
    #[error("Requested {requested} credits but balance is {balance}")]
    InsufficientBalance {
        /// Credits requested.
        requested: u64,
        /// Current balance.
        balance: u64,
    },

    /// Credit amounts must be strictly positive.
    #[error("Credit amount must be greater than zero")]
    ZeroAmount,

    /// Unrecognized project type tag.
    #[error("Unknown project type: {0}")]
    UnknownProjectType(String),

    /// Unrecognized project status tag.
    #[error("Unknown project status: {0}")]
    UnknownStatus(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred (app layer only; the core does no I/O).
    #[error("I/O error: {0}")]
    IoError(String),

    /// A transport/gateway call failed (app layer only).
    #[error("Gateway error: {0}")]
    GatewayError(String),
}

// =============================================================================
// TESTS
// =============================================================================
