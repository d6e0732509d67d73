//! # bluecarbon-core
//!
//! The deterministic domain engine for the blue carbon registry - THE LOGIC.
//!
//! This crate holds every piece of marketplace state that the dashboard
//! screens operate on:
//!
//! - The four-step project registration wizard (details → upload →
//!   review → submit) with per-file upload lifecycle tracking
//! - The in-memory project registry: review decisions, credit issuance,
//!   purchases, retirements, and account balances
//! - Display filters for the project explorer
//! - The demo dataset the dashboard is seeded with
//!
//! ## Architectural Constraints
//!
//! - Is the ONLY place where marketplace state exists (stateful)
//! - Has NO async, NO network dependencies, NO I/O (pure Rust)
//! - All collections are `BTreeMap` keyed by stable identifiers, so
//!   iteration order is deterministic and entries survive concurrent
//!   status updates by identity rather than position
//! - External collaborators (content storage, ledger writes, the
//!   review pipeline) are the app layer's concern

// =============================================================================
// MODULES
// =============================================================================

pub mod filter;
pub mod registry;
pub mod seed;
pub mod types;
pub mod wizard;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Address, CertificateId, Cid, EntryId, FileKind, MarketError, ProjectDraft, ProjectId,
    ProjectMetadata, ProjectStatus, ProjectType, TxHash, UploadState,
};

// =============================================================================
// RE-EXPORTS: Wizard
// =============================================================================

pub use wizard::{FileSelection, FileUploadEntry, Wizard, WizardStep};

// =============================================================================
// RE-EXPORTS: Registry & Filters
// =============================================================================

pub use filter::ProjectFilter;
pub use registry::{
    CreditListing, Project, Registry, RegistryStats, RetirementRecord, Transaction,
    TransactionKind,
};
pub use seed::demo_registry;
