//! # Registration Wizard
//!
//! The four-step project registration flow:
//! details → upload → review → submit.
//!
//! The wizard holds the current step, the accumulated [`ProjectDraft`],
//! and the file-upload entries. Steps advance and retreat one at a
//! time through explicit actions; there is no skipping and no
//! persistence across sessions.
//!
//! ## Gating Invariant
//!
//! The upload step cannot be left forward while zero files have been
//! added or while any entry is not in the uploaded state. Everything
//! else moves freely; boundary moves are silent no-ops.
//!
//! ## Upload Lifecycle
//!
//! Entry status transitions are driven solely by the upload transport
//! (via the app layer): `begin_upload` → `finish_upload` on success or
//! `fail_upload` on failure. Entries are independent; a failed entry
//! never blocks the others and is never retried or removed.

use crate::types::{
    Cid, EntryId, FileKind, MarketError, ProjectDraft, ProjectMetadata, UploadState,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// WIZARD STEP
// =============================================================================

/// One of the four wizard steps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum WizardStep {
    /// Step 1: project details form.
    #[default]
    Details,
    /// Step 2: evidence and metadata file upload.
    Upload,
    /// Step 3: review before submission.
    Review,
    /// Step 4: submission. Terminal.
    Submit,
}

impl WizardStep {
    /// 1-based step index shown in the progress bar.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            Self::Details => 1,
            Self::Upload => 2,
            Self::Review => 3,
            Self::Submit => 4,
        }
    }

    /// Display label for the step.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Details => "Project Details",
            Self::Upload => "Upload Files",
            Self::Review => "Review",
            Self::Submit => "Submit",
        }
    }

    const fn next(self) -> Self {
        match self {
            Self::Details => Self::Upload,
            Self::Upload => Self::Review,
            Self::Review | Self::Submit => Self::Submit,
        }
    }

    const fn prev(self) -> Self {
        match self {
            Self::Details | Self::Upload => Self::Details,
            Self::Review => Self::Upload,
            Self::Submit => Self::Review,
        }
    }
}

// =============================================================================
// FILE UPLOAD ENTRY
// =============================================================================

/// A file selected for upload, as presented to the wizard.
///
/// The core tracks name, kind, and size only; the raw bytes stay with
/// the caller and travel straight to the upload transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSelection {
    /// Original file name.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// One file-upload entry with its independent lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUploadEntry {
    /// Stable entry identity.
    pub id: EntryId,
    /// Original file name.
    pub name: String,
    /// Evidence or metadata.
    pub kind: FileKind,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Current lifecycle state.
    pub state: UploadState,
}

// =============================================================================
// WIZARD
// =============================================================================

/// The registration wizard state machine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wizard {
    step: WizardStep,
    draft: ProjectDraft,
    entries: BTreeMap<EntryId, FileUploadEntry>,
    next_entry: u64,
    submitted: bool,
}

impl Wizard {
    /// Create a fresh wizard at the details step with an empty draft.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step.
    #[must_use]
    pub fn step(&self) -> WizardStep {
        self.step
    }

    /// The accumulated draft.
    #[must_use]
    pub fn draft(&self) -> &ProjectDraft {
        &self.draft
    }

    /// Mutable access to the draft for field-by-field edits.
    pub fn draft_mut(&mut self) -> &mut ProjectDraft {
        &mut self.draft
    }

    /// Whether submission has been attempted.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    // -------------------------------------------------------------------------
    // STEP CONTROL
    // -------------------------------------------------------------------------

    /// Move one step forward.
    ///
    /// A no-op at the terminal step. Rejected with
    /// [`MarketError::UploadsIncomplete`] when leaving the upload step
    /// while no entries exist or any entry is not uploaded.
    pub fn advance(&mut self) -> Result<WizardStep, MarketError> {
        let current = self.step();
        if current == WizardStep::Upload && !self.uploads_complete() {
            return Err(MarketError::UploadsIncomplete);
        }
        let next = current.next();
        self.step = next;
        Ok(next)
    }

    /// Move one step back. A no-op at the details step.
    pub fn retreat(&mut self) -> WizardStep {
        let prev = self.step.prev();
        self.step = prev;
        prev
    }

    // -------------------------------------------------------------------------
    // FILE ENTRIES
    // -------------------------------------------------------------------------

    /// Append one pending entry per selected file and return their ids.
    ///
    /// Entries are never removed once added; a file the user no longer
    /// wants simply stays in whatever state it reached.
    pub fn add_files(
        &mut self,
        selection: impl IntoIterator<Item = FileSelection>,
        kind: FileKind,
    ) -> Vec<EntryId> {
        let mut added = Vec::new();
        for file in selection {
            let id = EntryId(self.next_entry);
            self.next_entry = self.next_entry.saturating_add(1);
            self.entries.insert(
                id,
                FileUploadEntry {
                    id,
                    name: file.name,
                    kind,
                    size_bytes: file.size_bytes,
                    state: UploadState::Pending,
                },
            );
            added.push(id);
        }
        added
    }

    /// All entries in deterministic id order.
    pub fn entries(&self) -> impl Iterator<Item = &FileUploadEntry> {
        self.entries.values()
    }

    /// Number of entries ever added.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Ids of entries still awaiting an upload attempt.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<EntryId> {
        self.entries
            .values()
            .filter(|e| e.state.is_pending())
            .map(|e| e.id)
            .collect()
    }

    /// Transition an entry from pending to uploading.
    pub fn begin_upload(&mut self, id: EntryId) -> Result<(), MarketError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(MarketError::EntryNotFound(id))?;
        if !entry.state.is_pending() {
            return Err(MarketError::EntryNotIn(id, "pending"));
        }
        entry.state = UploadState::Uploading;
        Ok(())
    }

    /// Transition an entry from uploading to uploaded with its assigned CID.
    pub fn finish_upload(&mut self, id: EntryId, cid: Cid) -> Result<(), MarketError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(MarketError::EntryNotFound(id))?;
        if entry.state != UploadState::Uploading {
            return Err(MarketError::EntryNotIn(id, "uploading"));
        }
        entry.state = UploadState::Uploaded { cid };
        Ok(())
    }

    /// Transition an entry from uploading to error. Terminal; no retry.
    pub fn fail_upload(&mut self, id: EntryId) -> Result<(), MarketError> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(MarketError::EntryNotFound(id))?;
        if entry.state != UploadState::Uploading {
            return Err(MarketError::EntryNotIn(id, "uploading"));
        }
        entry.state = UploadState::Error;
        Ok(())
    }

    /// Whether at least one entry exists and every entry is uploaded.
    #[must_use]
    pub fn uploads_complete(&self) -> bool {
        !self.entries.is_empty() && self.entries.values().all(|e| e.state.is_uploaded())
    }

    /// Content identifiers of uploaded entries of the given kind.
    #[must_use]
    pub fn uploaded_cids(&self, kind: FileKind) -> Vec<Cid> {
        self.entries
            .values()
            .filter(|e| e.kind == kind)
            .filter_map(|e| match &e.state {
                UploadState::Uploaded { cid } => Some(cid.clone()),
                _ => None,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // SUBMISSION
    // -------------------------------------------------------------------------

    /// Build the metadata document from the draft and uploaded files.
    ///
    /// Requires the upload gating invariant to hold; the draft itself
    /// is taken as-is (the form performs no field validation).
    pub fn finalize(&self) -> Result<ProjectMetadata, MarketError> {
        if !self.uploads_complete() {
            return Err(MarketError::UploadsIncomplete);
        }
        let draft = &self.draft;
        Ok(ProjectMetadata {
            name: draft.name.clone(),
            description: draft.description.clone(),
            location: draft.location.clone(),
            area_hectares: draft.area_hectares,
            project_type: draft.project_type,
            estimated_credits: draft.estimated_credits,
            start_date: draft.start_date.clone(),
            end_date: draft.end_date.clone(),
            evidence_files: self.uploaded_cids(FileKind::Evidence),
            metadata_files: self.uploaded_cids(FileKind::Metadata),
        })
    }

    /// Record that submission was attempted and force the terminal step.
    ///
    /// Called on both outcomes of submission: the flow advances to the
    /// terminal step regardless, and failure is surfaced to the user as
    /// a notification rather than a rollback.
    pub fn mark_submitted(&mut self) {
        self.submitted = true;
        self.step = WizardStep::Submit;
    }
}

// =============================================================================
// TESTS
// =============================================================================
