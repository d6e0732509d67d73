//! End-to-end wizard scenarios: the registration flow from an empty
//! draft through upload gating to the metadata document handed to the
//! ledger.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use bluecarbon_core::{
    Address, Cid, FileKind, FileSelection, MarketError, ProjectType, Registry, TxHash, Wizard,
    WizardStep,
};

fn file(name: &str, size_bytes: u64) -> FileSelection {
    FileSelection {
        name: name.to_string(),
        size_bytes,
    }
}

// =============================================================================
// HAPPY PATH
// =============================================================================

#[test]
fn full_registration_flow() {
    let mut wizard = Wizard::new();

    // Step 1: fill the details form.
    assert_eq!(wizard.step(), WizardStep::Details);
    let draft = wizard.draft_mut();
    draft.name = "Mangrove Restoration Project".to_string();
    draft.description = "Native species replanting".to_string();
    draft.location = "Florida Keys, USA".to_string();
    draft.area_hectares = 100;
    draft.project_type = ProjectType::Mangrove;
    draft.estimated_credits = 1000;
    draft.start_date = "2026-09-01".to_string();
    draft.end_date = "2036-09-01".to_string();
    wizard.advance().unwrap();

    // Step 2: add two evidence files, both pending.
    assert_eq!(wizard.step(), WizardStep::Upload);
    let ids = wizard.add_files(
        [file("site-north.jpg", 2 << 20), file("site-south.jpg", 3 << 20)],
        FileKind::Evidence,
    );
    assert_eq!(ids.len(), 2);
    assert_eq!(wizard.pending_ids(), ids);

    // Upload both; each gets a distinct identifier.
    for (n, id) in ids.iter().enumerate() {
        wizard.begin_upload(*id).unwrap();
        wizard
            .finish_upload(*id, Cid::new(format!("Qm{:016x}", n + 1)))
            .unwrap();
    }
    let cids = wizard.uploaded_cids(FileKind::Evidence);
    assert_eq!(cids.len(), 2);
    assert_ne!(cids[0], cids[1]);

    // Steps 3 and 4.
    assert_eq!(wizard.advance().unwrap(), WizardStep::Review);
    assert_eq!(wizard.advance().unwrap(), WizardStep::Submit);

    // Submission hands the metadata document to the registry.
    let metadata = wizard.finalize().unwrap();
    assert_eq!(metadata.evidence_files, cids);

    let mut registry = Registry::new();
    let id = registry.register(
        metadata,
        Address::new("0x1234...5678"),
        Cid::new("QmMetaDoc"),
        TxHash::new("0xabc"),
        "2026-08-29",
    );
    wizard.mark_submitted();

    assert!(wizard.is_submitted());
    let project = registry.project(id).unwrap();
    assert_eq!(project.name, "Mangrove Restoration Project");
    assert_eq!(registry.pending_reviews().count(), 1);
}

// =============================================================================
// FAILURE & GATING SCENARIOS
// =============================================================================

#[test]
fn failed_upload_blocks_review_step() {
    let mut wizard = Wizard::new();
    wizard.advance().unwrap();

    let id = wizard.add_files([file("blurry.jpg", 512)], FileKind::Evidence)[0];
    wizard.begin_upload(id).unwrap();
    wizard.fail_upload(id).unwrap();

    assert!(matches!(
        wizard.advance(),
        Err(MarketError::UploadsIncomplete)
    ));
    assert_eq!(wizard.step(), WizardStep::Upload);

    // Re-adding the file and uploading it unblocks the step; the failed
    // entry stays in error forever.
    let retry = wizard.add_files([file("blurry.jpg", 512)], FileKind::Evidence)[0];
    wizard.begin_upload(retry).unwrap();
    wizard.finish_upload(retry, Cid::new("Qm01")).unwrap();

    // The error entry still blocks: every entry must be uploaded.
    assert!(matches!(
        wizard.advance(),
        Err(MarketError::UploadsIncomplete)
    ));
}

#[test]
fn retreat_from_review_allows_more_files() {
    let mut wizard = Wizard::new();
    wizard.advance().unwrap();

    let id = wizard.add_files([file("a.jpg", 1)], FileKind::Evidence)[0];
    wizard.begin_upload(id).unwrap();
    wizard.finish_upload(id, Cid::new("Qm01")).unwrap();
    wizard.advance().unwrap();
    assert_eq!(wizard.step(), WizardStep::Review);

    assert_eq!(wizard.retreat(), WizardStep::Upload);
    let extra = wizard.add_files([file("b.json", 1)], FileKind::Metadata)[0];

    // New pending entry re-engages the gate.
    assert!(wizard.advance().is_err());
    wizard.begin_upload(extra).unwrap();
    wizard.finish_upload(extra, Cid::new("Qm02")).unwrap();
    assert_eq!(wizard.advance().unwrap(), WizardStep::Review);
}
