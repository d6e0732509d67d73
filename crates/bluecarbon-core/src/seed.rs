//! # Demo Dataset
//!
//! The canned marketplace state the dashboard ships with: four sample
//! projects across the ecosystem types, a buyer with an existing
//! balance, and one prior purchase/retirement pair. Used by the CLI
//! and by the server's seeded mode; real deployments would start from
//! an empty registry fed by the ledger.

use crate::registry::Registry;
use crate::types::{
    Address, CertificateId, Cid, ProjectMetadata, ProjectType, TxHash,
};

/// Wallet address of the demo buyer account.
#[must_use]
pub fn demo_buyer() -> Address {
    Address::new("0x9876...4321")
}

/// Build a registry populated with the demo marketplace state.
#[must_use]
pub fn demo_registry() -> Registry {
    let mut registry = Registry::new();

    let mangrove = registry.register(
        ProjectMetadata {
            name: "Mangrove Restoration Initiative".to_string(),
            description: "Large-scale mangrove restoration project aimed at protecting \
                          coastal areas and sequestering carbon through native species \
                          replanting."
                .to_string(),
            location: "Florida Keys, USA".to_string(),
            area_hectares: 150,
            project_type: ProjectType::Mangrove,
            estimated_credits: 2500,
            start_date: "2024-01-15".to_string(),
            end_date: "2034-01-15".to_string(),
            evidence_files: vec![Cid::new("QmA1B2C3"), Cid::new("QmD4E5F6")],
            metadata_files: vec![Cid::new("QmX1Y2Z3")],
        },
        Address::new("0x1234...5678"),
        Cid::new("QmX1Y2Z3"),
        TxHash::new("0xdef456"),
        "2024-01-15",
    );

    let seagrass = registry.register(
        ProjectMetadata {
            name: "Seagrass Conservation Project".to_string(),
            description: "Seagrass bed restoration and protection initiative focusing on \
                          eelgrass species to improve water quality and carbon storage."
                .to_string(),
            location: "Chesapeake Bay, USA".to_string(),
            area_hectares: 75,
            project_type: ProjectType::Seagrass,
            estimated_credits: 1200,
            start_date: "2024-01-12".to_string(),
            end_date: "2032-01-12".to_string(),
            evidence_files: vec![Cid::new("QmG7H8I9")],
            metadata_files: vec![Cid::new("QmP7Q8R9")],
        },
        Address::new("0x9876...4321"),
        Cid::new("QmP7Q8R9"),
        TxHash::new("0xabc123"),
        "2024-01-12",
    );

    let saltmarsh = registry.register(
        ProjectMetadata {
            name: "Salt Marsh Protection".to_string(),
            description: "Comprehensive salt marsh restoration and protection program with \
                          community involvement and long-term monitoring."
                .to_string(),
            location: "San Francisco Bay, USA".to_string(),
            area_hectares: 200,
            project_type: ProjectType::Saltmarsh,
            estimated_credits: 3000,
            start_date: "2024-01-08".to_string(),
            end_date: "2036-01-08".to_string(),
            evidence_files: vec![Cid::new("QmJ1K2L3"), Cid::new("QmM4N5O6")],
            metadata_files: vec![Cid::new("QmL3M4N5")],
        },
        Address::new("0x5555...7777"),
        Cid::new("QmL3M4N5"),
        TxHash::new("0x456def"),
        "2024-01-08",
    );

    let kelp = registry.register(
        ProjectMetadata {
            name: "Kelp Forest Restoration".to_string(),
            description: "Restoration of kelp forest canopy to rebuild habitat and carbon \
                          drawdown along the central coast."
                .to_string(),
            location: "Monterey Bay, USA".to_string(),
            area_hectares: 120,
            project_type: ProjectType::Kelp,
            estimated_credits: 1800,
            start_date: "2024-01-25".to_string(),
            end_date: "2031-01-25".to_string(),
            evidence_files: vec![Cid::new("QmR5S6T7")],
            metadata_files: vec![Cid::new("QmU8V9W0")],
        },
        Address::new("0x3333...9999"),
        Cid::new("QmU8V9W0"),
        TxHash::new("0x789abc"),
        "2024-01-25",
    );

    // Seeding drives the lifecycle with the same operations the API
    // exposes; a failure here is a bug in the dataset itself.
    let buyer = demo_buyer();
    let seeded = (|| {
        registry.approve(mangrove, "2024-01-20")?;
        registry.issue(mangrove, 25, "2024-01-22")?;
        registry.approve(seagrass, "2024-01-18")?;
        registry.issue(seagrass, 22, "2024-01-20")?;
        registry.approve(saltmarsh, "2024-01-15")?;
        registry.issue(saltmarsh, 30, "2024-01-17")?;
        registry.approve(kelp, "2024-01-30")?;

        registry.purchase(
            mangrove,
            1000,
            buyer.clone(),
            TxHash::new("0xdef456"),
            "2024-01-24",
        )?;
        registry.purchase(
            seagrass,
            100,
            buyer.clone(),
            TxHash::new("0xabc123"),
            "2024-01-24",
        )?;
        registry.retire(
            buyer.clone(),
            seagrass,
            100,
            "Corporate carbon neutrality program",
            CertificateId::new("CERT-2024-001"),
            TxHash::new("0xabc123"),
            "2024-01-25",
        )?;
        Ok::<(), crate::types::MarketError>(())
    })();
    debug_assert!(seeded.is_ok(), "demo dataset must seed cleanly");

    // Pre-existing holdings from before the recorded history.
    registry.credit_balance(buyer, 350);

    registry
}

// =============================================================================
// TESTS
// =============================================================================
