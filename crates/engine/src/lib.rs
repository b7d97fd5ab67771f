//! `catref-engine` — Vendor catalog reconciliation engine.
//!
//! Classifies each vendor feed record against the inventory system under a
//! truncated-UPC lookup key and computes the minimal, policy-correct field
//! patch. Non-terminal outcomes (no match, ambiguous match, anomaly, slot
//! exhaustion) route to a review queue instead of producing a write.
//!
//! The inventory system itself is an external collaborator behind the
//! [`InventoryStore`] trait; this crate never drives its UI or storage.

pub mod altsku;
pub mod anomaly;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod key;
pub mod matcher;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod report;

pub use config::EngineConfig;
pub use engine::{load_inventory_rows, load_vendor_rows, run, VendorRow};
pub use error::EngineError;
pub use inventory::{InventoryStore, MemoryInventory, StoreError};
pub use model::{
    InventoryRecord, MatchResult, Patch, RecordOutcome, ReviewEntry, ReviewReason, RunResult,
    VendorRecord,
};
