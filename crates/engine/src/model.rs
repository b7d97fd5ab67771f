use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A single normalized row from the vendor's export feed.
#[derive(Debug, Clone, Serialize)]
pub struct VendorRecord {
    pub vendor_sku: String,
    pub upc: String,
    pub cost: Decimal,
    pub suggested_retail: Decimal,
    pub description: String,
    pub weight: Decimal,
}

/// Snapshot of one inventory-system record.
///
/// Owned by the inventory system; the engine reads snapshots and proposes
/// patches, never constructs or destroys these in the real store.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRecord {
    pub item_number: String,
    /// Fixed-capacity alternate-SKU slots. `None` is a free slot. The engine
    /// never grows or reorders this sequence.
    pub alt_skus: Vec<Option<String>>,
    /// Stored UPC. The inventory system is known to drop the last digit
    /// relative to vendor UPCs.
    pub upc: String,
    pub cost: Decimal,
    pub list_price: Decimal,
    pub weight: Decimal,
    pub group: Option<String>,
    /// Optimistic-concurrency token, bumped by the store on every write.
    pub revision: u64,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum MatchResult {
    NoMatch,
    /// Two or more candidates with two or more distinct item numbers.
    Ambiguous {
        candidates: Vec<InventoryRecord>,
        distinct_items: usize,
    },
    Unique(InventoryRecord),
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewReason {
    New,
    Duplicate,
    CostAnomaly,
    PriceAnomaly,
    SlotExhausted,
    Infrastructure,
}

impl std::fmt::Display for ReviewReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::CostAnomaly => write!(f, "cost_anomaly"),
            Self::PriceAnomaly => write!(f, "price_anomaly"),
            Self::SlotExhausted => write!(f, "slot_exhausted"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

/// One item queued for human review. Immutable once created; the engine
/// never reads its own queue back.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewEntry {
    pub record: VendorRecord,
    pub reason: ReviewReason,
    /// Matched-record snapshot, when one existed at classification time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<InventoryRecord>,
    /// Free-form detail (e.g. the candidate item numbers of a duplicate).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// Proposed field-level update to exactly one inventory record.
///
/// Every field is independent; an all-`None` patch is a valid no-op outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Patch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_price: Option<Decimal>,
    /// Slot index + value for a staged alternate SKU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_sku: Option<(usize, String)>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none()
            && self.group.is_none()
            && self.cost.is_none()
            && self.list_price.is_none()
            && self.alt_sku.is_none()
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// Patch computed and (if non-empty) applied through the collaborator.
    Applied {
        vendor_sku: String,
        item_number: String,
        patch: Patch,
    },
    /// Routed to the review queue.
    Queued(ReviewEntry),
    /// Malformed input record, rejected without aborting the batch.
    Rejected { vendor_sku: String, error: String },
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub total_records: usize,
    pub applied: usize,
    /// Applied outcomes whose patch was empty (already up to date).
    pub unchanged: usize,
    pub queued: usize,
    pub rejected: usize,
    pub reason_counts: HashMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub meta: RunMeta,
    pub summary: RunSummary,
    pub outcomes: Vec<RecordOutcome>,
}
