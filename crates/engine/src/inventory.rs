use std::fmt;

use crate::model::{InventoryRecord, Patch};

// ---------------------------------------------------------------------------
// Collaborator interface
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Record changed since the snapshot used to compute the patch.
    Conflict { item_number: String },
    /// Item no longer exists.
    NotFound { item_number: String },
    /// Transient failure (timeout, connection loss). Retryable.
    Unavailable(String),
    /// Patch names a slot outside the record's fixed capacity.
    InvalidSlot { item_number: String, slot: usize },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict { item_number } => {
                write!(f, "write conflict on '{item_number}': record changed since snapshot")
            }
            Self::NotFound { item_number } => write!(f, "item '{item_number}' not found"),
            Self::Unavailable(msg) => write!(f, "inventory system unavailable: {msg}"),
            Self::InvalidSlot { item_number, slot } => {
                write!(f, "item '{item_number}': alt-SKU slot {slot} out of range")
            }
        }
    }
}

impl std::error::Error for StoreError {}

/// The inventory system, reachable only through lookup and write.
///
/// The engine never constructs or destroys inventory records; it reads
/// snapshots and proposes patches. `apply_patch` is atomic per record and
/// uses the snapshot's `revision` for optimistic concurrency.
pub trait InventoryStore {
    fn lookup_by_upc_prefix(&self, key: &str) -> Result<Vec<InventoryRecord>, StoreError>;

    fn fetch(&self, item_number: &str) -> Result<InventoryRecord, StoreError>;

    fn apply_patch(
        &mut self,
        item_number: &str,
        base_revision: u64,
        patch: &Patch,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory adapter
// ---------------------------------------------------------------------------

/// In-memory inventory built from a snapshot export. Backs the CLI's
/// run-against-a-snapshot workflow and the engine tests.
///
/// Rows are kept as exported: one logical item may appear on several rows
/// under different barcodes, which is exactly how the real system produces
/// multi-hit lookups for a single item. A patch applies to every row of its
/// `item_number` as one atomic change.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    rows: Vec<InventoryRecord>,
}

impl MemoryInventory {
    pub fn new(rows: Vec<InventoryRecord>) -> Self {
        Self { rows }
    }

    /// First row of the given item, if any.
    pub fn get(&self, item_number: &str) -> Option<&InventoryRecord> {
        self.rows.iter().find(|r| r.item_number == item_number)
    }

    pub fn rows(&self) -> impl Iterator<Item = &InventoryRecord> {
        self.rows.iter()
    }
}

impl InventoryStore for MemoryInventory {
    fn lookup_by_upc_prefix(&self, key: &str) -> Result<Vec<InventoryRecord>, StoreError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.upc.starts_with(key))
            .cloned()
            .collect())
    }

    fn fetch(&self, item_number: &str) -> Result<InventoryRecord, StoreError> {
        self.get(item_number)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                item_number: item_number.to_string(),
            })
    }

    fn apply_patch(
        &mut self,
        item_number: &str,
        base_revision: u64,
        patch: &Patch,
    ) -> Result<(), StoreError> {
        let indices: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.item_number == item_number)
            .map(|(i, _)| i)
            .collect();

        if indices.is_empty() {
            return Err(StoreError::NotFound {
                item_number: item_number.to_string(),
            });
        }

        // Validate everything before mutating anything: the write is
        // all-or-nothing per record.
        for &i in &indices {
            if self.rows[i].revision != base_revision {
                return Err(StoreError::Conflict {
                    item_number: item_number.to_string(),
                });
            }
            if let Some((slot, _)) = &patch.alt_sku {
                if *slot >= self.rows[i].alt_skus.len() {
                    return Err(StoreError::InvalidSlot {
                        item_number: item_number.to_string(),
                        slot: *slot,
                    });
                }
            }
        }

        for &i in &indices {
            let record = &mut self.rows[i];
            if let Some(weight) = patch.weight {
                record.weight = weight;
            }
            if let Some(ref group) = patch.group {
                record.group = Some(group.clone());
            }
            if let Some(cost) = patch.cost {
                record.cost = cost;
            }
            if let Some(list_price) = patch.list_price {
                record.list_price = list_price;
            }
            if let Some((slot, ref sku)) = patch.alt_sku {
                record.alt_skus[slot] = Some(sku.clone());
            }
            record.revision += 1;
        }

        Ok(())
    }
}
