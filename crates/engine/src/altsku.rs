use crate::model::InventoryRecord;

/// Where the vendor SKU stands relative to an inventory record's identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Already the item number or present in an alt-SKU slot.
    AlreadyPresent,
    /// Stage the vendor SKU into this free slot index.
    Slot(usize),
    /// Every slot is occupied. Slot capacity is fixed by the inventory
    /// system; the engine never grows the sequence.
    Exhausted,
}

/// First-fit allocation over the fixed alt-SKU slot sequence.
pub fn allocate(vendor_sku: &str, inventory: &InventoryRecord) -> Allocation {
    let sku = vendor_sku.trim();

    if sku == inventory.item_number {
        return Allocation::AlreadyPresent;
    }
    if inventory
        .alt_skus
        .iter()
        .flatten()
        .any(|existing| existing.trim() == sku)
    {
        return Allocation::AlreadyPresent;
    }

    match inventory.alt_skus.iter().position(|slot| slot.is_none()) {
        Some(index) => Allocation::Slot(index),
        None => Allocation::Exhausted,
    }
}
