use rust_decimal::Decimal;

use crate::model::{InventoryRecord, Patch, VendorRecord};

/// Exact equality on the normalized numeric value (`1.50` == `1.5`).
fn differs(a: Decimal, b: Decimal) -> bool {
    a.normalize() != b.normalize()
}

/// Compute the field-level patch for an anomaly-cleared match.
///
/// Each entry is an independent function of (vendor value, inventory value):
/// - `weight`: vendor wins on any difference.
/// - `group`: gap-filled with `default_group` when absent or empty; the
///   vendor feed has no group field.
/// - `cost`: vendor wins on any difference.
/// - `list_price`: only follows the vendor when the cost strictly increased.
///   Downward or flat cost movement never triggers an automatic price change.
pub fn compute_patch(
    vendor: &VendorRecord,
    inventory: &InventoryRecord,
    staged_slot: Option<usize>,
    default_group: &str,
) -> Patch {
    let mut patch = Patch::default();

    if differs(vendor.weight, inventory.weight) {
        patch.weight = Some(vendor.weight);
    }

    let group_missing = inventory
        .group
        .as_ref()
        .map_or(true, |g| g.trim().is_empty());
    if group_missing {
        patch.group = Some(default_group.to_string());
    }

    if differs(vendor.cost, inventory.cost) {
        patch.cost = Some(vendor.cost);
    }

    let cost_increased = vendor.cost > inventory.cost;
    if cost_increased && differs(vendor.suggested_retail, inventory.list_price) {
        patch.list_price = Some(vendor.suggested_retail);
    }

    if let Some(index) = staged_slot {
        patch.alt_sku = Some((index, vendor.vendor_sku.trim().to_string()));
    }

    patch
}
