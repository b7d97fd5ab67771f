use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::model::{InventoryRecord, ReviewReason, VendorRecord};

/// Multiplicative change between two positive magnitudes: `max(a,b) / min(a,b)`.
///
/// Input constraints make non-positive values unreachable here, but the guard
/// stays: a zero divisor would otherwise poison the whole batch.
pub fn ratio(field: &str, a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    if a <= Decimal::ZERO || b <= Decimal::ZERO {
        let bad = if a <= Decimal::ZERO { a } else { b };
        return Err(EngineError::AnomalyCheck {
            field: field.to_string(),
            value: bad.to_string(),
        });
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    Ok(hi / lo)
}

/// Flag cost/price swings at or above `threshold` (inclusive boundary).
///
/// Cost is checked before price; either flag short-circuits the record into
/// review before any field is touched.
pub fn check(
    vendor: &VendorRecord,
    inventory: &InventoryRecord,
    threshold: Decimal,
) -> Result<Option<ReviewReason>, EngineError> {
    if ratio("cost", vendor.cost, inventory.cost)? >= threshold {
        return Ok(Some(ReviewReason::CostAnomaly));
    }
    if ratio("list_price", vendor.suggested_retail, inventory.list_price)? >= threshold {
        return Ok(Some(ReviewReason::PriceAnomaly));
    }
    Ok(None)
}
