use crate::error::EngineError;

/// Derive the inventory lookup key from a vendor UPC.
///
/// The inventory system silently drops the last digit of stored UPCs, so the
/// key is the vendor UPC minus its final character. A single-character UPC is
/// passed through unchanged rather than truncated to nothing.
pub fn normalize_upc(vendor_sku: &str, upc: &str) -> Result<String, EngineError> {
    let upc = upc.trim();
    if upc.is_empty() || !upc.chars().all(|c| c.is_ascii_digit()) {
        return Err(EngineError::InvalidUpc {
            vendor_sku: vendor_sku.to_string(),
            value: upc.to_string(),
        });
    }

    if upc.len() <= 1 {
        return Ok(upc.to_string());
    }

    Ok(upc[..upc.len() - 1].to_string())
}
