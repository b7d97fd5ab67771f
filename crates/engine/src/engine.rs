use std::time::Duration;

use rust_decimal::Decimal;

use crate::config::{EngineConfig, InventorySource, RetryConfig, VendorSource};
use crate::error::EngineError;
use crate::inventory::{InventoryStore, StoreError};
use crate::key;
use crate::model::{
    InventoryRecord, Patch, RecordOutcome, ReviewEntry, ReviewReason, RunMeta, RunResult,
    VendorRecord,
};
use crate::pipeline::{self, Plan};
use crate::report::compute_summary;

// ---------------------------------------------------------------------------
// Batch runner
// ---------------------------------------------------------------------------

/// One vendor feed row, either usable or rejected at ingestion.
#[derive(Debug, Clone)]
pub enum VendorRow {
    Valid(VendorRecord),
    /// Malformed row. Rejected on its own; never aborts the batch.
    Malformed { vendor_sku: String, error: String },
}

/// Run reconciliation for a whole vendor batch against the collaborator.
///
/// Per-record containment: every row ends in exactly one outcome and no
/// error crosses record boundaries. Writes go through the store one at a
/// time, so at most one write per `item_number` is ever in flight.
pub fn run(
    config: &EngineConfig,
    vendor_rows: &[VendorRow],
    store: &mut dyn InventoryStore,
) -> RunResult {
    let mut outcomes = Vec::with_capacity(vendor_rows.len());

    for row in vendor_rows {
        let outcome = match row {
            VendorRow::Valid(vendor) => run_record(config, vendor, store),
            VendorRow::Malformed { vendor_sku, error } => RecordOutcome::Rejected {
                vendor_sku: vendor_sku.clone(),
                error: error.clone(),
            },
        };
        outcomes.push(outcome);
    }

    let summary = compute_summary(&outcomes);

    RunResult {
        meta: RunMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary,
        outcomes,
    }
}

fn run_record(
    config: &EngineConfig,
    vendor: &VendorRecord,
    store: &mut dyn InventoryStore,
) -> RecordOutcome {
    let lookup_key = match key::normalize_upc(&vendor.vendor_sku, &vendor.upc) {
        Ok(key) => key,
        Err(e) => {
            return RecordOutcome::Rejected {
                vendor_sku: vendor.vendor_sku.clone(),
                error: e.to_string(),
            }
        }
    };

    let candidates = match with_retry(&config.retry, || store.lookup_by_upc_prefix(&lookup_key)) {
        Ok(candidates) => candidates,
        Err(e) => return queue_infrastructure(vendor, None, &e),
    };

    let plan = match pipeline::plan(vendor, candidates, &config.policy) {
        Ok(plan) => plan,
        Err(e) => {
            return RecordOutcome::Rejected {
                vendor_sku: vendor.vendor_sku.clone(),
                error: e.to_string(),
            }
        }
    };

    match plan {
        Plan::Queue(entry) => RecordOutcome::Queued(entry),
        Plan::Apply { item_number, base_revision, patch } => {
            apply_plan(config, vendor, item_number, base_revision, patch, store)
        }
    }
}

/// Apply a computed patch, absorbing transient failures and one conflict.
///
/// Conflict policy: re-fetch the record, re-plan once against the fresh
/// snapshot, retry the write once. A second conflict goes to review rather
/// than looping.
fn apply_plan(
    config: &EngineConfig,
    vendor: &VendorRecord,
    item_number: String,
    base_revision: u64,
    patch: Patch,
    store: &mut dyn InventoryStore,
) -> RecordOutcome {
    // No-op patch is a successful outcome; skip the write so a second run
    // after a successful apply touches nothing.
    if patch.is_empty() {
        return RecordOutcome::Applied {
            vendor_sku: vendor.vendor_sku.clone(),
            item_number,
            patch,
        };
    }

    match with_retry(&config.retry, || {
        store.apply_patch(&item_number, base_revision, &patch)
    }) {
        Ok(()) => RecordOutcome::Applied {
            vendor_sku: vendor.vendor_sku.clone(),
            item_number,
            patch,
        },
        Err(StoreError::Conflict { .. }) => {
            retry_after_conflict(config, vendor, item_number, store)
        }
        Err(e) => queue_infrastructure(vendor, Some(&item_number), &e),
    }
}

fn retry_after_conflict(
    config: &EngineConfig,
    vendor: &VendorRecord,
    item_number: String,
    store: &mut dyn InventoryStore,
) -> RecordOutcome {
    let fresh = match with_retry(&config.retry, || store.fetch(&item_number)) {
        Ok(fresh) => fresh,
        Err(e) => return queue_infrastructure(vendor, Some(&item_number), &e),
    };

    let plan = match pipeline::plan_matched(vendor, &fresh, &config.policy) {
        Ok(plan) => plan,
        Err(e) => {
            return RecordOutcome::Rejected {
                vendor_sku: vendor.vendor_sku.clone(),
                error: e.to_string(),
            }
        }
    };

    match plan {
        // The fresh snapshot may classify differently (e.g. now anomalous).
        Plan::Queue(entry) => RecordOutcome::Queued(entry),
        Plan::Apply { item_number, base_revision, patch } => {
            if patch.is_empty() {
                return RecordOutcome::Applied {
                    vendor_sku: vendor.vendor_sku.clone(),
                    item_number,
                    patch,
                };
            }
            match with_retry(&config.retry, || {
                store.apply_patch(&item_number, base_revision, &patch)
            }) {
                Ok(()) => RecordOutcome::Applied {
                    vendor_sku: vendor.vendor_sku.clone(),
                    item_number,
                    patch,
                },
                Err(e) => queue_infrastructure(vendor, Some(&item_number), &e),
            }
        }
    }
}

fn queue_infrastructure(
    vendor: &VendorRecord,
    item_number: Option<&str>,
    error: &StoreError,
) -> RecordOutcome {
    let detail = match item_number {
        Some(item) => format!("item '{item}': {error}"),
        None => error.to_string(),
    };
    RecordOutcome::Queued(ReviewEntry {
        record: vendor.clone(),
        reason: ReviewReason::Infrastructure,
        context: None,
        detail: Some(detail),
    })
}

/// Retry transient failures a bounded number of times with doubling backoff.
/// Anything other than `Unavailable` surfaces immediately.
fn with_retry<T>(
    retry: &RetryConfig,
    mut op: impl FnMut() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let mut delay = retry.backoff_ms;
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(StoreError::Unavailable(msg)) => {
                attempt += 1;
                if attempt >= retry.attempts {
                    return Err(StoreError::Unavailable(msg));
                }
                if delay > 0 {
                    std::thread::sleep(Duration::from_millis(delay));
                    delay = delay.saturating_mul(2);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loading
// ---------------------------------------------------------------------------

fn header_index(
    headers: &[String],
    source: &str,
    column: &str,
) -> Result<usize, EngineError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| EngineError::MissingColumn {
            source: source.into(),
            column: column.into(),
        })
}

fn parse_positive(
    source: &str,
    record_id: &str,
    column: &str,
    value: &str,
) -> Result<Decimal, EngineError> {
    let parse_err = || EngineError::FieldParse {
        source: source.into(),
        record_id: record_id.into(),
        column: column.into(),
        value: value.into(),
    };
    let parsed: Decimal = value.trim().parse().map_err(|_| parse_err())?;
    if parsed <= Decimal::ZERO {
        return Err(parse_err());
    }
    Ok(parsed)
}

/// Load the vendor feed. Malformed rows become `VendorRow::Malformed` and the
/// batch continues; a missing column or unreadable header is fatal.
pub fn load_vendor_rows(
    csv_data: &str,
    source: &VendorSource,
) -> Result<Vec<VendorRow>, EngineError> {
    const SRC: &str = "vendor feed";

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = &source.columns;
    let sku_idx = header_index(&headers, SRC, &col.sku)?;
    let upc_idx = header_index(&headers, SRC, &col.upc)?;
    let cost_idx = header_index(&headers, SRC, &col.cost)?;
    let retail_idx = header_index(&headers, SRC, &col.retail)?;
    let desc_idx = header_index(&headers, SRC, &col.description)?;
    let weight_idx = header_index(&headers, SRC, &col.weight)?;

    let mut rows = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                rows.push(VendorRow::Malformed {
                    vendor_sku: format!("row {}", line + 2),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let vendor_sku = record.get(sku_idx).unwrap_or("").trim().to_string();
        if vendor_sku.is_empty() {
            rows.push(VendorRow::Malformed {
                vendor_sku: format!("row {}", line + 2),
                error: "empty vendor SKU".into(),
            });
            continue;
        }

        let parsed = (|| -> Result<VendorRecord, EngineError> {
            Ok(VendorRecord {
                upc: record.get(upc_idx).unwrap_or("").trim().to_string(),
                cost: parse_positive(SRC, &vendor_sku, &col.cost, record.get(cost_idx).unwrap_or(""))?,
                suggested_retail: parse_positive(
                    SRC,
                    &vendor_sku,
                    &col.retail,
                    record.get(retail_idx).unwrap_or(""),
                )?,
                description: record.get(desc_idx).unwrap_or("").trim().to_string(),
                weight: parse_positive(
                    SRC,
                    &vendor_sku,
                    &col.weight,
                    record.get(weight_idx).unwrap_or(""),
                )?,
                vendor_sku: vendor_sku.clone(),
            })
        })();

        match parsed {
            Ok(vendor) => rows.push(VendorRow::Valid(vendor)),
            Err(e) => rows.push(VendorRow::Malformed {
                vendor_sku,
                error: e.to_string(),
            }),
        }
    }

    Ok(rows)
}

/// Load the inventory snapshot. The snapshot is the matching source of
/// truth, so any malformed row is batch-fatal.
pub fn load_inventory_rows(
    csv_data: &str,
    source: &InventorySource,
) -> Result<Vec<InventoryRecord>, EngineError> {
    const SRC: &str = "inventory snapshot";

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::Io(e.to_string()))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = &source.columns;
    let item_idx = header_index(&headers, SRC, &col.item_number)?;
    let upc_idx = header_index(&headers, SRC, &col.upc)?;
    let cost_idx = header_index(&headers, SRC, &col.cost)?;
    let list_idx = header_index(&headers, SRC, &col.list_price)?;
    let weight_idx = header_index(&headers, SRC, &col.weight)?;
    let group_idx = header_index(&headers, SRC, &col.group)?;
    let alt_idx: Vec<usize> = col
        .alt_skus
        .iter()
        .map(|name| header_index(&headers, SRC, name))
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| EngineError::Snapshot(e.to_string()))?;

        let item_number = record.get(item_idx).unwrap_or("").trim().to_string();
        if item_number.is_empty() {
            return Err(EngineError::Snapshot("row with empty item number".into()));
        }

        let group = record.get(group_idx).unwrap_or("").trim();
        let alt_skus = alt_idx
            .iter()
            .map(|&i| {
                let slot = record.get(i).unwrap_or("").trim();
                if slot.is_empty() { None } else { Some(slot.to_string()) }
            })
            .collect();

        rows.push(InventoryRecord {
            upc: record.get(upc_idx).unwrap_or("").trim().to_string(),
            cost: parse_positive(SRC, &item_number, &col.cost, record.get(cost_idx).unwrap_or(""))?,
            list_price: parse_positive(
                SRC,
                &item_number,
                &col.list_price,
                record.get(list_idx).unwrap_or(""),
            )?,
            weight: parse_positive(
                SRC,
                &item_number,
                &col.weight,
                record.get(weight_idx).unwrap_or(""),
            )?,
            group: if group.is_empty() { None } else { Some(group.to_string()) },
            alt_skus,
            item_number,
            revision: 1,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{InventoryColumns, VendorColumns};
    use crate::inventory::MemoryInventory;

    fn vendor_source() -> VendorSource {
        VendorSource {
            file: "vendor.csv".into(),
            columns: VendorColumns {
                sku: "Item".into(),
                upc: "UPC".into(),
                cost: "Cost".into(),
                retail: "SuggRetail".into(),
                description: "Description".into(),
                weight: "Weight".into(),
            },
        }
    }

    fn inventory_source() -> InventorySource {
        InventorySource {
            file: "inventory.csv".into(),
            columns: InventoryColumns {
                item_number: "item".into(),
                upc: "upc".into(),
                cost: "cost".into(),
                list_price: "list".into(),
                weight: "weight".into(),
                group: "group".into(),
                alt_skus: vec!["alt1".into(), "alt2".into(), "alt3".into()],
            },
        }
    }

    #[test]
    fn load_vendor_basic() {
        let csv = "\
Item,UPC,Cost,SuggRetail,Description,Weight
V1,012345678905,5.00,9.99,Widget,2.0
V2,999999999990,3.25,6.49,Gadget,0.5
";
        let rows = load_vendor_rows(csv, &vendor_source()).unwrap();
        assert_eq!(rows.len(), 2);
        match &rows[0] {
            VendorRow::Valid(v) => {
                assert_eq!(v.vendor_sku, "V1");
                assert_eq!(v.upc, "012345678905");
                assert_eq!(v.cost, "5.00".parse().unwrap());
            }
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn malformed_vendor_row_does_not_abort() {
        let csv = "\
Item,UPC,Cost,SuggRetail,Description,Weight
V1,012345678905,not-a-number,9.99,Widget,2.0
V2,999999999990,3.25,6.49,Gadget,0.5
";
        let rows = load_vendor_rows(csv, &vendor_source()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(matches!(&rows[0], VendorRow::Malformed { vendor_sku, .. } if vendor_sku == "V1"));
        assert!(matches!(&rows[1], VendorRow::Valid(_)));
    }

    #[test]
    fn non_positive_vendor_cost_rejected() {
        let csv = "\
Item,UPC,Cost,SuggRetail,Description,Weight
V1,012345678905,0,9.99,Widget,2.0
";
        let rows = load_vendor_rows(csv, &vendor_source()).unwrap();
        assert!(matches!(&rows[0], VendorRow::Malformed { .. }));
    }

    #[test]
    fn missing_vendor_column_is_fatal() {
        let csv = "Item,UPC,Cost,SuggRetail,Description\nV1,1,1,1,x\n";
        let err = load_vendor_rows(csv, &vendor_source()).unwrap_err();
        assert!(err.to_string().contains("Weight"));
    }

    #[test]
    fn load_inventory_basic() {
        let csv = "\
item,upc,cost,list,weight,group,alt1,alt2,alt3
A1,01234567890,5.00,9.99,2.0,,V9,,
";
        let rows = load_inventory_rows(csv, &inventory_source()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item_number, "A1");
        assert_eq!(rows[0].group, None);
        assert_eq!(rows[0].alt_skus, vec![Some("V9".to_string()), None, None]);
        assert_eq!(rows[0].revision, 1);
    }

    #[test]
    fn malformed_inventory_row_is_fatal() {
        let csv = "\
item,upc,cost,list,weight,group,alt1,alt2,alt3
A1,01234567890,bad,9.99,2.0,,,,
";
        assert!(load_inventory_rows(csv, &inventory_source()).is_err());
    }

    #[test]
    fn run_contains_bad_rows_and_applies_good_ones() {
        let config_toml = r#"
name = "unit"

[vendor]
file = "vendor.csv"
[vendor.columns]
sku = "Item"
upc = "UPC"
cost = "Cost"
retail = "SuggRetail"
description = "Description"
weight = "Weight"

[inventory]
file = "inventory.csv"
[inventory.columns]
item_number = "item"
upc = "upc"
cost = "cost"
list_price = "list"
weight = "weight"
group = "group"
alt_skus = ["alt1", "alt2", "alt3"]

[retry]
backoff_ms = 0
"#;
        let config = EngineConfig::from_toml(config_toml).unwrap();

        let inventory_csv = "\
item,upc,cost,list,weight,group,alt1,alt2,alt3
A1,01234567890,5.00,9.99,2.0,Z,V1,,
";
        let store_rows = load_inventory_rows(inventory_csv, &inventory_source()).unwrap();
        let mut store = MemoryInventory::new(store_rows);

        let vendor_csv = "\
Item,UPC,Cost,SuggRetail,Description,Weight
V1,012345678905,5.00,9.99,Widget,2.5
VBAD,not-a-upc,5.00,9.99,Broken,1.0
";
        let rows = load_vendor_rows(vendor_csv, &vendor_source()).unwrap();
        let result = run(&config, &rows, &mut store);

        assert_eq!(result.summary.total_records, 2);
        assert_eq!(result.summary.applied, 1);
        assert_eq!(result.summary.rejected, 1);
        assert_eq!(store.get("A1").unwrap().weight, "2.5".parse().unwrap());
    }
}
