//! Review queue files: one file per review reason, plus a log of applied
//! records, written per run for the human reviewer.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use catref_engine::model::{Patch, RecordOutcome, ReviewEntry, ReviewReason};

const HEADERS: &[(ReviewReason, &str)] = &[
    (ReviewReason::New, "These products have no inventory match. Enter them manually."),
    (ReviewReason::Duplicate, "Multiple inventory items share this product's UPC key. Fix that first."),
    (ReviewReason::CostAnomaly, "Cost changed wildly. Double check the listing before updating."),
    (ReviewReason::PriceAnomaly, "List price changed wildly. Double check the listing before updating."),
    (ReviewReason::SlotExhausted, "No free alt-SKU slot. Free one up or retire an old identifier."),
    (ReviewReason::Infrastructure, "The inventory system could not be reached or kept conflicting."),
];

fn file_name(reason: ReviewReason) -> String {
    format!("{reason}.txt")
}

fn entry_line(entry: &ReviewEntry) -> String {
    let mut line = format!(
        "{}\tupc={}\tcost={}\tretail={}\t{}",
        entry.record.vendor_sku,
        entry.record.upc,
        entry.record.cost,
        entry.record.suggested_retail,
        entry.record.description,
    );
    if let Some(context) = &entry.context {
        let _ = write!(
            line,
            "\t[matched {} cost={} list={}]",
            context.item_number, context.cost, context.list_price
        );
    }
    if let Some(detail) = &entry.detail {
        let _ = write!(line, "\t({detail})");
    }
    line
}

fn patch_line(vendor_sku: &str, item_number: &str, patch: &Patch) -> String {
    if patch.is_empty() {
        return format!("{vendor_sku}\t-> {item_number}\tno change");
    }
    let mut fields = Vec::new();
    if let Some(weight) = patch.weight {
        fields.push(format!("weight={weight}"));
    }
    if let Some(ref group) = patch.group {
        fields.push(format!("group={group}"));
    }
    if let Some(cost) = patch.cost {
        fields.push(format!("cost={cost}"));
    }
    if let Some(list_price) = patch.list_price {
        fields.push(format!("list_price={list_price}"));
    }
    if let Some((slot, ref sku)) = patch.alt_sku {
        fields.push(format!("alt_sku[{slot}]={sku}"));
    }
    format!("{vendor_sku}\t-> {item_number}\t{}", fields.join(" "))
}

/// Write per-reason review files and `applied.txt` into `dir`.
///
/// Only non-empty groups produce a file. Returns the file names written.
pub fn write_review_files(dir: &Path, outcomes: &[RecordOutcome]) -> std::io::Result<Vec<String>> {
    std::fs::create_dir_all(dir)?;

    let mut by_reason: BTreeMap<String, Vec<&ReviewEntry>> = BTreeMap::new();
    let mut applied_lines = Vec::new();

    for outcome in outcomes {
        match outcome {
            RecordOutcome::Queued(entry) => {
                by_reason.entry(entry.reason.to_string()).or_default().push(entry);
            }
            RecordOutcome::Applied { vendor_sku, item_number, patch } => {
                applied_lines.push(patch_line(vendor_sku, item_number, patch));
            }
            RecordOutcome::Rejected { .. } => {}
        }
    }

    let mut written = Vec::new();

    for (reason, header) in HEADERS {
        let Some(entries) = by_reason.get(&reason.to_string()) else {
            continue;
        };
        let mut body = format!("{header}\n\n");
        for entry in entries {
            body.push_str(&entry_line(entry));
            body.push('\n');
        }
        let name = file_name(*reason);
        std::fs::write(dir.join(&name), body)?;
        written.push(name);
    }

    if !applied_lines.is_empty() {
        let mut body = String::from("These products were cross referenced and updated.\n\n");
        for line in &applied_lines {
            body.push_str(line);
            body.push('\n');
        }
        std::fs::write(dir.join("applied.txt"), body)?;
        written.push("applied.txt".into());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use catref_engine::model::VendorRecord;
    use rust_decimal::Decimal;

    fn vendor(sku: &str) -> VendorRecord {
        VendorRecord {
            vendor_sku: sku.into(),
            upc: "012345678905".into(),
            cost: Decimal::new(500, 2),
            suggested_retail: Decimal::new(999, 2),
            description: "Widget".into(),
            weight: Decimal::new(20, 1),
        }
    }

    #[test]
    fn writes_only_non_empty_groups() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![
            RecordOutcome::Queued(ReviewEntry {
                record: vendor("V1"),
                reason: ReviewReason::New,
                context: None,
                detail: None,
            }),
            RecordOutcome::Applied {
                vendor_sku: "V2".into(),
                item_number: "A1".into(),
                patch: Patch { weight: Some(Decimal::new(25, 1)), ..Patch::default() },
            },
        ];

        let written = write_review_files(dir.path(), &outcomes).unwrap();
        assert_eq!(written, vec!["new.txt".to_string(), "applied.txt".to_string()]);

        let new_body = std::fs::read_to_string(dir.path().join("new.txt")).unwrap();
        assert!(new_body.contains("V1"));
        assert!(new_body.contains("no inventory match"));
        assert!(!dir.path().join("duplicate.txt").exists());

        let applied_body = std::fs::read_to_string(dir.path().join("applied.txt")).unwrap();
        assert!(applied_body.contains("V2\t-> A1\tweight=2.5"));
    }

    #[test]
    fn duplicate_detail_included() {
        let dir = tempfile::tempdir().unwrap();
        let outcomes = vec![RecordOutcome::Queued(ReviewEntry {
            record: vendor("V1"),
            reason: ReviewReason::Duplicate,
            context: None,
            detail: Some("2 distinct items share this key: A1, A2".into()),
        })];
        write_review_files(dir.path(), &outcomes).unwrap();
        let body = std::fs::read_to_string(dir.path().join("duplicate.txt")).unwrap();
        assert!(body.contains("A1, A2"));
    }
}
