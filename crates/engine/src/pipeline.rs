use crate::altsku::{self, Allocation};
use crate::anomaly;
use crate::config::PolicyConfig;
use crate::error::EngineError;
use crate::matcher;
use crate::model::{InventoryRecord, MatchResult, Patch, ReviewEntry, ReviewReason, VendorRecord};
use crate::reconcile;

/// Terminal decision for one vendor record against one inventory snapshot.
#[derive(Debug, Clone)]
pub enum Plan {
    /// Apply this patch (possibly empty) to the matched item.
    Apply {
        item_number: String,
        base_revision: u64,
        patch: Patch,
    },
    /// Route the record to the review queue instead of writing.
    Queue(ReviewEntry),
}

/// Classify a lookup's candidate set and plan the record.
///
/// Pure per-record state machine:
/// `Match → {Review(NEW), Review(DUPLICATE), Matched}`,
/// `Matched → AnomalyCheck → Allocate → Reconcile → Apply`.
/// Exactly one terminal is reached; no side effects.
pub fn plan(
    vendor: &VendorRecord,
    candidates: Vec<InventoryRecord>,
    policy: &PolicyConfig,
) -> Result<Plan, EngineError> {
    match matcher::classify(candidates) {
        MatchResult::NoMatch => Ok(Plan::Queue(ReviewEntry {
            record: vendor.clone(),
            reason: ReviewReason::New,
            context: None,
            detail: None,
        })),
        MatchResult::Ambiguous { candidates, distinct_items } => {
            let items: Vec<&str> = candidates.iter().map(|c| c.item_number.as_str()).collect();
            Ok(Plan::Queue(ReviewEntry {
                record: vendor.clone(),
                reason: ReviewReason::Duplicate,
                context: None,
                detail: Some(format!(
                    "{distinct_items} distinct items share this key: {}",
                    items.join(", ")
                )),
            }))
        }
        MatchResult::Unique(inventory) => plan_matched(vendor, &inventory, policy),
    }
}

/// Plan a vendor record against its already-matched inventory snapshot.
///
/// Also the re-planning entry point after a write conflict, where the
/// caller has re-fetched the record and the match itself still stands.
pub fn plan_matched(
    vendor: &VendorRecord,
    inventory: &InventoryRecord,
    policy: &PolicyConfig,
) -> Result<Plan, EngineError> {
    if let Some(reason) = anomaly::check(vendor, inventory, policy.anomaly_ratio)? {
        // Large swings get no patch at all, alt-SKU and weight included.
        return Ok(Plan::Queue(ReviewEntry {
            record: vendor.clone(),
            reason,
            context: Some(inventory.clone()),
            detail: None,
        }));
    }

    let staged_slot = match altsku::allocate(&vendor.vendor_sku, inventory) {
        Allocation::AlreadyPresent => None,
        Allocation::Slot(index) => Some(index),
        Allocation::Exhausted => {
            return Ok(Plan::Queue(ReviewEntry {
                record: vendor.clone(),
                reason: ReviewReason::SlotExhausted,
                context: Some(inventory.clone()),
                detail: Some(format!(
                    "all {} alt-SKU slots occupied",
                    inventory.alt_skus.len()
                )),
            }));
        }
    };

    let patch = reconcile::compute_patch(vendor, inventory, staged_slot, &policy.default_group);

    Ok(Plan::Apply {
        item_number: inventory.item_number.clone(),
        base_revision: inventory.revision,
        patch,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn vendor(sku: &str, cost: &str, retail: &str, weight: &str) -> VendorRecord {
        VendorRecord {
            vendor_sku: sku.into(),
            upc: "012345678905".into(),
            cost: dec(cost),
            suggested_retail: dec(retail),
            description: "widget".into(),
            weight: dec(weight),
        }
    }

    fn inv(item_number: &str, cost: &str, list: &str) -> InventoryRecord {
        InventoryRecord {
            item_number: item_number.into(),
            alt_skus: vec![None, None, None],
            upc: "01234567890".into(),
            cost: dec(cost),
            list_price: dec(list),
            weight: dec("2.0"),
            group: Some("Z".into()),
            revision: 1,
        }
    }

    fn policy() -> PolicyConfig {
        PolicyConfig::default()
    }

    #[test]
    fn no_candidates_queues_new() {
        let plan = plan(&vendor("V1", "5", "10", "2.0"), vec![], &policy()).unwrap();
        match plan {
            Plan::Queue(entry) => assert_eq!(entry.reason, ReviewReason::New),
            other => panic!("expected Queue, got {other:?}"),
        }
    }

    #[test]
    fn two_items_queue_duplicate_with_detail() {
        let candidates = vec![inv("A1", "5", "10"), inv("A2", "5", "10")];
        let plan = plan(&vendor("V1", "5", "10", "2.0"), candidates, &policy()).unwrap();
        match plan {
            Plan::Queue(entry) => {
                assert_eq!(entry.reason, ReviewReason::Duplicate);
                let detail = entry.detail.unwrap();
                assert!(detail.contains("A1") && detail.contains("A2"));
            }
            other => panic!("expected Queue, got {other:?}"),
        }
    }

    #[test]
    fn anomaly_short_circuits_before_allocation() {
        // Ratio 2.5 on cost; slots are full, but the anomaly wins.
        let mut rec = inv("A1", "4.00", "10");
        rec.alt_skus = vec![Some("X1".into()), Some("X2".into()), Some("X3".into())];
        let plan = plan(&vendor("V1", "10.00", "10", "2.0"), vec![rec], &policy()).unwrap();
        match plan {
            Plan::Queue(entry) => {
                assert_eq!(entry.reason, ReviewReason::CostAnomaly);
                assert!(entry.context.is_some());
            }
            other => panic!("expected Queue, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_slots_queue_without_partial_patch() {
        let mut rec = inv("A1", "5.00", "10");
        rec.weight = dec("1.0"); // weight differs, but nothing is applied
        rec.alt_skus = vec![Some("X1".into()), Some("X2".into()), Some("X3".into())];
        let plan = plan(&vendor("V1", "5.00", "10", "2.0"), vec![rec], &policy()).unwrap();
        match plan {
            Plan::Queue(entry) => assert_eq!(entry.reason, ReviewReason::SlotExhausted),
            other => panic!("expected Queue, got {other:?}"),
        }
    }

    #[test]
    fn clean_match_plans_apply() {
        let plan = plan(&vendor("V1", "5.00", "10", "2.5"), vec![inv("A1", "5.00", "10")], &policy())
            .unwrap();
        match plan {
            Plan::Apply { item_number, base_revision, patch } => {
                assert_eq!(item_number, "A1");
                assert_eq!(base_revision, 1);
                assert_eq!(patch.weight, Some(dec("2.5")));
                assert_eq!(patch.alt_sku, Some((0, "V1".to_string())));
            }
            other => panic!("expected Apply, got {other:?}"),
        }
    }

    #[test]
    fn identical_record_plans_empty_patch() {
        let mut rec = inv("A1", "5.00", "10");
        rec.alt_skus[0] = Some("V1".into());
        let plan = plan(&vendor("V1", "5.00", "10", "2.0"), vec![rec], &policy()).unwrap();
        match plan {
            Plan::Apply { patch, .. } => assert!(patch.is_empty()),
            other => panic!("expected Apply, got {other:?}"),
        }
    }

    #[test]
    fn planning_is_idempotent_on_same_snapshot() {
        let v = vendor("V1", "6.00", "12.99", "2.5");
        let rec = inv("A1", "5.00", "9.99");
        let first = plan_matched(&v, &rec, &policy()).unwrap();
        let second = plan_matched(&v, &rec, &policy()).unwrap();
        match (first, second) {
            (Plan::Apply { patch: a, .. }, Plan::Apply { patch: b, .. }) => assert_eq!(a, b),
            other => panic!("expected two Apply plans, got {other:?}"),
        }
    }
}
