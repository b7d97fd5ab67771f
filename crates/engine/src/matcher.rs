use std::collections::BTreeSet;

use crate::model::{InventoryRecord, MatchResult};

/// Classify a UPC-prefix lookup's candidate set.
///
/// Multiple hits that share one `item_number` are duplicate barcode rows
/// pointing at the same logical item, not a real duplicate. Only two or more
/// distinct item numbers count as ambiguous.
pub fn classify(mut candidates: Vec<InventoryRecord>) -> MatchResult {
    if candidates.is_empty() {
        return MatchResult::NoMatch;
    }

    let distinct_items: BTreeSet<String> =
        candidates.iter().map(|c| c.item_number.clone()).collect();

    if distinct_items.len() == 1 {
        // Any hit is a valid representative; they all name the same item.
        return MatchResult::Unique(candidates.remove(0));
    }

    let distinct = distinct_items.len();
    MatchResult::Ambiguous {
        candidates,
        distinct_items: distinct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn inv(item_number: &str, upc: &str) -> InventoryRecord {
        InventoryRecord {
            item_number: item_number.into(),
            alt_skus: vec![None, None, None],
            upc: upc.into(),
            cost: Decimal::new(500, 2),
            list_price: Decimal::new(999, 2),
            weight: Decimal::new(20, 1),
            group: None,
            revision: 1,
        }
    }

    #[test]
    fn zero_candidates_is_no_match() {
        assert!(matches!(classify(vec![]), MatchResult::NoMatch));
    }

    #[test]
    fn single_candidate_is_unique() {
        let result = classify(vec![inv("A1", "01234567890")]);
        match result {
            MatchResult::Unique(rec) => assert_eq!(rec.item_number, "A1"),
            other => panic!("expected Unique, got {other:?}"),
        }
    }

    #[test]
    fn same_item_number_twice_is_unique() {
        // Duplicate barcode rows for one logical item must not be flagged.
        let result = classify(vec![inv("A1", "01234567890"), inv("A1", "01234567891")]);
        match result {
            MatchResult::Unique(rec) => assert_eq!(rec.item_number, "A1"),
            other => panic!("expected Unique, got {other:?}"),
        }
    }

    #[test]
    fn distinct_item_numbers_are_ambiguous() {
        let result = classify(vec![inv("A1", "01234567890"), inv("A2", "01234567890")]);
        match result {
            MatchResult::Ambiguous { candidates, distinct_items } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(distinct_items, 2);
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn three_hits_two_items_counts_two() {
        let result = classify(vec![inv("A1", "0"), inv("A2", "0"), inv("A1", "0")]);
        match result {
            MatchResult::Ambiguous { distinct_items, .. } => assert_eq!(distinct_items, 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }
}
