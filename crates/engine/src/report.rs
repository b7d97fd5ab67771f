use std::collections::HashMap;

use crate::model::{RecordOutcome, RunSummary};

/// Compute summary statistics from per-record outcomes.
pub fn compute_summary(outcomes: &[RecordOutcome]) -> RunSummary {
    let mut applied = 0;
    let mut unchanged = 0;
    let mut queued = 0;
    let mut rejected = 0;
    let mut reason_counts: HashMap<String, usize> = HashMap::new();

    for outcome in outcomes {
        match outcome {
            RecordOutcome::Applied { patch, .. } => {
                applied += 1;
                if patch.is_empty() {
                    unchanged += 1;
                }
            }
            RecordOutcome::Queued(entry) => {
                queued += 1;
                *reason_counts.entry(entry.reason.to_string()).or_insert(0) += 1;
            }
            RecordOutcome::Rejected { .. } => rejected += 1,
        }
    }

    RunSummary {
        total_records: outcomes.len(),
        applied,
        unchanged,
        queued,
        rejected,
        reason_counts,
    }
}
