use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::EmployeeRecord;
use crate::observability::metrics;
use crate::pipeline::processing::quality_gate::FlaggedRecord;

/// Which record survives when several share an identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first row in file order
    #[default]
    KeepFirst,
    /// Keep the last row in file order, at the position of that last row
    KeepLast,
}

/// Anything with a natural key to deduplicate on
pub trait Keyed {
    fn key(&self) -> Option<&str>;
}

impl Keyed for EmployeeRecord {
    fn key(&self) -> Option<&str> {
        self.employee_id.as_deref()
    }
}

impl Keyed for FlaggedRecord {
    fn key(&self) -> Option<&str> {
        self.record.employee_id.as_deref()
    }
}

/// Result of a deduplication pass
#[derive(Debug, Clone)]
pub struct DedupOutcome<T> {
    pub records: Vec<T>,
    pub removed: usize,
    /// Identifiers that had more than one row, in first-seen order
    pub duplicate_ids: Vec<String>,
    /// Rows without an identifier; all retained since they cannot collide
    pub without_key: usize,
}

/// Collapse rows sharing an identifier down to one, per `policy`.
///
/// Relative order of the retained rows is preserved. Idempotent.
pub fn deduplicate<T: Keyed>(records: Vec<T>, policy: DuplicatePolicy) -> DedupOutcome<T> {
    let total = records.len();

    // index of the row that wins for each key
    let mut winner: HashMap<String, usize> = HashMap::new();
    let mut seen_count: HashMap<String, usize> = HashMap::new();
    let mut duplicate_ids = Vec::new();
    let mut without_key = 0;

    for (index, record) in records.iter().enumerate() {
        let Some(key) = record.key() else {
            without_key += 1;
            continue;
        };
        let count = seen_count.entry(key.to_string()).or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicate_ids.push(key.to_string());
        }
        match policy {
            DuplicatePolicy::KeepFirst => {
                winner.entry(key.to_string()).or_insert(index);
            }
            DuplicatePolicy::KeepLast => {
                winner.insert(key.to_string(), index);
            }
        }
    }

    let retained: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter(|(index, record)| match record.key() {
            Some(key) => winner.get(key) == Some(index),
            None => true,
        })
        .map(|(_, record)| record)
        .collect();

    let removed = total - retained.len();
    for id in &duplicate_ids {
        debug!(employee_id = %id, "Duplicate identifier collapsed");
    }
    metrics::dedup::completed(removed, retained.len());
    info!(removed, retained = retained.len(), ?policy, "Deduplication complete");

    DedupOutcome {
        records: retained,
        removed,
        duplicate_ids,
        without_key,
    }
}
