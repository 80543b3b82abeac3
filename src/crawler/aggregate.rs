//! Merging per-page batches into one ordered dataset

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::warn;

use crate::servant::{Dataset, ServantRecord};

/// Which record survives when two rows share an id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// The first record seen is kept, later ones are dropped
    #[default]
    KeepFirst,
    /// The last record seen replaces earlier ones
    KeepLast,
}

/// Non-fatal notice that fewer records than expected were collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CoverageWarning {
    pub expected: u32,
    pub collected: u32,
    pub shortfall: u32,
}

impl std::fmt::Display for CoverageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "collected {} of {} expected servants ({} missing)",
            self.collected, self.expected, self.shortfall
        )
    }
}

/// How complete an aggregated dataset is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub expected: u32,
    pub collected: u32,
    /// Ids in `1..=expected` with no record
    pub missing_ids: Vec<u32>,
    /// Ids that appeared more than once in the input
    pub duplicate_ids: Vec<u32>,
}

impl Coverage {
    /// Fraction of the expected total that was collected
    pub fn ratio(&self) -> f64 {
        if self.expected == 0 {
            return 1.0;
        }
        f64::from(self.collected) / f64::from(self.expected)
    }

    pub fn warning(&self) -> Option<CoverageWarning> {
        (self.collected < self.expected).then(|| CoverageWarning {
            expected: self.expected,
            collected: self.collected,
            shortfall: self.expected - self.collected,
        })
    }
}

/// Result of aggregation: the dataset and its coverage report
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub dataset: Dataset,
    pub coverage: Coverage,
}

/// Concatenate page batches, order by id and drop duplicates
///
/// Never fails; an empty input yields an empty dataset and a coverage
/// warning for the whole expected total.
pub fn aggregate<I>(page_results: I, expected_total: u32, policy: DuplicatePolicy) -> Aggregate
where
    I: IntoIterator<Item = Vec<ServantRecord>>,
{
    let mut records: Vec<ServantRecord> = page_results.into_iter().flatten().collect();

    // stable, so equal ids stay in the order they were seen
    records.sort_by_key(|record| record.id);

    let mut merged: Vec<ServantRecord> = Vec::with_capacity(records.len());
    let mut duplicates = BTreeSet::new();
    for record in records {
        match merged.last_mut() {
            Some(previous) if previous.id == record.id => {
                duplicates.insert(record.id);
                if policy == DuplicatePolicy::KeepLast {
                    *previous = record;
                }
            }
            _ => merged.push(record),
        }
    }

    let present: BTreeSet<u32> = merged.iter().map(|record| record.id).collect();
    let coverage = Coverage {
        expected: expected_total,
        collected: u32::try_from(merged.len()).unwrap_or(u32::MAX),
        missing_ids: (1..=expected_total)
            .filter(|id| !present.contains(id))
            .collect(),
        duplicate_ids: duplicates.into_iter().collect(),
    };

    if !coverage.duplicate_ids.is_empty() {
        warn!(
            "Dropped duplicate rows for ids {:?} ({:?})",
            coverage.duplicate_ids, policy
        );
    }
    if let Some(warning) = coverage.warning() {
        warn!("Incomplete dataset: {}", warning);
    }

    Aggregate {
        dataset: Dataset::from_records(merged),
        coverage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, name: &str) -> ServantRecord {
        ServantRecord::new(id, name)
    }

    #[test]
    fn test_sorted_across_pages() {
        let pages = vec![
            vec![record(102, "b"), record(101, "a")],
            vec![record(2, "y"), record(1, "x")],
        ];
        let result = aggregate(pages, 4, DuplicatePolicy::KeepFirst);

        let ids: Vec<u32> = result.dataset.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 101, 102]);
        assert_eq!(result.coverage.warning(), None);
    }

    #[test]
    fn test_empty_input() {
        let result = aggregate(Vec::<Vec<ServantRecord>>::new(), 428, DuplicatePolicy::KeepFirst);

        assert!(result.dataset.is_empty());
        let warning = result.coverage.warning().unwrap();
        assert_eq!(warning.shortfall, 428);
        assert_eq!(result.coverage.missing_ids.len(), 428);
    }

    #[test]
    fn test_duplicate_keeps_first_seen() {
        let pages = vec![vec![record(5, "first")], vec![record(5, "second")]];
        let result = aggregate(pages, 1, DuplicatePolicy::KeepFirst);

        assert_eq!(result.dataset.len(), 1);
        assert_eq!(result.dataset.records()[0].name, "first");
        assert_eq!(result.coverage.duplicate_ids, vec![5]);
    }

    #[test]
    fn test_duplicate_keeps_last_seen() {
        let pages = vec![vec![record(5, "first")], vec![record(5, "second")]];
        let result = aggregate(pages, 1, DuplicatePolicy::KeepLast);

        assert_eq!(result.dataset.records()[0].name, "second");
    }

    #[test]
    fn test_gaps_reported() {
        let pages = vec![vec![record(1, "a"), record(3, "c")]];
        let result = aggregate(pages, 4, DuplicatePolicy::KeepFirst);

        assert_eq!(result.coverage.missing_ids, vec![2, 4]);
        assert_eq!(result.coverage.warning().unwrap().shortfall, 2);
        assert!((result.coverage.ratio() - 0.5).abs() < f64::EPSILON);
    }
}
