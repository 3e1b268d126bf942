//! Aggregation model: fold profiling entries into per-collection counts and
//! normalize them into per-second rates.

use crate::error::StatsError;
use crate::log::{KeyExtractor, RawLogEntry};
use std::collections::BTreeMap;

/// Operation types every collection reports, in table column order.
pub const CANONICAL_OP_TYPES: [&str; 5] = ["query", "insert", "getmore", "update", "remove"];

/// collection -> op type -> number of profiled operations.
pub type AggregateCounts = BTreeMap<String, BTreeMap<String, u64>>;

/// collection -> op type -> operations per second.
pub type Rates = BTreeMap<String, BTreeMap<String, f64>>;

/// Accumulates counts one entry at a time.
#[derive(Debug, Clone, Default)]
pub struct ProfileAggregator {
    extractor: KeyExtractor,
    counts: AggregateCounts,
    seen: u64,
    skipped: u64,
}

impl ProfileAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: &RawLogEntry) {
        self.seen += 1;
        match self.extractor.extract(entry) {
            Some(key) => {
                *self
                    .counts
                    .entry(key.collection)
                    .or_default()
                    .entry(key.op_type)
                    .or_default() += 1;
            }
            None => {
                self.skipped += 1;
                tracing::trace!(?entry, "skipping profiling entry");
            }
        }
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn finish(self) -> AggregateCounts {
        tracing::debug!(
            seen = self.seen,
            skipped = self.skipped,
            collections = self.counts.len(),
            "aggregation finished"
        );
        self.counts
    }
}

/// Count every matching entry once under its `(collection, op_type)`.
pub fn aggregate<'a, I>(entries: I) -> AggregateCounts
where
    I: IntoIterator<Item = &'a RawLogEntry>,
{
    let mut agg = ProfileAggregator::new();
    for entry in entries {
        agg.push(entry);
    }
    agg.finish()
}

/// Divide counts by the collection window.
///
/// Canonical op types default to 0.0; any other observed type keeps its own
/// key.
pub fn to_rates(counts: &AggregateCounts, interval_secs: f64) -> Result<Rates, StatsError> {
    if !interval_secs.is_finite() || interval_secs <= 0.0 {
        return Err(StatsError::InvalidArgument(format!(
            "interval must be a positive number of seconds, got {}",
            interval_secs
        )));
    }

    let mut rates = Rates::new();
    for (collection, by_op) in counts {
        let mut row: BTreeMap<String, f64> = CANONICAL_OP_TYPES
            .iter()
            .map(|op| (op.to_string(), 0.0))
            .collect();
        for (op, count) in by_op {
            row.insert(op.clone(), *count as f64 / interval_secs);
        }
        rates.insert(collection.clone(), row);
    }

    Ok(rates)
}

/// Observed op types outside the canonical five, sorted.
pub fn extra_op_types(rates: &Rates) -> Vec<String> {
    let mut extra: Vec<String> = rates
        .values()
        .flat_map(|row| row.keys())
        .filter(|op| !CANONICAL_OP_TYPES.contains(&op.as_str()))
        .cloned()
        .collect();
    extra.sort();
    extra.dedup();
    extra
}
