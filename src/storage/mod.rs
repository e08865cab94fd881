pub mod sqlite;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::progress::progress_bar;

pub use sqlite::SqliteStore;

/// Address of one persisted array: a document in a collection, and the field
/// holding the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionTarget {
    pub collection: &'static str,
    pub doc_id: &'static str,
    pub data_key: &'static str,
}

impl std::fmt::Display for CollectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}.{}", self.collection, self.doc_id, self.data_key)
    }
}

pub const TRENDS: CollectionTarget = CollectionTarget {
    collection: "trends",
    doc_id: "skill_historical_trends",
    data_key: "trends",
};

pub const FORECASTS: CollectionTarget = CollectionTarget {
    collection: "forecasts",
    doc_id: "skill_forecasts",
    data_key: "forecasts",
};

/// Document sink with upsert semantics.
///
/// `reset` creates or empties the document and refreshes its timestamp;
/// `append` adds one chunk and refreshes it again. Chunks are independent:
/// nothing rolls back earlier chunks when a later one fails.
pub trait ResultStore {
    fn reset(&self, target: CollectionTarget) -> Result<()>;
    fn append(&self, target: CollectionTarget, chunk: &[Value]) -> Result<()>;
    fn load(&self, target: CollectionTarget) -> Result<Vec<Value>>;
    fn last_updated(&self, target: CollectionTarget) -> Result<Option<DateTime<Utc>>>;
}

#[derive(Debug, Default)]
pub struct SaveReport {
    pub records: usize,
    pub chunks_written: usize,
    pub errors: Vec<Error>,
}

impl SaveReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Overwrites `target` with `records`, written in chunks of `chunk_size`.
///
/// A failed chunk is reported and the remaining chunks are still attempted.
/// There is no retry. If the initial reset fails, no chunks are written.
pub fn save_bulk<S, T>(
    store: &S,
    target: CollectionTarget,
    records: &[T],
    chunk_size: usize,
    show_progress: bool,
) -> SaveReport
where
    S: ResultStore + ?Sized,
    T: Serialize,
{
    let chunk_size = chunk_size.max(1);
    let mut report = SaveReport {
        records: records.len(),
        ..Default::default()
    };

    tracing::info!("Saving {} records to {}", records.len(), target);

    let values = match records
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()
    {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Could not serialize {}: {}", target, e);
            report.errors.push(Error::Persistence {
                target: target.to_string(),
                chunk: 0,
                reason: e.to_string(),
            });
            return report;
        }
    };

    if let Err(e) = store.reset(target) {
        tracing::warn!("Could not reset {}: {}", target, e);
        report.errors.push(Error::Persistence {
            target: target.to_string(),
            chunk: 0,
            reason: e.to_string(),
        });
        return report;
    }

    let chunks = values.len().div_ceil(chunk_size);
    let pb = progress_bar(chunks as u64, target.data_key, show_progress);

    for (index, chunk) in values.chunks(chunk_size).enumerate() {
        match store.append(target, chunk) {
            Ok(()) => report.chunks_written += 1,
            Err(e) => {
                tracing::warn!("Chunk {} of {} failed: {}", index + 1, target, e);
                report.errors.push(Error::Persistence {
                    target: target.to_string(),
                    chunk: index + 1,
                    reason: e.to_string(),
                });
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    if report.is_complete() {
        tracing::info!(
            "{} saved ({} records in {} chunks)",
            target,
            report.records,
            report.chunks_written
        );
    } else {
        tracing::warn!(
            "{} partially saved: {} of {} chunks failed",
            target,
            report.errors.len(),
            chunks
        );
    }

    report
}
