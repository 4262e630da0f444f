use serde::Serialize;

use crate::domain::errors::{ErrorKind, RagError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkFailure {
    pub id: i64,
    pub error_kind: ErrorKind,
}

/// Outcome of an operation applied to a set of ids. Failures are isolated
/// per id and never abort the rest of the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BulkOutcome {
    pub affected_count: usize,
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    pub fn record(&mut self, id: i64, result: Result<(), RagError>) {
        match result {
            Ok(()) => self.affected_count += 1,
            Err(e) => {
                tracing::warn!("Bulk operation failed for id {}: {}", id, e);
                self.failures.push(BulkFailure {
                    id,
                    error_kind: e.kind(),
                });
            }
        }
    }

    pub fn sort_failures(&mut self) {
        self.failures.sort_by_key(|failure| failure.id);
    }
}
