//! Error taxonomy for the catalog pipeline.
//!
//! Hard failures are [`CatalogError`] values and travel through `Result`.
//! Soft failures never abort a batch or a request; they are reported as
//! [`Diagnostic`] entries attached to whatever output was still produced.
//!
//! | Condition | Batch (materializer) | Request (query service) |
//! |-----------|----------------------|-------------------------|
//! | Source unavailable | job fails, old snapshot kept | empty list + diagnostic |
//! | Some columns missing | fields empty + diagnostic | n/a |
//! | All columns missing | job fails | empty list + diagnostic |
//! | Malformed embedded JSON | field empty + diagnostic | field empty + diagnostic |
//! | Lookup miss | n/a | [`CatalogError::NotFound`] |
//! | Snapshot older than source | n/a | served, flagged stale |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard failures raised by record sources and lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The record source could not be opened or read.
    #[error("record source unavailable: {0}")]
    SourceUnavailable(String),

    /// None of the expected attribute columns are present.
    #[error("record source has none of the expected columns (found: {})", found.join(", "))]
    SchemaDrift { found: Vec<String> },

    /// Single-record lookup found nothing for the key.
    #[error("vehicle not found: {0}")]
    NotFound(String),
}

/// A non-fatal condition observed while producing a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The record source could not be read; output came from elsewhere or is empty.
    SourceUnavailable { message: String },
    /// Some expected columns were absent and treated as empty.
    SchemaDrift { missing: Vec<String> },
    /// An embedded JSON field failed to parse and was replaced by its default.
    MalformedEmbeddedData { vin: String, field: String },
    /// The snapshot predates the record source.
    StaleSnapshot {
        snapshot_modified: String,
        source_modified: String,
    },
    /// The on-demand scan exceeded its time budget.
    ScanTimedOut { after_ms: u64 },
    /// No snapshot was available to serve from.
    SnapshotMissing,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::SourceUnavailable { message } => {
                write!(f, "record source unavailable: {}", message)
            }
            Diagnostic::SchemaDrift { missing } => {
                write!(f, "missing columns: {}", missing.join(", "))
            }
            Diagnostic::MalformedEmbeddedData { vin, field } => {
                write!(f, "malformed {} on {}", field, vin)
            }
            Diagnostic::StaleSnapshot {
                snapshot_modified,
                source_modified,
            } => write!(
                f,
                "snapshot from {} is older than source ({})",
                snapshot_modified, source_modified
            ),
            Diagnostic::ScanTimedOut { after_ms } => {
                write!(f, "source scan timed out after {}ms", after_ms)
            }
            Diagnostic::SnapshotMissing => write!(f, "no snapshot available"),
        }
    }
}
