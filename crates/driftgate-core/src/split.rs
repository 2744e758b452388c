//! Confidence-based partition of a change set.

use serde::{Deserialize, Serialize};

use crate::domain::ChangeSet;

/// Result of splitting a change set by confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitChangeSet {
    /// High/medium confidence records, carrying the set-level summary and
    /// risk assessment. This is the only side risk evaluation sees.
    pub included: ChangeSet,

    /// Low/noise confidence records. Informational only: empty summary,
    /// no risk assessment, never consulted by the gate.
    pub excluded: ChangeSet,
}

/// Partition records into included (high/medium) and excluded (low/noise).
///
/// The partition is stable: relative order within each side matches the
/// original. Set-level fields are copied only onto the included side.
pub fn split(set: ChangeSet) -> SplitChangeSet {
    let ChangeSet {
        records,
        overall_summary,
        risk,
    } = set;

    let (included_records, excluded_records): (Vec<_>, Vec<_>) = records
        .into_iter()
        .partition(|record| record.confidence.is_included());

    SplitChangeSet {
        included: ChangeSet {
            records: included_records,
            overall_summary,
            risk,
        },
        excluded: ChangeSet {
            records: excluded_records,
            ..ChangeSet::empty()
        },
    }
}
