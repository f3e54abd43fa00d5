//! Optimistic concurrency check for version transitions.

use thiserror::Error;

use super::aggregate::FocusArea;
use crate::domain::foundation::{DomainError, ErrorCode, FocusAreaId, VersionId};

/// The client based its edit on a version that is no longer current.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Focus area {focus_area_id} moved on: expected version {expected}, current is {actual}")]
pub struct VersionConflict {
    pub focus_area_id: FocusAreaId,
    pub expected: VersionId,
    pub actual: VersionId,
}

impl From<VersionConflict> for DomainError {
    fn from(conflict: VersionConflict) -> Self {
        DomainError::new(
            ErrorCode::VersionConflict,
            "This focus area was changed by someone else. Refresh and retry.",
        )
        .with_detail("focus_area_id", conflict.focus_area_id.to_string())
        .with_detail("expected_version_id", conflict.expected.to_string())
        .with_detail("current_version_id", conflict.actual.to_string())
    }
}

/// Compare-and-swap precondition on the current-version pointer.
///
/// Must run against a focus area read under the write lock, so the pointer
/// cannot move between the check and the swap.
pub struct ConcurrencyGuard;

impl ConcurrencyGuard {
    pub fn verify(focus_area: &FocusArea, expected: VersionId) -> Result<(), VersionConflict> {
        let actual = focus_area.current_version_id();
        if actual == expected {
            Ok(())
        } else {
            Err(VersionConflict {
                focus_area_id: focus_area.id(),
                expected,
                actual,
            })
        }
    }
}
