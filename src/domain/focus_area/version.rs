//! Immutable focus-area versions.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{FocusAreaId, Timestamp, UserId, ValidationError, VersionId};

/// Maximum length of a revision summary.
pub const MAX_SUMMARY_LEN: usize = 2000;

/// Per-focus-area version counter. Starts at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionNumber(u32);

impl VersionNumber {
    /// The number of a focus area's first version.
    pub const INITIAL: VersionNumber = VersionNumber(1);

    /// Creates a version number; zero is not a valid version.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::invalid_format(
                "version_number",
                "version numbers start at 1",
            ));
        }
        Ok(Self(value))
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The number that follows this one, or `None` on overflow.
    pub fn next(&self) -> Option<VersionNumber> {
        self.0.checked_add(1).map(VersionNumber)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A fully materialized snapshot of a focus area's records.
///
/// Never edited once its records exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusAreaVersion {
    id: VersionId,
    focus_area_id: FocusAreaId,
    version_number: VersionNumber,
    revision_summary: Option<String>,
    created_by: Option<UserId>,
    created_at: Timestamp,
}

impl FocusAreaVersion {
    pub(crate) fn new(
        focus_area_id: FocusAreaId,
        version_number: VersionNumber,
        revision_summary: Option<String>,
        created_by: Option<UserId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: VersionId::new(),
            focus_area_id,
            version_number,
            revision_summary,
            created_by,
            created_at,
        }
    }

    /// Rebuilds a version from storage.
    pub fn reconstitute(
        id: VersionId,
        focus_area_id: FocusAreaId,
        version_number: VersionNumber,
        revision_summary: Option<String>,
        created_by: Option<UserId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            focus_area_id,
            version_number,
            revision_summary,
            created_by,
            created_at,
        }
    }

    pub fn id(&self) -> VersionId {
        self.id
    }

    pub fn focus_area_id(&self) -> FocusAreaId {
        self.focus_area_id
    }

    pub fn version_number(&self) -> VersionNumber {
        self.version_number
    }

    pub fn revision_summary(&self) -> Option<&str> {
        self.revision_summary.as_deref()
    }

    pub fn created_by(&self) -> Option<&UserId> {
        self.created_by.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Normalizes an optional summary: blank becomes `None`, length is capped.
pub fn normalize_summary(summary: Option<String>) -> Result<Option<String>, ValidationError> {
    let Some(summary) = summary else {
        return Ok(None);
    };
    let trimmed = summary.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > MAX_SUMMARY_LEN {
        return Err(ValidationError::too_long("revision_summary", MAX_SUMMARY_LEN, len));
    }
    Ok(Some(trimmed.to_string()))
}
