//! Focus area aggregate root.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{FocusAreaId, PackageId, Timestamp, ValidationError, VersionId};

/// Maximum length of a focus-area name.
pub const MAX_FOCUS_AREA_NAME_LEN: usize = 120;

/// A named, independently versioned content bucket inside a package.
///
/// The only mutable state is the `current_version_id` pointer and the
/// soft-delete flag; content lives in immutable versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusArea {
    id: FocusAreaId,
    package_id: PackageId,
    name: String,
    is_deleted: bool,
    current_version_id: VersionId,
    created_at: Timestamp,
}

impl FocusArea {
    /// Creates a focus area whose first version is `initial_version_id`.
    pub fn new(
        id: FocusAreaId,
        package_id: PackageId,
        name: impl Into<String>,
        initial_version_id: VersionId,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = validate_name(name.into())?;
        Ok(Self {
            id,
            package_id,
            name,
            is_deleted: false,
            current_version_id: initial_version_id,
            created_at,
        })
    }

    /// Rebuilds a focus area from storage.
    pub fn reconstitute(
        id: FocusAreaId,
        package_id: PackageId,
        name: String,
        is_deleted: bool,
        current_version_id: VersionId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            package_id,
            name,
            is_deleted,
            current_version_id,
            created_at,
        }
    }

    /// Moves the current-version pointer.
    pub(crate) fn point_to(&mut self, version_id: VersionId) {
        self.current_version_id = version_id;
    }

    /// Soft-deletes the focus area. Versions are kept.
    pub(crate) fn mark_deleted(&mut self) {
        self.is_deleted = true;
    }

    pub fn id(&self) -> FocusAreaId {
        self.id
    }

    pub fn package_id(&self) -> PackageId {
        self.package_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn current_version_id(&self) -> VersionId {
        self.current_version_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Normalizes and validates a focus-area name.
pub fn validate_name(name: String) -> Result<String, ValidationError> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(ValidationError::empty_field("focus_area_name"));
    }
    let len = name.chars().count();
    if len > MAX_FOCUS_AREA_NAME_LEN {
        return Err(ValidationError::too_long(
            "focus_area_name",
            MAX_FOCUS_AREA_NAME_LEN,
            len,
        ));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focus_area(name: &str) -> Result<FocusArea, ValidationError> {
        FocusArea::new(
            FocusAreaId::new(),
            PackageId::new(),
            name,
            VersionId::new(),
            Timestamp::now(),
        )
    }

    #[test]
    fn new_focus_area_points_at_initial_version() {
        let version = VersionId::new();
        let fa = FocusArea::new(FocusAreaId::new(), PackageId::new(), "Risks", version, Timestamp::now())
            .unwrap();
        assert_eq!(fa.current_version_id(), version);
        assert!(!fa.is_deleted());
    }

    #[test]
    fn name_is_trimmed_and_required() {
        assert_eq!(focus_area("  Risks ").unwrap().name(), "Risks");
        assert!(focus_area("").is_err());
    }

    #[test]
    fn name_length_is_capped() {
        let long = "r".repeat(MAX_FOCUS_AREA_NAME_LEN + 1);
        assert!(matches!(focus_area(&long), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn point_to_moves_pointer() {
        let mut fa = focus_area("Risks").unwrap();
        let next = VersionId::new();
        fa.point_to(next);
        assert_eq!(fa.current_version_id(), next);
    }

    #[test]
    fn mark_deleted_is_soft() {
        let mut fa = focus_area("Risks").unwrap();
        let version = fa.current_version_id();
        fa.mark_deleted();
        assert!(fa.is_deleted());
        assert_eq!(fa.current_version_id(), version);
    }
}
