//! Focus area reader port (read side / CQRS queries).
//!
//! Reads need no locking: a focus area's pointer only ever references a
//! version whose records were committed in the same transaction, and
//! versions are immutable afterwards.

use async_trait::async_trait;

use crate::domain::feedback::StakeholderFeedback;
use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion, VersionNumber};
use crate::domain::foundation::{DomainError, FocusAreaId, PackageId, VersionId};
use crate::domain::package::AnalysisPackage;

/// Reader port for focus-area queries.
#[async_trait]
pub trait FocusAreaReader: Send + Sync {
    /// Get a package by ID.
    async fn find_package(
        &self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError>;

    /// List the live focus areas of a package, ordered by name.
    async fn list_focus_areas(&self, package_id: PackageId) -> Result<Vec<FocusArea>, DomainError>;

    /// Get a live focus area of a package.
    async fn find_focus_area(
        &self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError>;

    /// Get a version by ID.
    async fn find_version(&self, version_id: VersionId)
        -> Result<Option<FocusAreaVersion>, DomainError>;

    /// Get a focus area's version by number.
    async fn find_version_by_number(
        &self,
        focus_area_id: FocusAreaId,
        version_number: VersionNumber,
    ) -> Result<Option<FocusAreaVersion>, DomainError>;

    /// List every version of a focus area, newest first.
    async fn list_versions(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<FocusAreaVersion>, DomainError>;

    /// List the records of a version in display order.
    ///
    /// Soft-deleted rows are only returned when `include_deleted` is set.
    async fn list_records(
        &self,
        version_id: VersionId,
        include_deleted: bool,
    ) -> Result<Vec<FocusAreaRecord>, DomainError>;

    /// List the unresolved feedback of a focus area, oldest first.
    async fn list_unresolved_feedback(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<StakeholderFeedback>, DomainError>;
}
