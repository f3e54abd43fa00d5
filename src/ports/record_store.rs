//! Record Store Port - Transactional write side.
//!
//! Every write of the revision engine runs inside one
//! `RecordStoreTransaction`. The transaction is the unit of atomicity:
//! nothing becomes visible until `commit`, and dropping it without
//! committing discards every change.

use async_trait::async_trait;

use crate::domain::feedback::{Resolution, StakeholderFeedback};
use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion};
use crate::domain::foundation::{DomainError, FeedbackId, FocusAreaId, PackageId, VersionId};
use crate::domain::package::AnalysisPackage;

/// Entry point of the write side.
///
/// # Usage
///
/// ```rust,ignore
/// let mut tx = store.begin().await?;
/// let focus_area = tx.lock_focus_area(package_id, "Risks").await?;
/// // ... guard, clone-and-patch, resolve feedback ...
/// tx.commit().await?;
/// ```
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Opens a new transaction.
    async fn begin(&self) -> Result<Box<dyn RecordStoreTransaction>, DomainError>;
}

/// One atomic unit of work.
///
/// # Contract
///
/// Implementations must:
/// - Make no change visible to readers before `commit` succeeds
/// - Roll back everything when the transaction is dropped uncommitted
/// - Serialize transactions that lock the same focus area; the lock is held
///   until commit or drop
/// - Let transactions on different focus areas proceed independently
#[async_trait]
pub trait RecordStoreTransaction: Send {
    /// Find a package by ID.
    async fn find_package(
        &mut self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError>;

    /// Insert a new package.
    async fn insert_package(&mut self, package: &AnalysisPackage) -> Result<(), DomainError>;

    /// Lock and return the live (non-deleted) focus area with this name.
    ///
    /// The returned state reflects every commit that finished before the
    /// lock was granted.
    async fn lock_focus_area(
        &mut self,
        package_id: PackageId,
        name: &str,
    ) -> Result<Option<FocusArea>, DomainError>;

    /// Lock and return a live focus area by ID.
    async fn lock_focus_area_by_id(
        &mut self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError>;

    /// Insert a new focus area.
    ///
    /// # Errors
    ///
    /// `DuplicateFocusArea` if a live focus area with the same name exists.
    async fn insert_focus_area(&mut self, focus_area: &FocusArea) -> Result<(), DomainError>;

    /// Find a version by ID.
    async fn find_version(
        &mut self,
        version_id: VersionId,
    ) -> Result<Option<FocusAreaVersion>, DomainError>;

    /// Load every record of a version, soft-deleted rows included.
    async fn load_records(
        &mut self,
        version_id: VersionId,
    ) -> Result<Vec<FocusAreaRecord>, DomainError>;

    /// Insert a version together with all of its records.
    async fn insert_version(
        &mut self,
        version: &FocusAreaVersion,
        records: &[FocusAreaRecord],
    ) -> Result<(), DomainError>;

    /// Re-point a focus area at a version it owns.
    async fn set_current_version(
        &mut self,
        focus_area_id: FocusAreaId,
        version_id: VersionId,
    ) -> Result<(), DomainError>;

    /// Soft-delete a focus area.
    async fn mark_focus_area_deleted(&mut self, focus_area_id: FocusAreaId)
        -> Result<(), DomainError>;

    /// Find a feedback entry by ID.
    async fn find_feedback(
        &mut self,
        feedback_id: FeedbackId,
    ) -> Result<Option<StakeholderFeedback>, DomainError>;

    /// Insert a new feedback entry.
    async fn insert_feedback(&mut self, feedback: &StakeholderFeedback) -> Result<(), DomainError>;

    /// Record a resolution unless one already exists.
    ///
    /// Returns `false` when the entry was already resolved; the existing
    /// resolution is left untouched.
    async fn mark_feedback_resolved(
        &mut self,
        feedback_id: FeedbackId,
        resolution: &Resolution,
    ) -> Result<bool, DomainError>;

    /// Make every change of this transaction visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}
