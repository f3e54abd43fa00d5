//! In-Memory Record Store Adapter
//!
//! Implements both the transactional write port and the reader port over
//! process memory. Useful for tests and development.
//!
//! Transactions stage their writes in a private buffer that is merged into
//! the shared state on commit, so an uncommitted transaction is invisible
//! and dropping it is a rollback. Focus areas are locked by
//! `(package, name)` with one async mutex per key; the guard lives until
//! the transaction commits or is dropped. Idle entries are pruned on the
//! next acquire.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::domain::feedback::{Resolution, StakeholderFeedback};
use crate::domain::focus_area::{
    sort_for_display, FocusArea, FocusAreaRecord, FocusAreaVersion, VersionNumber,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, FeedbackId, FocusAreaId, PackageId, VersionId,
};
use crate::domain::package::AnalysisPackage;
use crate::ports::{FocusAreaReader, RecordStore, RecordStoreTransaction};

type LockKey = (PackageId, String);

#[derive(Debug, Default, Clone)]
struct StoreState {
    packages: HashMap<PackageId, AnalysisPackage>,
    focus_areas: HashMap<FocusAreaId, FocusArea>,
    versions: HashMap<VersionId, FocusAreaVersion>,
    records: HashMap<VersionId, Vec<FocusAreaRecord>>,
    feedback: HashMap<FeedbackId, StakeholderFeedback>,
}

impl StoreState {
    fn merge(&mut self, staged: StoreState) {
        self.packages.extend(staged.packages);
        self.focus_areas.extend(staged.focus_areas);
        self.versions.extend(staged.versions);
        self.records.extend(staged.records);
        self.feedback.extend(staged.feedback);
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<StoreState>,
    locks: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
    fail_next_commit: AtomicBool,
}

/// In-memory implementation of `RecordStore` and `FocusAreaReader`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    shared: Arc<Shared>,
}

impl InMemoryRecordStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail with a database error (useful for tests)
    pub fn fail_next_commit(&self) {
        self.shared.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of committed versions of a focus area
    pub async fn version_count(&self, focus_area_id: FocusAreaId) -> usize {
        self.shared
            .state
            .read()
            .await
            .versions
            .values()
            .filter(|v| v.focus_area_id() == focus_area_id)
            .count()
    }

    /// Number of entries in the focus-area lock table
    pub async fn lock_table_len(&self) -> usize {
        self.shared.locks.lock().await.len()
    }

    /// Number of committed record rows across all versions
    pub async fn record_row_count(&self) -> usize {
        self.shared
            .state
            .read()
            .await
            .records
            .values()
            .map(Vec::len)
            .sum()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn begin(&self) -> Result<Box<dyn RecordStoreTransaction>, DomainError> {
        Ok(Box::new(InMemoryTransaction {
            shared: self.shared.clone(),
            staged: StoreState::default(),
            held: HashSet::new(),
            guards: Vec::new(),
        }))
    }
}

/// Transaction over the in-memory store.
pub struct InMemoryTransaction {
    shared: Arc<Shared>,
    staged: StoreState,
    held: HashSet<LockKey>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl InMemoryTransaction {
    async fn acquire(&mut self, key: LockKey) {
        if self.held.contains(&key) {
            return;
        }
        let lock = {
            let mut locks = self.shared.locks.lock().await;
            // Only the table holds an idle entry; holders and waiters keep a clone
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(key.clone()).or_default().clone()
        };
        let guard = lock.lock_owned().await;
        self.guards.push(guard);
        self.held.insert(key);
    }

    /// Focus area as seen by this transaction (staged overrides committed).
    async fn view_focus_area(&self, focus_area_id: FocusAreaId) -> Option<FocusArea> {
        if let Some(staged) = self.staged.focus_areas.get(&focus_area_id) {
            return Some(staged.clone());
        }
        self.shared
            .state
            .read()
            .await
            .focus_areas
            .get(&focus_area_id)
            .cloned()
    }

    async fn live_focus_area_named(&self, package_id: PackageId, name: &str) -> Option<FocusArea> {
        let matches = |fa: &FocusArea| {
            fa.package_id() == package_id && fa.name() == name && !fa.is_deleted()
        };
        if let Some(fa) = self.staged.focus_areas.values().find(|fa| matches(fa)) {
            return Some(fa.clone());
        }
        let state = self.shared.state.read().await;
        state
            .focus_areas
            .values()
            .filter(|fa| !self.staged.focus_areas.contains_key(&fa.id()))
            .find(|fa| matches(fa))
            .cloned()
    }

    async fn view_feedback(&self, feedback_id: FeedbackId) -> Option<StakeholderFeedback> {
        if let Some(staged) = self.staged.feedback.get(&feedback_id) {
            return Some(staged.clone());
        }
        self.shared
            .state
            .read()
            .await
            .feedback
            .get(&feedback_id)
            .cloned()
    }
}

#[async_trait]
impl RecordStoreTransaction for InMemoryTransaction {
    async fn find_package(
        &mut self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError> {
        if let Some(staged) = self.staged.packages.get(&package_id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self
            .shared
            .state
            .read()
            .await
            .packages
            .get(&package_id)
            .cloned())
    }

    async fn insert_package(&mut self, package: &AnalysisPackage) -> Result<(), DomainError> {
        self.staged.packages.insert(package.id(), package.clone());
        Ok(())
    }

    async fn lock_focus_area(
        &mut self,
        package_id: PackageId,
        name: &str,
    ) -> Result<Option<FocusArea>, DomainError> {
        self.acquire((package_id, name.to_string())).await;
        Ok(self.live_focus_area_named(package_id, name).await)
    }

    async fn lock_focus_area_by_id(
        &mut self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError> {
        let Some(found) = self.view_focus_area(focus_area_id).await else {
            return Ok(None);
        };
        if found.package_id() != package_id {
            return Ok(None);
        }
        self.acquire((package_id, found.name().to_string())).await;

        // Re-read under the lock; a concurrent writer may have committed.
        Ok(self
            .view_focus_area(focus_area_id)
            .await
            .filter(|fa| !fa.is_deleted()))
    }

    async fn insert_focus_area(&mut self, focus_area: &FocusArea) -> Result<(), DomainError> {
        if self
            .live_focus_area_named(focus_area.package_id(), focus_area.name())
            .await
            .is_some()
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateFocusArea,
                format!("Focus area '{}' already exists", focus_area.name()),
            ));
        }
        self.staged
            .focus_areas
            .insert(focus_area.id(), focus_area.clone());
        Ok(())
    }

    async fn find_version(
        &mut self,
        version_id: VersionId,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        if let Some(staged) = self.staged.versions.get(&version_id) {
            return Ok(Some(staged.clone()));
        }
        Ok(self
            .shared
            .state
            .read()
            .await
            .versions
            .get(&version_id)
            .cloned())
    }

    async fn load_records(
        &mut self,
        version_id: VersionId,
    ) -> Result<Vec<FocusAreaRecord>, DomainError> {
        if let Some(staged) = self.staged.records.get(&version_id) {
            return Ok(staged.clone());
        }
        Ok(self
            .shared
            .state
            .read()
            .await
            .records
            .get(&version_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_version(
        &mut self,
        version: &FocusAreaVersion,
        records: &[FocusAreaRecord],
    ) -> Result<(), DomainError> {
        let taken = {
            let state = self.shared.state.read().await;
            state.versions.values().chain(self.staged.versions.values()).any(|v| {
                v.focus_area_id() == version.focus_area_id()
                    && v.version_number() == version.version_number()
            })
        };
        if taken {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!(
                    "Version {} of focus area {} already exists",
                    version.version_number(),
                    version.focus_area_id()
                ),
            ));
        }
        self.staged.versions.insert(version.id(), version.clone());
        self.staged.records.insert(version.id(), records.to_vec());
        Ok(())
    }

    async fn set_current_version(
        &mut self,
        focus_area_id: FocusAreaId,
        version_id: VersionId,
    ) -> Result<(), DomainError> {
        let mut focus_area = self.view_focus_area(focus_area_id).await.ok_or_else(|| {
            DomainError::new(
                ErrorCode::FocusAreaNotFound,
                format!("Focus area not found: {}", focus_area_id),
            )
        })?;
        let owns_version = match self.find_version(version_id).await? {
            Some(v) => v.focus_area_id() == focus_area_id,
            None => false,
        };
        if !owns_version {
            return Err(DomainError::new(
                ErrorCode::VersionNotFound,
                format!("Version {} does not belong to focus area {}", version_id, focus_area_id),
            ));
        }
        focus_area.point_to(version_id);
        self.staged.focus_areas.insert(focus_area_id, focus_area);
        Ok(())
    }

    async fn mark_focus_area_deleted(
        &mut self,
        focus_area_id: FocusAreaId,
    ) -> Result<(), DomainError> {
        let mut focus_area = self.view_focus_area(focus_area_id).await.ok_or_else(|| {
            DomainError::new(
                ErrorCode::FocusAreaNotFound,
                format!("Focus area not found: {}", focus_area_id),
            )
        })?;
        focus_area.mark_deleted();
        self.staged.focus_areas.insert(focus_area_id, focus_area);
        Ok(())
    }

    async fn find_feedback(
        &mut self,
        feedback_id: FeedbackId,
    ) -> Result<Option<StakeholderFeedback>, DomainError> {
        Ok(self.view_feedback(feedback_id).await)
    }

    async fn insert_feedback(&mut self, feedback: &StakeholderFeedback) -> Result<(), DomainError> {
        self.staged.feedback.insert(feedback.id(), feedback.clone());
        Ok(())
    }

    async fn mark_feedback_resolved(
        &mut self,
        feedback_id: FeedbackId,
        resolution: &Resolution,
    ) -> Result<bool, DomainError> {
        let mut feedback = self.view_feedback(feedback_id).await.ok_or_else(|| {
            DomainError::new(
                ErrorCode::FeedbackNotFound,
                format!("Feedback not found: {}", feedback_id),
            )
        })?;
        if !feedback.resolve(resolution.action, resolution.resolved_at) {
            return Ok(false);
        }
        self.staged.feedback.insert(feedback_id, feedback);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let this = *self;
        if this.shared.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "Simulated commit failure",
            ));
        }
        this.shared.state.write().await.merge(this.staged);
        drop(this.guards);
        Ok(())
    }
}

#[async_trait]
impl FocusAreaReader for InMemoryRecordStore {
    async fn find_package(
        &self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError> {
        Ok(self.shared.state.read().await.packages.get(&package_id).cloned())
    }

    async fn list_focus_areas(&self, package_id: PackageId) -> Result<Vec<FocusArea>, DomainError> {
        let state = self.shared.state.read().await;
        let mut focus_areas: Vec<FocusArea> = state
            .focus_areas
            .values()
            .filter(|fa| fa.package_id() == package_id && !fa.is_deleted())
            .cloned()
            .collect();
        focus_areas.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(focus_areas)
    }

    async fn find_focus_area(
        &self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError> {
        Ok(self
            .shared
            .state
            .read()
            .await
            .focus_areas
            .get(&focus_area_id)
            .filter(|fa| fa.package_id() == package_id && !fa.is_deleted())
            .cloned())
    }

    async fn find_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        Ok(self.shared.state.read().await.versions.get(&version_id).cloned())
    }

    async fn find_version_by_number(
        &self,
        focus_area_id: FocusAreaId,
        version_number: VersionNumber,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        Ok(self
            .shared
            .state
            .read()
            .await
            .versions
            .values()
            .find(|v| v.focus_area_id() == focus_area_id && v.version_number() == version_number)
            .cloned())
    }

    async fn list_versions(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<FocusAreaVersion>, DomainError> {
        let state = self.shared.state.read().await;
        let mut versions: Vec<FocusAreaVersion> = state
            .versions
            .values()
            .filter(|v| v.focus_area_id() == focus_area_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number().cmp(&a.version_number()));
        Ok(versions)
    }

    async fn list_records(
        &self,
        version_id: VersionId,
        include_deleted: bool,
    ) -> Result<Vec<FocusAreaRecord>, DomainError> {
        let state = self.shared.state.read().await;
        let mut records: Vec<FocusAreaRecord> = state
            .records
            .get(&version_id)
            .map(|rows| {
                rows.iter()
                    .filter(|r| include_deleted || !r.is_deleted())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        sort_for_display(&mut records);
        Ok(records)
    }

    async fn list_unresolved_feedback(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<StakeholderFeedback>, DomainError> {
        let state = self.shared.state.read().await;
        let mut feedback: Vec<StakeholderFeedback> = state
            .feedback
            .values()
            .filter(|f| f.focus_area_id() == focus_area_id && !f.is_resolved())
            .cloned()
            .collect();
        feedback.sort_by_key(|f| f.submitted_at());
        Ok(feedback)
    }
}
