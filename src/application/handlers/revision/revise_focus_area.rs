//! ReviseFocusAreaHandler - Clone-and-patch executor.
//!
//! Turns a batch of record patches into the next version of a focus area:
//!
//! 1. Lock the focus area and check the caller's expected version
//! 2. Clone every record of the current version and apply the patches
//! 3. Persist the new version and re-point the focus area at it
//! 4. Resolve the feedback that motivated the edits
//! 5. Commit; any failure before this point discards everything

use std::sync::Arc;

use thiserror::Error;

use crate::domain::feedback::FeedbackAction;
use crate::domain::focus_area::{
    normalize_summary, validate_name, ConcurrencyGuard, PatchSet, RevisionPlan, RevisionPlanError,
    VersionConflict, VersionNumber,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, ErrorKind, FocusAreaId, PackageId, RequestContext, Timestamp,
    VersionId,
};
use crate::ports::RecordStore;

use super::feedback_resolver::{FeedbackResolver, ResolutionSummary};

/// Command to produce the next version of a focus area.
#[derive(Debug, Clone)]
pub struct ReviseFocusAreaCommand {
    pub package_id: PackageId,
    pub focus_area_name: String,
    /// The version the caller based its edits on.
    pub expected_version_id: VersionId,
    pub patches: PatchSet,
    pub revision_summary: Option<String>,
    pub actioned_feedback: Vec<FeedbackAction>,
}

/// Result of a committed revision.
#[derive(Debug, Clone)]
pub struct ReviseFocusAreaResult {
    pub focus_area_id: FocusAreaId,
    pub new_version_id: VersionId,
    pub new_version_number: VersionNumber,
    pub updated_records: usize,
    pub inserted_records: usize,
    pub feedback: ResolutionSummary,
}

/// Error type for revisions.
#[derive(Debug, Clone, Error)]
pub enum ReviseFocusAreaError {
    #[error("Package not found: {0}")]
    PackageNotFound(PackageId),

    #[error("Focus area '{name}' not found")]
    FocusAreaNotFound { name: String },

    #[error(transparent)]
    Conflict(#[from] VersionConflict),

    #[error("Invalid patch: {0}")]
    Patch(#[from] RevisionPlanError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ReviseFocusAreaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviseFocusAreaError::PackageNotFound(_)
            | ReviseFocusAreaError::FocusAreaNotFound { .. } => ErrorKind::NotFound,
            ReviseFocusAreaError::Conflict(_) => ErrorKind::Conflict,
            ReviseFocusAreaError::Patch(err) => DomainError::from(err.clone()).kind(),
            ReviseFocusAreaError::Domain(err) => err.kind(),
        }
    }
}

impl From<ReviseFocusAreaError> for DomainError {
    fn from(err: ReviseFocusAreaError) -> Self {
        match err {
            ReviseFocusAreaError::PackageNotFound(id) => {
                DomainError::new(ErrorCode::PackageNotFound, format!("Package not found: {}", id))
            }
            ReviseFocusAreaError::FocusAreaNotFound { name } => DomainError::new(
                ErrorCode::FocusAreaNotFound,
                format!("Focus area '{}' not found", name),
            ),
            ReviseFocusAreaError::Conflict(conflict) => conflict.into(),
            ReviseFocusAreaError::Patch(err) => err.into(),
            ReviseFocusAreaError::Domain(err) => err,
        }
    }
}

/// Handler for revising focus areas.
pub struct ReviseFocusAreaHandler {
    store: Arc<dyn RecordStore>,
}

impl ReviseFocusAreaHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(
        skip(self, cmd, ctx),
        fields(
            package_id = %cmd.package_id,
            focus_area = tracing::field::Empty,
            expected_version_id = %cmd.expected_version_id,
        )
    )]
    pub async fn handle(
        &self,
        cmd: ReviseFocusAreaCommand,
        ctx: &RequestContext,
    ) -> Result<ReviseFocusAreaResult, ReviseFocusAreaError> {
        let focus_area_name = validate_name(cmd.focus_area_name).map_err(DomainError::from)?;
        tracing::Span::current().record("focus_area", focus_area_name.as_str());
        let revision_summary = normalize_summary(cmd.revision_summary).map_err(DomainError::from)?;
        let now = Timestamp::now();

        let mut tx = self.store.begin().await?;

        // 1. Package must exist and be visible to the caller
        let package = tx
            .find_package(cmd.package_id)
            .await?
            .ok_or(ReviseFocusAreaError::PackageNotFound(cmd.package_id))?;
        ctx.ensure_can_access(&package)?;

        // 2. Lock the focus area; the pointer read here is authoritative
        let focus_area = tx
            .lock_focus_area(cmd.package_id, &focus_area_name)
            .await?
            .ok_or_else(|| ReviseFocusAreaError::FocusAreaNotFound {
                name: focus_area_name.clone(),
            })?;

        if let Err(conflict) = ConcurrencyGuard::verify(&focus_area, cmd.expected_version_id) {
            tracing::warn!(
                actual_version_id = %conflict.actual,
                "Rejecting revision based on a stale version"
            );
            return Err(conflict.into());
        }

        // 3. Clone-and-patch
        let current = tx
            .find_version(focus_area.current_version_id())
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::VersionNotFound,
                    format!("Current version missing: {}", focus_area.current_version_id()),
                )
            })?;
        let current_records = tx.load_records(current.id()).await?;

        let plan = RevisionPlan::build(
            &current,
            &current_records,
            &cmd.patches,
            revision_summary,
            Some(ctx.user_id.clone()),
            now,
        )?;

        let updated_records = plan.updated_ids().len();
        let inserted_records = plan.inserted_ids().len();
        let (version, records) = plan.into_parts();

        // 4. Persist the version and swap the pointer
        tx.insert_version(&version, &records).await?;
        tx.set_current_version(focus_area.id(), version.id()).await?;

        // 5. Resolve actioned feedback
        let feedback =
            FeedbackResolver::resolve(tx.as_mut(), focus_area.id(), &cmd.actioned_feedback, now)
                .await?;

        tx.commit().await?;

        tracing::info!(
            focus_area_id = %focus_area.id(),
            version = %version.version_number(),
            records = records.len(),
            updated = updated_records,
            inserted = inserted_records,
            feedback_resolved = feedback.resolved.len(),
            feedback_skipped = feedback.skipped.len(),
            "Focus area revised"
        );

        Ok(ReviseFocusAreaResult {
            focus_area_id: focus_area.id(),
            new_version_id: version.id(),
            new_version_number: version.version_number(),
            updated_records,
            inserted_records,
            feedback,
        })
    }
}
