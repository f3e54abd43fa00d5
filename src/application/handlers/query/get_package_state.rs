//! GetPackageStateHandler - Current state of every focus area in a package.
//!
//! One parameterized query: records of the current version, the number of
//! unresolved feedback entries, and optionally soft-deleted rows and the
//! version history.

use std::sync::Arc;

use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion};
use crate::domain::foundation::{DomainError, ErrorCode, PackageId, RequestContext};
use crate::domain::package::AnalysisPackage;
use crate::ports::FocusAreaReader;

use super::accessible_package;

/// Query for the current state of a package.
#[derive(Debug, Clone)]
pub struct GetPackageStateQuery {
    pub package_id: PackageId,
    /// Also return soft-deleted records.
    pub include_deleted: bool,
    /// Also return every version of each focus area, newest first.
    pub include_history: bool,
}

/// Current state of one focus area.
#[derive(Debug, Clone)]
pub struct FocusAreaState {
    pub focus_area: FocusArea,
    pub version: FocusAreaVersion,
    /// Records in display order.
    pub records: Vec<FocusAreaRecord>,
    pub unresolved_feedback_count: usize,
    pub history: Option<Vec<FocusAreaVersion>>,
}

/// Current state of a package, focus areas ordered by name.
#[derive(Debug, Clone)]
pub struct PackageState {
    pub package: AnalysisPackage,
    pub focus_areas: Vec<FocusAreaState>,
}

/// Handler for package state queries.
pub struct GetPackageStateHandler {
    reader: Arc<dyn FocusAreaReader>,
}

impl GetPackageStateHandler {
    pub fn new(reader: Arc<dyn FocusAreaReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetPackageStateQuery,
        ctx: &RequestContext,
    ) -> Result<PackageState, DomainError> {
        let package = accessible_package(self.reader.as_ref(), query.package_id, ctx).await?;

        let mut focus_areas = Vec::new();
        for focus_area in self.reader.list_focus_areas(query.package_id).await? {
            let version = self
                .reader
                .find_version(focus_area.current_version_id())
                .await?
                .ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::VersionNotFound,
                        format!("Current version missing: {}", focus_area.current_version_id()),
                    )
                })?;
            let records = self
                .reader
                .list_records(version.id(), query.include_deleted)
                .await?;
            let unresolved_feedback_count = self
                .reader
                .list_unresolved_feedback(focus_area.id())
                .await?
                .len();
            let history = if query.include_history {
                Some(self.reader.list_versions(focus_area.id()).await?)
            } else {
                None
            };

            focus_areas.push(FocusAreaState {
                focus_area,
                version,
                records,
                unresolved_feedback_count,
                history,
            });
        }

        Ok(PackageState {
            package,
            focus_areas,
        })
    }
}
