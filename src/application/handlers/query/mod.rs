//! Read-side query handlers.

mod get_package_state;
mod get_unresolved_feedback;
mod get_version_snapshot;

pub use get_package_state::{
    FocusAreaState, GetPackageStateHandler, GetPackageStateQuery, PackageState,
};
pub use get_unresolved_feedback::{GetUnresolvedFeedbackHandler, GetUnresolvedFeedbackQuery};
pub use get_version_snapshot::{GetVersionSnapshotHandler, GetVersionSnapshotQuery, VersionSnapshot};

use crate::domain::focus_area::FocusArea;
use crate::domain::foundation::{DomainError, ErrorCode, FocusAreaId, PackageId, RequestContext};
use crate::domain::package::AnalysisPackage;
use crate::ports::FocusAreaReader;

/// Loads a package and checks the caller may see it.
async fn accessible_package(
    reader: &dyn FocusAreaReader,
    package_id: PackageId,
    ctx: &RequestContext,
) -> Result<AnalysisPackage, DomainError> {
    let package = reader.find_package(package_id).await?.ok_or_else(|| {
        DomainError::new(
            ErrorCode::PackageNotFound,
            format!("Package not found: {}", package_id),
        )
    })?;
    ctx.ensure_can_access(&package)?;
    Ok(package)
}

async fn live_focus_area(
    reader: &dyn FocusAreaReader,
    package_id: PackageId,
    focus_area_id: FocusAreaId,
) -> Result<FocusArea, DomainError> {
    reader
        .find_focus_area(package_id, focus_area_id)
        .await?
        .ok_or_else(|| {
            DomainError::new(
                ErrorCode::FocusAreaNotFound,
                format!("Focus area not found: {}", focus_area_id),
            )
        })
}
