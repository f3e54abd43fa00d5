//! DeleteFocusAreaHandler - Soft-deletes a focus area.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, ErrorCode, FocusAreaId, PackageId, RequestContext};
use crate::ports::RecordStore;

/// Command to soft-delete a focus area. Its versions are kept.
#[derive(Debug, Clone)]
pub struct DeleteFocusAreaCommand {
    pub package_id: PackageId,
    pub focus_area_id: FocusAreaId,
}

/// Handler for deleting focus areas.
pub struct DeleteFocusAreaHandler {
    store: Arc<dyn RecordStore>,
}

impl DeleteFocusAreaHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: DeleteFocusAreaCommand,
        ctx: &RequestContext,
    ) -> Result<(), DomainError> {
        let mut tx = self.store.begin().await?;

        let package = tx.find_package(cmd.package_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PackageNotFound,
                format!("Package not found: {}", cmd.package_id),
            )
        })?;
        ctx.ensure_can_access(&package)?;

        let focus_area = tx
            .lock_focus_area_by_id(cmd.package_id, cmd.focus_area_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::FocusAreaNotFound,
                    format!("Focus area not found: {}", cmd.focus_area_id),
                )
            })?;

        tx.mark_focus_area_deleted(focus_area.id()).await?;
        tx.commit().await?;

        tracing::info!(
            package_id = %cmd.package_id,
            focus_area_id = %focus_area.id(),
            name = %focus_area.name(),
            "Focus area deleted"
        );
        Ok(())
    }
}
