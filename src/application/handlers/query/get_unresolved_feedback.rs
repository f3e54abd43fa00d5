//! GetUnresolvedFeedbackHandler - Open feedback grouped against the current version.

use std::sync::Arc;

use crate::domain::feedback::UnresolvedFeedback;
use crate::domain::foundation::{DomainError, FocusAreaId, PackageId, RequestContext};
use crate::ports::FocusAreaReader;

use super::{accessible_package, live_focus_area};

/// Query for the unresolved feedback of one focus area.
#[derive(Debug, Clone)]
pub struct GetUnresolvedFeedbackQuery {
    pub package_id: PackageId,
    pub focus_area_id: FocusAreaId,
}

/// Handler for unresolved feedback queries.
pub struct GetUnresolvedFeedbackHandler {
    reader: Arc<dyn FocusAreaReader>,
}

impl GetUnresolvedFeedbackHandler {
    pub fn new(reader: Arc<dyn FocusAreaReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetUnresolvedFeedbackQuery,
        ctx: &RequestContext,
    ) -> Result<UnresolvedFeedback, DomainError> {
        accessible_package(self.reader.as_ref(), query.package_id, ctx).await?;
        let focus_area =
            live_focus_area(self.reader.as_ref(), query.package_id, query.focus_area_id).await?;

        let feedback = self.reader.list_unresolved_feedback(focus_area.id()).await?;
        if feedback.is_empty() {
            return Ok(UnresolvedFeedback::default());
        }

        // Deleted rows are needed to tell deleted anchors from orphans
        let current_records = self
            .reader
            .list_records(focus_area.current_version_id(), true)
            .await?;
        let grouped = UnresolvedFeedback::assemble(feedback, &current_records);

        let orphaned = grouped.orphaned().count();
        if orphaned > 0 {
            tracing::debug!(
                focus_area_id = %focus_area.id(),
                orphaned,
                "Itemized feedback without a matching record"
            );
        }

        Ok(grouped)
    }
}
