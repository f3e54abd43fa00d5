//! SubmitFeedbackHandler - Records stakeholder feedback on a focus area.

use std::sync::Arc;

use crate::domain::feedback::{EmailAddress, FeedbackTarget, StakeholderFeedback};
use crate::domain::foundation::{DomainError, ErrorCode, FocusAreaId, PackageId, RequestContext};
use crate::ports::RecordStore;

/// Command to submit feedback.
#[derive(Debug, Clone)]
pub struct SubmitFeedbackCommand {
    pub package_id: PackageId,
    pub focus_area_id: FocusAreaId,
    pub target: FeedbackTarget,
    pub text: String,
    pub submitter_email: String,
}

/// Handler for submitting feedback.
pub struct SubmitFeedbackHandler {
    store: Arc<dyn RecordStore>,
}

impl SubmitFeedbackHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: SubmitFeedbackCommand,
        ctx: &RequestContext,
    ) -> Result<StakeholderFeedback, DomainError> {
        let email = EmailAddress::new(cmd.submitter_email)?;
        let feedback = StakeholderFeedback::submit(cmd.focus_area_id, cmd.target, cmd.text, email)?;

        let mut tx = self.store.begin().await?;

        let package = tx.find_package(cmd.package_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PackageNotFound,
                format!("Package not found: {}", cmd.package_id),
            )
        })?;
        ctx.ensure_can_access(&package)?;

        // Itemized feedback may name a grid index that is gone by the time it
        // is read; that shows up as an orphaned group, so it is not checked here.
        tx.lock_focus_area_by_id(cmd.package_id, cmd.focus_area_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::FocusAreaNotFound,
                    format!("Focus area not found: {}", cmd.focus_area_id),
                )
            })?;

        tx.insert_feedback(&feedback).await?;
        tx.commit().await?;

        tracing::info!(
            feedback_id = %feedback.id(),
            focus_area_id = %feedback.focus_area_id(),
            kind = feedback.kind().as_str(),
            "Feedback submitted"
        );

        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::application::handlers::package::{
        CreateFocusAreaCommand, CreateFocusAreaHandler, CreatePackageCommand,
        CreatePackageHandler,
    };
    use crate::domain::focus_area::{GridIndex, PatchSet};
    use crate::domain::foundation::{OrganizationId, UserId};
    use crate::ports::FocusAreaReader;

    fn ctx() -> RequestContext {
        RequestContext::new(UserId::new("analyst").unwrap(), OrganizationId::new("acme").unwrap())
    }

    async fn setup() -> (InMemoryRecordStore, SubmitFeedbackHandler, PackageId, FocusAreaId) {
        let store = InMemoryRecordStore::new();
        let shared: Arc<dyn RecordStore> = Arc::new(store.clone());
        let package = CreatePackageHandler::new(shared.clone())
            .handle(CreatePackageCommand { name: "Pkg".into() }, &ctx())
            .await
            .unwrap();
        let created = CreateFocusAreaHandler::new(shared.clone())
            .handle(
                CreateFocusAreaCommand {
                    package_id: package.id(),
                    name: "Risks".into(),
                    initial_records: PatchSet::default(),
                },
                &ctx(),
            )
            .await
            .unwrap();
        (
            store,
            SubmitFeedbackHandler::new(shared),
            package.id(),
            created.focus_area.id(),
        )
    }

    #[tokio::test]
    async fn submitted_feedback_is_unresolved() {
        let (store, handler, package_id, focus_area_id) = setup().await;

        let feedback = handler
            .handle(
                SubmitFeedbackCommand {
                    package_id,
                    focus_area_id,
                    target: FeedbackTarget::Itemized {
                        grid_index: GridIndex::new(7),
                    },
                    text: "Row 7 is outdated".into(),
                    submitter_email: "Board@Example.com".into(),
                },
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(feedback.submitter_email().as_str(), "board@example.com");
        let unresolved = store.list_unresolved_feedback(focus_area_id).await.unwrap();
        assert_eq!(unresolved, vec![feedback]);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let (_, handler, package_id, focus_area_id) = setup().await;

        let err = handler
            .handle(
                SubmitFeedbackCommand {
                    package_id,
                    focus_area_id,
                    target: FeedbackTarget::General,
                    text: "Looks fine".into(),
                    submitter_email: "not-an-email".into(),
                },
                &ctx(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::domain::foundation::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn unknown_focus_area_is_not_found() {
        let (_, handler, package_id, _) = setup().await;

        let err = handler
            .handle(
                SubmitFeedbackCommand {
                    package_id,
                    focus_area_id: FocusAreaId::new(),
                    target: FeedbackTarget::General,
                    text: "Hello".into(),
                    submitter_email: "a@example.com".into(),
                },
                &ctx(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::FocusAreaNotFound);
    }
}
