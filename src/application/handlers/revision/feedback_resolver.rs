//! FeedbackResolver - Marks actioned feedback resolved inside a revision.

use serde::Serialize;

use crate::domain::feedback::{FeedbackAction, Resolution};
use crate::domain::foundation::{DomainError, ErrorCode, FeedbackId, FocusAreaId, Timestamp};
use crate::ports::RecordStoreTransaction;

/// What happened to each actioned identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    /// Entries resolved by this call.
    pub resolved: Vec<FeedbackId>,
    /// Entries that already carried a resolution and were left as is.
    pub skipped: Vec<FeedbackId>,
}

impl ResolutionSummary {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.skipped.len()
    }
}

/// Resolves feedback within the caller's transaction.
///
/// Any invalid identity aborts with an error; the caller drops the
/// transaction, so no partial resolution is ever committed.
pub struct FeedbackResolver;

impl FeedbackResolver {
    pub async fn resolve(
        tx: &mut dyn RecordStoreTransaction,
        focus_area_id: FocusAreaId,
        actions: &[FeedbackAction],
        now: Timestamp,
    ) -> Result<ResolutionSummary, DomainError> {
        let mut summary = ResolutionSummary::default();

        for action in actions {
            let resolution = Resolution {
                action: action.action(),
                resolved_at: now,
            };

            for &feedback_id in action.feedback_ids() {
                let feedback = tx.find_feedback(feedback_id).await?.ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::FeedbackNotFound,
                        format!("Feedback not found: {}", feedback_id),
                    )
                })?;

                // Feedback of another focus area is indistinguishable from a
                // missing entry to the caller.
                if feedback.focus_area_id() != focus_area_id {
                    return Err(DomainError::new(
                        ErrorCode::FeedbackNotFound,
                        format!("Feedback not found: {}", feedback_id),
                    )
                    .with_detail("focus_area_id", focus_area_id.to_string()));
                }

                if feedback.kind() != action.source() {
                    return Err(DomainError::new(
                        ErrorCode::FeedbackSourceMismatch,
                        format!(
                            "Feedback {} is {} feedback, not {}",
                            feedback_id,
                            feedback.kind().as_str(),
                            action.source().as_str()
                        ),
                    ));
                }

                if tx.mark_feedback_resolved(feedback_id, &resolution).await? {
                    summary.resolved.push(feedback_id);
                } else {
                    tracing::debug!(
                        feedback_id = %feedback_id,
                        "Feedback already resolved, keeping original resolution"
                    );
                    summary.skipped.push(feedback_id);
                }
            }
        }

        Ok(summary)
    }
}
