//! Feedback resolution requests carried by a revision.

use serde::{Deserialize, Serialize};

use super::entry::{FeedbackKind, ResolvedAction};
use crate::domain::foundation::{FeedbackId, ValidationError};

/// One action chosen by the reviewer.
///
/// Itemized feedback from several stakeholders on the same record is shown
/// as one group; the single chosen action applies to every identity in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAction {
    source: FeedbackKind,
    feedback_ids: Vec<FeedbackId>,
    action: ResolvedAction,
}

impl FeedbackAction {
    pub fn new(
        source: FeedbackKind,
        feedback_ids: Vec<FeedbackId>,
        action: ResolvedAction,
    ) -> Result<Self, ValidationError> {
        if feedback_ids.is_empty() {
            return Err(ValidationError::empty_field("feedback_identity"));
        }
        let mut feedback_ids = feedback_ids;
        let mut seen = std::collections::HashSet::new();
        feedback_ids.retain(|id| seen.insert(*id));

        Ok(Self {
            source,
            feedback_ids,
            action,
        })
    }

    /// Resolves a single entry.
    pub fn single(source: FeedbackKind, id: FeedbackId, action: ResolvedAction) -> Self {
        Self {
            source,
            feedback_ids: vec![id],
            action,
        }
    }

    pub fn source(&self) -> FeedbackKind {
        self.source
    }

    pub fn feedback_ids(&self) -> &[FeedbackId] {
        &self.feedback_ids
    }

    pub fn action(&self) -> ResolvedAction {
        self.action
    }
}
