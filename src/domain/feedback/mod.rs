//! Stakeholder feedback domain.
//!
//! - `entry` - feedback entries, targets, one-way resolution
//! - `action` - resolution requests carried by a revision
//! - `grouping` - unresolved feedback grouped by grid index

mod action;
mod entry;
mod grouping;

pub use action::FeedbackAction;
pub use entry::{
    EmailAddress, FeedbackKind, FeedbackTarget, Resolution, ResolvedAction, StakeholderFeedback,
    MAX_FEEDBACK_LEN,
};
pub use grouping::{AnchorState, ItemizedFeedbackGroup, UnresolvedFeedback};
