//! Revision handlers: the clone-and-patch executor and feedback resolver.

mod feedback_resolver;
mod revise_focus_area;

pub use feedback_resolver::{FeedbackResolver, ResolutionSummary};
pub use revise_focus_area::{
    ReviseFocusAreaCommand, ReviseFocusAreaError, ReviseFocusAreaHandler, ReviseFocusAreaResult,
};
