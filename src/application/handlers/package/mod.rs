//! Package and focus-area management commands.

mod create_focus_area;
mod create_package;
mod delete_focus_area;
mod submit_feedback;

pub use create_focus_area::{CreateFocusAreaCommand, CreateFocusAreaHandler, CreateFocusAreaResult};
pub use create_package::{CreatePackageCommand, CreatePackageHandler};
pub use delete_focus_area::{DeleteFocusAreaCommand, DeleteFocusAreaHandler};
pub use submit_feedback::{SubmitFeedbackCommand, SubmitFeedbackHandler};
