//! HTTP adapter for packages, focus areas, revisions and feedback.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AuthenticatedUser, FocusAreaAppState};
pub use routes::focus_area_router;
