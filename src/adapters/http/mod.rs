//! HTTP adapters - REST API implementations.

pub mod focus_area;

pub use focus_area::{focus_area_router, FocusAreaAppState};
