//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, request context)
//! - `package` - Analysis packages and their organization scope
//! - `focus_area` - Focus areas, versions, records, patches and the clone-and-patch plan
//! - `feedback` - Stakeholder feedback, resolution and grid-index grouping

pub mod feedback;
pub mod focus_area;
pub mod foundation;
pub mod package;
