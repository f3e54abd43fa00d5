//! Focus-area versioning domain.
//!
//! - `aggregate` - the focus area and its current-version pointer
//! - `version` - immutable versions and version numbers
//! - `record` - records, grid indexes, display order, properties
//! - `patch` - client-submitted update/insert instructions
//! - `guard` - optimistic concurrency check
//! - `revision` - the clone-and-patch plan

mod aggregate;
mod guard;
mod patch;
mod record;
mod revision;
mod version;

pub use aggregate::{validate_name, FocusArea, MAX_FOCUS_AREA_NAME_LEN};
pub use guard::{ConcurrencyGuard, VersionConflict};
pub use patch::{PatchError, PatchSet, RecordPatch};
pub use record::{sort_for_display, DisplayOrder, FocusAreaRecord, GridIndex, RecordProperties};
pub use revision::{RevisionPlan, RevisionPlanError};
pub use version::{normalize_summary, FocusAreaVersion, VersionNumber, MAX_SUMMARY_LEN};
