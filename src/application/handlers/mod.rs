//! Application handlers.
//!
//! Command handlers run every write through one `RecordStoreTransaction`;
//! query handlers read through `FocusAreaReader`.

pub mod package;
pub mod query;
pub mod revision;

pub use package::{
    CreateFocusAreaCommand, CreateFocusAreaHandler, CreateFocusAreaResult, CreatePackageCommand,
    CreatePackageHandler, DeleteFocusAreaCommand, DeleteFocusAreaHandler, SubmitFeedbackCommand,
    SubmitFeedbackHandler,
};
pub use query::{
    FocusAreaState, GetPackageStateHandler, GetPackageStateQuery, GetUnresolvedFeedbackHandler,
    GetUnresolvedFeedbackQuery, GetVersionSnapshotHandler, GetVersionSnapshotQuery, PackageState,
    VersionSnapshot,
};
pub use revision::{
    FeedbackResolver, ResolutionSummary, ReviseFocusAreaCommand, ReviseFocusAreaError,
    ReviseFocusAreaHandler, ReviseFocusAreaResult,
};
