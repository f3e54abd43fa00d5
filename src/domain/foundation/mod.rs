//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, errors and the request context
//! that form the vocabulary of the revision engine.

mod context;
mod errors;
mod ids;
mod timestamp;

pub use context::RequestContext;
pub use errors::{DomainError, ErrorCode, ErrorKind, ValidationError};
pub use ids::{
    FeedbackId, FocusAreaId, OrganizationId, PackageId, ProvenanceId, RecordId, UserId,
    VersionId,
};
pub use timestamp::Timestamp;
