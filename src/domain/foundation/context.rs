//! Request context that flows through every handler call.
//!
//! Replaces ambient session state: the caller's identity and organization
//! scope are passed explicitly instead of being read from globals.

use serde::{Deserialize, Serialize};

use super::{DomainError, ErrorCode, OrganizationId, UserId};
use crate::domain::package::AnalysisPackage;

/// Authenticated caller context.
///
/// Built by the HTTP adapter from gateway-supplied headers; handlers trust
/// it as given and only use it to scope package access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// The user executing this request.
    pub user_id: UserId,

    /// The organization the user acts for.
    pub organization_id: OrganizationId,

    /// Links log lines of one request together.
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl RequestContext {
    /// Creates a context for the given user and organization.
    pub fn new(user_id: UserId, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            organization_id,
            correlation_id: None,
        }
    }

    /// Builder: Add correlation ID for request tracing.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Returns the correlation ID if set.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Fails with `Forbidden` unless the package belongs to the caller's organization.
    pub fn ensure_can_access(&self, package: &AnalysisPackage) -> Result<(), DomainError> {
        if package.organization_id() == &self.organization_id {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::Forbidden,
                "Package is not accessible from this organization",
            )
            .with_detail("package_id", package.id().to_string()))
        }
    }
}
