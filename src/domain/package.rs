//! Analysis package - the container that owns focus areas.

use serde::{Deserialize, Serialize};

use super::foundation::{OrganizationId, PackageId, Timestamp, ValidationError};

/// Maximum length of a package name.
pub const MAX_PACKAGE_NAME_LEN: usize = 200;

/// A collaborative analysis package owned by one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPackage {
    id: PackageId,
    name: String,
    organization_id: OrganizationId,
    created_at: Timestamp,
}

impl AnalysisPackage {
    /// Creates a new package with a fresh identity.
    pub fn new(
        name: impl Into<String>,
        organization_id: OrganizationId,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::empty_field("name"));
        }
        let len = name.chars().count();
        if len > MAX_PACKAGE_NAME_LEN {
            return Err(ValidationError::too_long("name", MAX_PACKAGE_NAME_LEN, len));
        }

        Ok(Self {
            id: PackageId::new(),
            name,
            organization_id,
            created_at: Timestamp::now(),
        })
    }

    /// Rebuilds a package from storage.
    pub fn reconstitute(
        id: PackageId,
        name: String,
        organization_id: OrganizationId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            name,
            organization_id,
            created_at,
        }
    }

    pub fn id(&self) -> PackageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn organization_id(&self) -> &OrganizationId {
        &self.organization_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
