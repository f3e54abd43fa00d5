//! CreatePackageHandler - Command handler for creating analysis packages.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, RequestContext};
use crate::domain::package::AnalysisPackage;
use crate::ports::RecordStore;

/// Command to create a package in the caller's organization.
#[derive(Debug, Clone)]
pub struct CreatePackageCommand {
    pub name: String,
}

/// Handler for creating packages.
pub struct CreatePackageHandler {
    store: Arc<dyn RecordStore>,
}

impl CreatePackageHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        cmd: CreatePackageCommand,
        ctx: &RequestContext,
    ) -> Result<AnalysisPackage, DomainError> {
        let package = AnalysisPackage::new(cmd.name, ctx.organization_id.clone())?;

        let mut tx = self.store.begin().await?;
        tx.insert_package(&package).await?;
        tx.commit().await?;

        tracing::info!(
            package_id = %package.id(),
            organization_id = %package.organization_id(),
            "Package created"
        );

        Ok(package)
    }
}
