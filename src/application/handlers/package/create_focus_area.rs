//! CreateFocusAreaHandler - Creates a focus area together with version 1.

use std::sync::Arc;

use crate::domain::focus_area::{
    validate_name, FocusArea, FocusAreaRecord, FocusAreaVersion, PatchSet, RevisionPlan,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, FocusAreaId, PackageId, RequestContext, Timestamp,
};
use crate::ports::RecordStore;

/// Command to create a focus area.
#[derive(Debug, Clone)]
pub struct CreateFocusAreaCommand {
    pub package_id: PackageId,
    pub name: String,
    /// Insert patches that make up version 1.
    pub initial_records: PatchSet,
}

/// Result of focus area creation.
#[derive(Debug, Clone)]
pub struct CreateFocusAreaResult {
    pub focus_area: FocusArea,
    pub version: FocusAreaVersion,
    pub records: Vec<FocusAreaRecord>,
}

/// Handler for creating focus areas.
pub struct CreateFocusAreaHandler {
    store: Arc<dyn RecordStore>,
}

impl CreateFocusAreaHandler {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self, cmd, ctx), fields(package_id = %cmd.package_id))]
    pub async fn handle(
        &self,
        cmd: CreateFocusAreaCommand,
        ctx: &RequestContext,
    ) -> Result<CreateFocusAreaResult, DomainError> {
        let name = validate_name(cmd.name)?;
        let now = Timestamp::now();

        let mut tx = self.store.begin().await?;

        let package = tx.find_package(cmd.package_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::PackageNotFound,
                format!("Package not found: {}", cmd.package_id),
            )
        })?;
        ctx.ensure_can_access(&package)?;

        // Holding the name lock keeps a concurrent create from slipping in
        if tx.lock_focus_area(cmd.package_id, &name).await?.is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateFocusArea,
                format!("Focus area '{}' already exists", name),
            ));
        }

        let focus_area_id = FocusAreaId::new();
        let plan = RevisionPlan::initial(
            focus_area_id,
            &cmd.initial_records,
            None,
            Some(ctx.user_id.clone()),
            now,
        )?;
        let (version, records) = plan.into_parts();
        let focus_area = FocusArea::new(focus_area_id, cmd.package_id, name, version.id(), now)?;

        tx.insert_focus_area(&focus_area).await?;
        tx.insert_version(&version, &records).await?;
        tx.commit().await?;

        tracing::info!(
            focus_area_id = %focus_area.id(),
            name = %focus_area.name(),
            records = records.len(),
            "Focus area created"
        );

        Ok(CreateFocusAreaResult {
            focus_area,
            version,
            records,
        })
    }
}
