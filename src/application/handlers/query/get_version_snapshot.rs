//! GetVersionSnapshotHandler - Any version of a focus area, current or past.

use std::sync::Arc;

use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion, VersionNumber};
use crate::domain::foundation::{DomainError, ErrorCode, FocusAreaId, PackageId, RequestContext};
use crate::ports::FocusAreaReader;

use super::{accessible_package, live_focus_area};

/// Query for one version of a focus area.
#[derive(Debug, Clone)]
pub struct GetVersionSnapshotQuery {
    pub package_id: PackageId,
    pub focus_area_id: FocusAreaId,
    pub version_number: VersionNumber,
    pub include_deleted: bool,
}

/// A version with its records.
#[derive(Debug, Clone)]
pub struct VersionSnapshot {
    pub focus_area: FocusArea,
    pub version: FocusAreaVersion,
    pub records: Vec<FocusAreaRecord>,
    pub is_current: bool,
}

/// Handler for version snapshot queries.
pub struct GetVersionSnapshotHandler {
    reader: Arc<dyn FocusAreaReader>,
}

impl GetVersionSnapshotHandler {
    pub fn new(reader: Arc<dyn FocusAreaReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(
        &self,
        query: GetVersionSnapshotQuery,
        ctx: &RequestContext,
    ) -> Result<VersionSnapshot, DomainError> {
        accessible_package(self.reader.as_ref(), query.package_id, ctx).await?;
        let focus_area =
            live_focus_area(self.reader.as_ref(), query.package_id, query.focus_area_id).await?;

        let version = self
            .reader
            .find_version_by_number(focus_area.id(), query.version_number)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::VersionNotFound,
                    format!(
                        "Focus area {} has no version {}",
                        focus_area.id(),
                        query.version_number
                    ),
                )
            })?;
        let records = self
            .reader
            .list_records(version.id(), query.include_deleted)
            .await?;

        Ok(VersionSnapshot {
            is_current: focus_area.current_version_id() == version.id(),
            focus_area,
            version,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryRecordStore;
    use crate::application::handlers::package::{
        CreateFocusAreaCommand, CreateFocusAreaHandler, CreatePackageCommand,
        CreatePackageHandler,
    };
    use crate::application::handlers::revision::{ReviseFocusAreaCommand, ReviseFocusAreaHandler};
    use crate::domain::focus_area::{PatchSet, RecordPatch, RecordProperties};
    use crate::domain::foundation::{OrganizationId, UserId};
    use crate::ports::RecordStore;

    fn ctx() -> RequestContext {
        RequestContext::new(UserId::new("analyst").unwrap(), OrganizationId::new("acme").unwrap())
    }

    fn props(title: &str) -> RecordProperties {
        RecordProperties::from_pairs([("Title", title)]).unwrap()
    }

    async fn two_versions() -> (InMemoryRecordStore, PackageId, FocusAreaId) {
        let store = InMemoryRecordStore::new();
        let shared: Arc<dyn RecordStore> = Arc::new(store.clone());
        let package = CreatePackageHandler::new(shared.clone())
            .handle(CreatePackageCommand { name: "Pkg".into() }, &ctx())
            .await
            .unwrap();
        let created = CreateFocusAreaHandler::new(shared.clone())
            .handle(
                CreateFocusAreaCommand {
                    package_id: package.id(),
                    name: "Risks".into(),
                    initial_records: PatchSet::new(vec![RecordPatch::insert(props("Outage"))])
                        .unwrap(),
                },
                &ctx(),
            )
            .await
            .unwrap();
        ReviseFocusAreaHandler::new(shared)
            .handle(
                ReviseFocusAreaCommand {
                    package_id: package.id(),
                    focus_area_name: "Risks".into(),
                    expected_version_id: created.version.id(),
                    patches: PatchSet::new(vec![RecordPatch::update(
                        created.records[0].id(),
                        props("Regional outage"),
                    )])
                    .unwrap(),
                    revision_summary: Some("Narrowed scope".into()),
                    actioned_feedback: vec![],
                },
                &ctx(),
            )
            .await
            .unwrap();
        (store, package.id(), created.focus_area.id())
    }

    fn query(package_id: PackageId, focus_area_id: FocusAreaId, n: u32) -> GetVersionSnapshotQuery {
        GetVersionSnapshotQuery {
            package_id,
            focus_area_id,
            version_number: VersionNumber::new(n).unwrap(),
            include_deleted: false,
        }
    }

    #[tokio::test]
    async fn past_version_keeps_its_content() {
        let (store, package_id, focus_area_id) = two_versions().await;
        let handler = GetVersionSnapshotHandler::new(Arc::new(store));

        let v1 = handler.handle(query(package_id, focus_area_id, 1), &ctx()).await.unwrap();
        let v2 = handler.handle(query(package_id, focus_area_id, 2), &ctx()).await.unwrap();

        assert!(!v1.is_current);
        assert!(v2.is_current);
        assert_eq!(v1.records[0].properties().get("Title"), Some("Outage"));
        assert_eq!(v2.records[0].properties().get("Title"), Some("Regional outage"));
        assert_eq!(v2.version.revision_summary(), Some("Narrowed scope"));
        assert_eq!(v1.records[0].grid_index(), v2.records[0].grid_index());
    }

    #[tokio::test]
    async fn missing_version_is_not_found() {
        let (store, package_id, focus_area_id) = two_versions().await;
        let handler = GetVersionSnapshotHandler::new(Arc::new(store));

        let err = handler
            .handle(query(package_id, focus_area_id, 3), &ctx())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::VersionNotFound);
    }
}
