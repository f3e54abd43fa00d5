//! PostgreSQL implementation of FocusAreaReader.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::feedback::StakeholderFeedback;
use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion, VersionNumber};
use crate::domain::foundation::{DomainError, FocusAreaId, PackageId, VersionId};
use crate::domain::package::AnalysisPackage;
use crate::ports::FocusAreaReader;

use super::rows::{
    row_to_feedback, row_to_focus_area, row_to_package, row_to_record, row_to_version, to_i32,
    FEEDBACK_COLUMNS, FOCUS_AREA_COLUMNS, PACKAGE_COLUMNS, RECORD_COLUMNS, VERSION_COLUMNS,
};

/// PostgreSQL implementation of FocusAreaReader.
#[derive(Clone)]
pub struct PostgresFocusAreaReader {
    pool: PgPool,
}

impl PostgresFocusAreaReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FocusAreaReader for PostgresFocusAreaReader {
    async fn find_package(
        &self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM analysis_packages WHERE id = $1",
            PACKAGE_COLUMNS
        ))
        .bind(package_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch package", e))?;

        row.as_ref().map(row_to_package).transpose()
    }

    async fn list_focus_areas(&self, package_id: PackageId) -> Result<Vec<FocusArea>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_areas
            WHERE package_id = $1 AND NOT is_deleted
            ORDER BY name
            "#,
            FOCUS_AREA_COLUMNS
        ))
        .bind(package_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list focus areas", e))?;

        rows.iter().map(row_to_focus_area).collect()
    }

    async fn find_focus_area(
        &self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_areas
            WHERE id = $1 AND package_id = $2 AND NOT is_deleted
            "#,
            FOCUS_AREA_COLUMNS
        ))
        .bind(focus_area_id.as_uuid())
        .bind(package_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch focus area", e))?;

        row.as_ref().map(row_to_focus_area).transpose()
    }

    async fn find_version(
        &self,
        version_id: VersionId,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM focus_area_versions WHERE id = $1",
            VERSION_COLUMNS
        ))
        .bind(version_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch version", e))?;

        row.as_ref().map(row_to_version).transpose()
    }

    async fn find_version_by_number(
        &self,
        focus_area_id: FocusAreaId,
        version_number: VersionNumber,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_area_versions
            WHERE focus_area_id = $1 AND version_number = $2
            "#,
            VERSION_COLUMNS
        ))
        .bind(focus_area_id.as_uuid())
        .bind(to_i32(version_number.as_u32(), "Version number")?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch version", e))?;

        row.as_ref().map(row_to_version).transpose()
    }

    async fn list_versions(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<FocusAreaVersion>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_area_versions
            WHERE focus_area_id = $1
            ORDER BY version_number DESC
            "#,
            VERSION_COLUMNS
        ))
        .bind(focus_area_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list versions", e))?;

        rows.iter().map(row_to_version).collect()
    }

    async fn list_records(
        &self,
        version_id: VersionId,
        include_deleted: bool,
    ) -> Result<Vec<FocusAreaRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_area_records
            WHERE version_id = $1 AND ($2 OR NOT is_deleted)
            ORDER BY display_order, grid_index
            "#,
            RECORD_COLUMNS
        ))
        .bind(version_id.as_uuid())
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list records", e))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn list_unresolved_feedback(
        &self,
        focus_area_id: FocusAreaId,
    ) -> Result<Vec<StakeholderFeedback>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM stakeholder_feedback
            WHERE focus_area_id = $1 AND resolved_at IS NULL
            ORDER BY submitted_at, id
            "#,
            FEEDBACK_COLUMNS
        ))
        .bind(focus_area_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list feedback", e))?;

        rows.iter().map(row_to_feedback).collect()
    }
}
