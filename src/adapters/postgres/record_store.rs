//! PostgreSQL implementation of RecordStore.
//!
//! Each `PostgresTransaction` wraps one `sqlx::Transaction`. Focus areas are
//! locked with `SELECT ... FOR UPDATE`; dropping the transaction without
//! committing rolls it back.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::feedback::{Resolution, StakeholderFeedback};
use crate::domain::focus_area::{FocusArea, FocusAreaRecord, FocusAreaVersion};
use crate::domain::foundation::{
    DomainError, ErrorCode, FeedbackId, FocusAreaId, PackageId, VersionId,
};
use crate::domain::package::AnalysisPackage;
use crate::ports::{RecordStore, RecordStoreTransaction};

use super::rows::{
    properties_json, row_to_feedback, row_to_focus_area, row_to_package, row_to_record,
    row_to_version, to_i32, FEEDBACK_COLUMNS, FOCUS_AREA_COLUMNS, PACKAGE_COLUMNS, RECORD_COLUMNS,
    VERSION_COLUMNS,
};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

/// PostgreSQL implementation of RecordStore.
#[derive(Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Creates a new PostgresRecordStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn begin(&self) -> Result<Box<dyn RecordStoreTransaction>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to begin transaction", e))?;
        Ok(Box::new(PostgresTransaction { tx }))
    }
}

/// One open database transaction.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RecordStoreTransaction for PostgresTransaction {
    async fn find_package(
        &mut self,
        package_id: PackageId,
    ) -> Result<Option<AnalysisPackage>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM analysis_packages WHERE id = $1",
            PACKAGE_COLUMNS
        ))
        .bind(package_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to fetch package", e))?;

        row.as_ref().map(row_to_package).transpose()
    }

    async fn insert_package(&mut self, package: &AnalysisPackage) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO analysis_packages (id, name, organization_id, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(package.id().as_uuid())
        .bind(package.name())
        .bind(package.organization_id().as_str())
        .bind(package.created_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to insert package", e))?;

        Ok(())
    }

    async fn lock_focus_area(
        &mut self,
        package_id: PackageId,
        name: &str,
    ) -> Result<Option<FocusArea>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_areas
            WHERE package_id = $1 AND name = $2 AND NOT is_deleted
            FOR UPDATE
            "#,
            FOCUS_AREA_COLUMNS
        ))
        .bind(package_id.as_uuid())
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to lock focus area", e))?;

        row.as_ref().map(row_to_focus_area).transpose()
    }

    async fn lock_focus_area_by_id(
        &mut self,
        package_id: PackageId,
        focus_area_id: FocusAreaId,
    ) -> Result<Option<FocusArea>, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_areas
            WHERE id = $1 AND package_id = $2 AND NOT is_deleted
            FOR UPDATE
            "#,
            FOCUS_AREA_COLUMNS
        ))
        .bind(focus_area_id.as_uuid())
        .bind(package_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to lock focus area", e))?;

        row.as_ref().map(row_to_focus_area).transpose()
    }

    async fn insert_focus_area(&mut self, focus_area: &FocusArea) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO focus_areas (
                id, package_id, name, is_deleted, current_version_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(focus_area.id().as_uuid())
        .bind(focus_area.package_id().as_uuid())
        .bind(focus_area.name())
        .bind(focus_area.is_deleted())
        .bind(focus_area.current_version_id().as_uuid())
        .bind(focus_area.created_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::new(
                    ErrorCode::DuplicateFocusArea,
                    format!("Focus area '{}' already exists", focus_area.name()),
                )
            } else {
                DomainError::database("Failed to insert focus area", e)
            }
        })?;

        Ok(())
    }

    async fn find_version(
        &mut self,
        version_id: VersionId,
    ) -> Result<Option<FocusAreaVersion>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM focus_area_versions WHERE id = $1",
            VERSION_COLUMNS
        ))
        .bind(version_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to fetch version", e))?;

        row.as_ref().map(row_to_version).transpose()
    }

    async fn load_records(
        &mut self,
        version_id: VersionId,
    ) -> Result<Vec<FocusAreaRecord>, DomainError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM focus_area_records
            WHERE version_id = $1
            ORDER BY display_order, grid_index
            "#,
            RECORD_COLUMNS
        ))
        .bind(version_id.as_uuid())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to load records", e))?;

        rows.iter().map(row_to_record).collect()
    }

    async fn insert_version(
        &mut self,
        version: &FocusAreaVersion,
        records: &[FocusAreaRecord],
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO focus_area_versions (
                id, focus_area_id, version_number, revision_summary, created_by, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(version.id().as_uuid())
        .bind(version.focus_area_id().as_uuid())
        .bind(to_i32(version.version_number().as_u32(), "Version number")?)
        .bind(version.revision_summary())
        .bind(version.created_by().map(|u| u.as_str()))
        .bind(version.created_at().as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::new(
                    ErrorCode::VersionConflict,
                    format!(
                        "Version {} of focus area {} already exists",
                        version.version_number(),
                        version.focus_area_id()
                    ),
                )
            } else {
                DomainError::database("Failed to insert version", e)
            }
        })?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO focus_area_records (
                    id, version_id, grid_index, display_order, properties,
                    is_deleted, provenance_id, created_at
                ) VALUES ($1, $2, $3, $4, $5::json, $6, $7, $8)
                "#,
            )
            .bind(record.id().as_uuid())
            .bind(record.version_id().as_uuid())
            .bind(to_i32(record.grid_index().as_u32(), "Grid index")?)
            .bind(to_i32(record.display_order().as_u32(), "Display order")?)
            .bind(properties_json(record.properties())?)
            .bind(record.is_deleted())
            .bind(record.provenance_id().map(|id| *id.as_uuid()))
            .bind(record.created_at().as_datetime())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::database("Failed to insert record", e))?;
        }

        Ok(())
    }

    async fn set_current_version(
        &mut self,
        focus_area_id: FocusAreaId,
        version_id: VersionId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE focus_areas SET current_version_id = $2
            WHERE id = $1
              AND EXISTS (
                  SELECT 1 FROM focus_area_versions v
                  WHERE v.id = $2 AND v.focus_area_id = $1
              )
            "#,
        )
        .bind(focus_area_id.as_uuid())
        .bind(version_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to update current version", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::VersionNotFound,
                format!("Version {} does not belong to focus area {}", version_id, focus_area_id),
            ));
        }
        Ok(())
    }

    async fn mark_focus_area_deleted(
        &mut self,
        focus_area_id: FocusAreaId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE focus_areas SET is_deleted = TRUE WHERE id = $1")
            .bind(focus_area_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::database("Failed to delete focus area", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::FocusAreaNotFound,
                format!("Focus area not found: {}", focus_area_id),
            ));
        }
        Ok(())
    }

    async fn find_feedback(
        &mut self,
        feedback_id: FeedbackId,
    ) -> Result<Option<StakeholderFeedback>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM stakeholder_feedback WHERE id = $1",
            FEEDBACK_COLUMNS
        ))
        .bind(feedback_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to fetch feedback", e))?;

        row.as_ref().map(row_to_feedback).transpose()
    }

    async fn insert_feedback(&mut self, feedback: &StakeholderFeedback) -> Result<(), DomainError> {
        let grid_index = feedback
            .target()
            .grid_index()
            .map(|g| to_i32(g.as_u32(), "Grid index"))
            .transpose()?;

        sqlx::query(
            r#"
            INSERT INTO stakeholder_feedback (
                id, focus_area_id, kind, grid_index, feedback_text,
                submitter_email, submitted_at, resolved_action, resolved_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(feedback.id().as_uuid())
        .bind(feedback.focus_area_id().as_uuid())
        .bind(feedback.kind().as_str())
        .bind(grid_index)
        .bind(feedback.text())
        .bind(feedback.submitter_email().as_str())
        .bind(feedback.submitted_at().as_datetime())
        .bind(feedback.resolution().map(|r| r.action.as_str()))
        .bind(feedback.resolution().map(|r| *r.resolved_at.as_datetime()))
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to insert feedback", e))?;

        Ok(())
    }

    async fn mark_feedback_resolved(
        &mut self,
        feedback_id: FeedbackId,
        resolution: &Resolution,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE stakeholder_feedback
            SET resolved_action = $2, resolved_at = $3
            WHERE id = $1 AND resolved_at IS NULL
            "#,
        )
        .bind(feedback_id.as_uuid())
        .bind(resolution.action.as_str())
        .bind(resolution.resolved_at.as_datetime())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| DomainError::database("Failed to resolve feedback", e))?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        if self.find_feedback(feedback_id).await?.is_none() {
            return Err(DomainError::new(
                ErrorCode::FeedbackNotFound,
                format!("Feedback not found: {}", feedback_id),
            ));
        }
        Ok(false)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))
    }
}
