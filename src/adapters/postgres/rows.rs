//! Row mapping shared by the PostgreSQL store and reader.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::feedback::{
    EmailAddress, FeedbackKind, FeedbackTarget, Resolution, ResolvedAction, StakeholderFeedback,
};
use crate::domain::focus_area::{
    DisplayOrder, FocusArea, FocusAreaRecord, FocusAreaVersion, GridIndex, RecordProperties,
    VersionNumber,
};
use crate::domain::foundation::{
    DomainError, ErrorCode, FeedbackId, FocusAreaId, OrganizationId, PackageId, ProvenanceId,
    RecordId, Timestamp, UserId, VersionId,
};
use crate::domain::package::AnalysisPackage;

pub(super) const PACKAGE_COLUMNS: &str = "id, name, organization_id, created_at";

pub(super) const FOCUS_AREA_COLUMNS: &str =
    "id, package_id, name, is_deleted, current_version_id, created_at";

pub(super) const VERSION_COLUMNS: &str =
    "id, focus_area_id, version_number, revision_summary, created_by, created_at";

/// Properties are read as text so their key order survives decoding.
pub(super) const RECORD_COLUMNS: &str = "id, version_id, grid_index, display_order, \
     properties::text AS properties, is_deleted, provenance_id, created_at";

pub(super) const FEEDBACK_COLUMNS: &str = "id, focus_area_id, kind, grid_index, feedback_text, \
     submitter_email, submitted_at, resolved_action, resolved_at";

fn get<'r, T>(row: &'r PgRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to read column '{}': {}", column, e),
        )
    })
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid stored {}: {}", what, detail),
    )
}

fn to_u32(value: i32, what: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| corrupt(what, value))
}

/// Serializes properties for a `$n::json` parameter.
pub(super) fn properties_json(properties: &RecordProperties) -> Result<String, DomainError> {
    serde_json::to_string(properties).map_err(|e| {
        DomainError::new(
            ErrorCode::InternalError,
            format!("Failed to serialize properties: {}", e),
        )
    })
}

/// Converts a counter for an INTEGER column.
pub(super) fn to_i32(value: u32, what: &str) -> Result<i32, DomainError> {
    i32::try_from(value).map_err(|_| {
        DomainError::new(
            ErrorCode::ValidationFailed,
            format!("{} {} is out of range", what, value),
        )
    })
}

pub(super) fn row_to_package(row: &PgRow) -> Result<AnalysisPackage, DomainError> {
    let organization_id: String = get(row, "organization_id")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;

    Ok(AnalysisPackage::reconstitute(
        PackageId::from_uuid(get(row, "id")?),
        get(row, "name")?,
        OrganizationId::new(organization_id).map_err(|e| corrupt("organization", e))?,
        Timestamp::from_datetime(created_at),
    ))
}

pub(super) fn row_to_focus_area(row: &PgRow) -> Result<FocusArea, DomainError> {
    let created_at: DateTime<Utc> = get(row, "created_at")?;

    Ok(FocusArea::reconstitute(
        FocusAreaId::from_uuid(get(row, "id")?),
        PackageId::from_uuid(get(row, "package_id")?),
        get(row, "name")?,
        get(row, "is_deleted")?,
        VersionId::from_uuid(get(row, "current_version_id")?),
        Timestamp::from_datetime(created_at),
    ))
}

pub(super) fn row_to_version(row: &PgRow) -> Result<FocusAreaVersion, DomainError> {
    let number: i32 = get(row, "version_number")?;
    let created_by: Option<String> = get(row, "created_by")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;

    let version_number = VersionNumber::new(to_u32(number, "version number")?)
        .map_err(|e| corrupt("version number", e))?;
    let created_by = created_by
        .map(UserId::new)
        .transpose()
        .map_err(|e| corrupt("author", e))?;

    Ok(FocusAreaVersion::reconstitute(
        VersionId::from_uuid(get(row, "id")?),
        FocusAreaId::from_uuid(get(row, "focus_area_id")?),
        version_number,
        get(row, "revision_summary")?,
        created_by,
        Timestamp::from_datetime(created_at),
    ))
}

pub(super) fn row_to_record(row: &PgRow) -> Result<FocusAreaRecord, DomainError> {
    let grid_index: i32 = get(row, "grid_index")?;
    let display_order: i32 = get(row, "display_order")?;
    let properties: String = get(row, "properties")?;
    let properties = properties_from_text(&properties)?;
    let provenance_id: Option<Uuid> = get(row, "provenance_id")?;
    let created_at: DateTime<Utc> = get(row, "created_at")?;

    Ok(FocusAreaRecord::reconstitute(
        RecordId::from_uuid(get(row, "id")?),
        VersionId::from_uuid(get(row, "version_id")?),
        GridIndex::new(to_u32(grid_index, "grid index")?),
        DisplayOrder::new(to_u32(display_order, "display order")?),
        properties,
        get(row, "is_deleted")?,
        provenance_id.map(ProvenanceId::from_uuid),
        Timestamp::from_datetime(created_at),
    ))
}

pub(super) fn row_to_feedback(row: &PgRow) -> Result<StakeholderFeedback, DomainError> {
    let kind: String = get(row, "kind")?;
    let grid_index: Option<i32> = get(row, "grid_index")?;
    let email: String = get(row, "submitter_email")?;
    let submitted_at: DateTime<Utc> = get(row, "submitted_at")?;
    let resolved_action: Option<String> = get(row, "resolved_action")?;
    let resolved_at: Option<DateTime<Utc>> = get(row, "resolved_at")?;

    Ok(StakeholderFeedback::reconstitute(
        FeedbackId::from_uuid(get(row, "id")?),
        FocusAreaId::from_uuid(get(row, "focus_area_id")?),
        feedback_target(&kind, grid_index)?,
        get(row, "feedback_text")?,
        EmailAddress::new(email).map_err(|e| corrupt("email", e))?,
        Timestamp::from_datetime(submitted_at),
        resolution(resolved_action, resolved_at)?,
    ))
}

/// Decodes properties read through `properties::text`.
fn properties_from_text(text: &str) -> Result<RecordProperties, DomainError> {
    serde_json::from_str(text).map_err(|e| corrupt("properties", e))
}

fn feedback_target(kind: &str, grid_index: Option<i32>) -> Result<FeedbackTarget, DomainError> {
    match (kind.parse::<FeedbackKind>(), grid_index) {
        (Ok(FeedbackKind::General), _) => Ok(FeedbackTarget::General),
        (Ok(FeedbackKind::Itemized), Some(grid)) => Ok(FeedbackTarget::Itemized {
            grid_index: GridIndex::new(to_u32(grid, "grid index")?),
        }),
        (Ok(FeedbackKind::Itemized), None) => {
            Err(corrupt("feedback target", "itemized without grid index"))
        }
        (Err(e), _) => Err(corrupt("feedback kind", e)),
    }
}

/// A resolution needs both columns; anything else reads as unresolved.
fn resolution(
    action: Option<String>,
    at: Option<DateTime<Utc>>,
) -> Result<Option<Resolution>, DomainError> {
    match (action, at) {
        (Some(action), Some(at)) => Ok(Some(Resolution {
            action: action
                .parse::<ResolvedAction>()
                .map_err(|e| corrupt("resolution", e))?,
            resolved_at: Timestamp::from_datetime(at),
        })),
        _ => Ok(None),
    }
}
