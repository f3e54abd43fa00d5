//! HTTP DTOs (Data Transfer Objects) for focus-area endpoints.
//!
//! JSON bodies use camelCase. Every response carries `status`, either
//! `"success"` or `"error"`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    FocusAreaState, PackageState, ReviseFocusAreaResult, VersionSnapshot,
};
use crate::domain::feedback::{
    AnchorState, FeedbackAction, FeedbackKind, ItemizedFeedbackGroup, ResolvedAction,
    StakeholderFeedback, UnresolvedFeedback,
};
use crate::domain::focus_area::{FocusAreaRecord, FocusAreaVersion, PatchSet, RecordPatch, RecordProperties};
use crate::domain::foundation::{DomainError, ErrorKind, FeedbackId, ProvenanceId, RecordId};
use crate::domain::package::AnalysisPackage;

const SUCCESS: &str = "success";
const ERROR: &str = "error";

/// Identity value that marks a record write as an insert.
pub const NEW_RECORD: &str = "new";

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to create a package.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub name: String,
}

/// Request to create a focus area with its first version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFocusAreaRequest {
    pub name: String,
    /// Initial rows; every identity must be `"new"`.
    #[serde(default)]
    pub records: Vec<RecordWriteRequest>,
}

/// One record in a write request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordWriteRequest {
    /// A record id of the expected version, or `"new"`.
    pub identity: String,
    #[serde(default)]
    pub is_deleted: bool,
    pub properties: RecordProperties,
    #[serde(default)]
    pub provenance_id: Option<String>,
}

/// Request to revise a focus area.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviseRequest {
    pub focus_area_name: String,
    pub expected_version_id: String,
    #[serde(default)]
    pub records: Vec<RecordWriteRequest>,
    #[serde(default)]
    pub revision_summary: Option<String>,
    #[serde(default)]
    pub actioned_feedback: Vec<ActionedFeedbackRequest>,
}

/// One feedback action in a revise request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionedFeedbackRequest {
    /// `"general"` or `"itemized"`.
    pub source: String,
    pub feedback_identity: FeedbackIdentity,
    /// `"applied"`, `"instructed"` or `"ignored"`.
    pub action: String,
}

/// A single feedback id or the ids of one itemized group.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeedbackIdentity {
    One(String),
    Many(Vec<String>),
}

/// Request to submit feedback. A grid index makes it itemized.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitFeedbackRequest {
    #[serde(default)]
    pub grid_index: Option<u32>,
    pub text: String,
    pub submitter_email: String,
}

/// Query parameters of the package state endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStateParams {
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub include_history: bool,
}

/// Query parameters of the version snapshot endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
    #[serde(default)]
    pub include_deleted: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// Request Conversion
// ════════════════════════════════════════════════════════════════════════════════

fn parse_id<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, DomainError> {
    value
        .trim()
        .parse()
        .map_err(|_| DomainError::validation(field, format!("Invalid {} format", field)))
}

impl RecordWriteRequest {
    fn into_patch(self) -> Result<RecordPatch, DomainError> {
        let provenance_id = self
            .provenance_id
            .as_deref()
            .map(|id| parse_id::<ProvenanceId>(id, "provenanceId"))
            .transpose()?;

        let patch = if self.identity.trim().eq_ignore_ascii_case(NEW_RECORD) {
            RecordPatch::Insert {
                properties: self.properties,
                is_deleted: self.is_deleted,
                provenance_id,
            }
        } else {
            RecordPatch::Update {
                record_id: parse_id::<RecordId>(&self.identity, "identity")?,
                properties: self.properties,
                is_deleted: self.is_deleted,
                provenance_id,
            }
        };
        Ok(patch)
    }
}

/// Converts record writes into a validated patch set.
pub fn to_patch_set(records: Vec<RecordWriteRequest>) -> Result<PatchSet, DomainError> {
    let patches = records
        .into_iter()
        .map(RecordWriteRequest::into_patch)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PatchSet::new(patches)?)
}

impl ActionedFeedbackRequest {
    pub fn into_action(self) -> Result<FeedbackAction, DomainError> {
        let source: FeedbackKind = self
            .source
            .parse()
            .map_err(|e: String| DomainError::validation("source", e))?;
        let action: ResolvedAction = self
            .action
            .parse()
            .map_err(|e: String| DomainError::validation("action", e))?;

        let raw = match self.feedback_identity {
            FeedbackIdentity::One(id) => vec![id],
            FeedbackIdentity::Many(ids) => ids,
        };
        let ids = raw
            .iter()
            .map(|id| parse_id::<FeedbackId>(id, "feedbackIdentity"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeedbackAction::new(source, ids, action)?)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A record as shown to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordResponse {
    pub id: String,
    pub grid_index: u32,
    pub display_order: u32,
    pub properties: RecordProperties,
    pub is_deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance_id: Option<String>,
    pub created_at: String,
}

impl From<&FocusAreaRecord> for RecordResponse {
    fn from(record: &FocusAreaRecord) -> Self {
        Self {
            id: record.id().to_string(),
            grid_index: record.grid_index().as_u32(),
            display_order: record.display_order().as_u32(),
            properties: record.properties().clone(),
            is_deleted: record.is_deleted(),
            provenance_id: record.provenance_id().map(|p| p.to_string()),
            created_at: record.created_at().to_rfc3339(),
        }
    }
}

/// Version metadata.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version_id: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<&FocusAreaVersion> for VersionResponse {
    fn from(version: &FocusAreaVersion) -> Self {
        Self {
            version_id: version.id().to_string(),
            version: version.version_number().as_u32(),
            revision_summary: version.revision_summary().map(str::to_string),
            created_by: version.created_by().map(|u| u.to_string()),
            created_at: version.created_at().to_rfc3339(),
        }
    }
}

/// Current state of one focus area.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreaStateResponse {
    pub focus_area_id: String,
    pub version: u32,
    pub version_id: String,
    pub records: Vec<RecordResponse>,
    pub unreviewed_feedback_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<VersionResponse>>,
}

impl From<&FocusAreaState> for FocusAreaStateResponse {
    fn from(state: &FocusAreaState) -> Self {
        Self {
            focus_area_id: state.focus_area.id().to_string(),
            version: state.version.version_number().as_u32(),
            version_id: state.version.id().to_string(),
            records: state.records.iter().map(RecordResponse::from).collect(),
            unreviewed_feedback_count: state.unresolved_feedback_count,
            history: state
                .history
                .as_ref()
                .map(|versions| versions.iter().map(VersionResponse::from).collect()),
        }
    }
}

/// Current state of a package, keyed by focus area name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageStateResponse {
    pub status: &'static str,
    pub package_id: String,
    pub package_name: String,
    pub focus_areas: IndexMap<String, FocusAreaStateResponse>,
}

impl From<&PackageState> for PackageStateResponse {
    fn from(state: &PackageState) -> Self {
        Self {
            status: SUCCESS,
            package_id: state.package.id().to_string(),
            package_name: state.package.name().to_string(),
            focus_areas: state
                .focus_areas
                .iter()
                .map(|fa| (fa.focus_area.name().to_string(), FocusAreaStateResponse::from(fa)))
                .collect(),
        }
    }
}

/// Response for a created package.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub status: &'static str,
    pub package_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<&AnalysisPackage> for PackageResponse {
    fn from(package: &AnalysisPackage) -> Self {
        Self {
            status: SUCCESS,
            package_id: package.id().to_string(),
            name: package.name().to_string(),
            created_at: package.created_at().to_rfc3339(),
        }
    }
}

/// Response for a created focus area.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusAreaCreatedResponse {
    pub status: &'static str,
    pub focus_area_id: String,
    pub name: String,
    pub version_id: String,
    pub version: u32,
    pub records: Vec<RecordResponse>,
}

impl FocusAreaCreatedResponse {
    pub fn new(
        focus_area_id: String,
        name: String,
        version: &FocusAreaVersion,
        records: &[FocusAreaRecord],
    ) -> Self {
        Self {
            status: SUCCESS,
            focus_area_id,
            name,
            version_id: version.id().to_string(),
            version: version.version_number().as_u32(),
            records: records.iter().map(RecordResponse::from).collect(),
        }
    }
}

/// Response for a committed revision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponse {
    pub status: &'static str,
    pub new_version_id: String,
    pub new_version_number: u32,
    pub resolved_feedback: Vec<String>,
    pub skipped_feedback: Vec<String>,
}

impl From<&ReviseFocusAreaResult> for RevisionResponse {
    fn from(result: &ReviseFocusAreaResult) -> Self {
        Self {
            status: SUCCESS,
            new_version_id: result.new_version_id.to_string(),
            new_version_number: result.new_version_number.as_u32(),
            resolved_feedback: result.feedback.resolved.iter().map(|id| id.to_string()).collect(),
            skipped_feedback: result.feedback.skipped.iter().map(|id| id.to_string()).collect(),
        }
    }
}

/// One feedback entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEntryResponse {
    pub id: String,
    pub kind: FeedbackKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_index: Option<u32>,
    pub text: String,
    pub submitter_email: String,
    pub submitted_at: String,
}

impl From<&StakeholderFeedback> for FeedbackEntryResponse {
    fn from(feedback: &StakeholderFeedback) -> Self {
        Self {
            id: feedback.id().to_string(),
            kind: feedback.kind(),
            grid_index: feedback.target().grid_index().map(|g| g.as_u32()),
            text: feedback.text().to_string(),
            submitter_email: feedback.submitter_email().as_str().to_string(),
            submitted_at: feedback.submitted_at().to_rfc3339(),
        }
    }
}

/// Response for submitted feedback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSubmittedResponse {
    pub status: &'static str,
    pub feedback: FeedbackEntryResponse,
}

impl From<&StakeholderFeedback> for FeedbackSubmittedResponse {
    fn from(feedback: &StakeholderFeedback) -> Self {
        Self {
            status: SUCCESS,
            feedback: FeedbackEntryResponse::from(feedback),
        }
    }
}

/// Itemized feedback about one grid slot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemizedGroupResponse {
    pub grid_index: u32,
    pub anchor: AnchorState,
    pub record: Option<RecordResponse>,
    /// Resolve these together with one action.
    pub feedback_identity: Vec<String>,
    pub entries: Vec<FeedbackEntryResponse>,
}

impl From<&ItemizedFeedbackGroup> for ItemizedGroupResponse {
    fn from(group: &ItemizedFeedbackGroup) -> Self {
        Self {
            grid_index: group.grid_index.as_u32(),
            anchor: group.anchor,
            record: group.record.as_ref().map(RecordResponse::from),
            feedback_identity: group.feedback_ids().iter().map(|id| id.to_string()).collect(),
            entries: group.entries.iter().map(FeedbackEntryResponse::from).collect(),
        }
    }
}

/// Unresolved feedback of a focus area.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedFeedbackResponse {
    pub status: &'static str,
    pub general: Vec<FeedbackEntryResponse>,
    pub itemized: Vec<ItemizedGroupResponse>,
}

impl From<&UnresolvedFeedback> for UnresolvedFeedbackResponse {
    fn from(feedback: &UnresolvedFeedback) -> Self {
        Self {
            status: SUCCESS,
            general: feedback.general.iter().map(FeedbackEntryResponse::from).collect(),
            itemized: feedback.itemized.iter().map(ItemizedGroupResponse::from).collect(),
        }
    }
}

/// One version with its records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshotResponse {
    pub status: &'static str,
    pub focus_area_id: String,
    pub focus_area_name: String,
    pub is_current: bool,
    #[serde(flatten)]
    pub version: VersionResponse,
    pub records: Vec<RecordResponse>,
}

impl From<&VersionSnapshot> for VersionSnapshotResponse {
    fn from(snapshot: &VersionSnapshot) -> Self {
        Self {
            status: SUCCESS,
            focus_area_id: snapshot.focus_area.id().to_string(),
            focus_area_name: snapshot.focus_area.name().to_string(),
            is_current: snapshot.is_current,
            version: VersionResponse::from(&snapshot.version),
            records: snapshot.records.iter().map(RecordResponse::from).collect(),
        }
    }
}

/// Response for a successful delete.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self { status: SUCCESS }
    }
}

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    pub kind: ErrorKind,
}

impl ErrorResponse {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: ERROR,
            message: message.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    fn write(identity: &str) -> RecordWriteRequest {
        serde_json::from_str(&format!(
            r#"{{"identity": "{}", "isDeleted": false, "properties": {{"Title": "Outage", "Severity": "High"}}}}"#,
            identity
        ))
        .unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // Record writes
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn new_identity_becomes_insert() {
        let patches = to_patch_set(vec![write("new"), write("NEW")]).unwrap();
        assert_eq!(patches.insert_count(), 2);
    }

    #[test]
    fn record_id_identity_becomes_update() {
        let id = RecordId::new();
        let patches = to_patch_set(vec![write(&id.to_string())]).unwrap();
        let patch = patches.iter().next().unwrap();
        assert!(matches!(patch, RecordPatch::Update { record_id, .. } if *record_id == id));
    }

    #[test]
    fn properties_keep_request_order() {
        let patches = to_patch_set(vec![write("new")]).unwrap();
        let keys: Vec<&str> = patches.iter().next().unwrap().properties().keys().collect();
        assert_eq!(keys, vec!["Title", "Severity"]);
    }

    #[test]
    fn garbage_identity_is_rejected() {
        let err = to_patch_set(vec![write("row-7")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn duplicate_update_targets_are_rejected() {
        let id = RecordId::new().to_string();
        let err = to_patch_set(vec![write(&id), write(&id)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    // ───────────────────────────────────────────────────────────────
    // Feedback actions
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn feedback_identity_accepts_one_or_many() {
        let a = FeedbackId::new();
        let b = FeedbackId::new();
        let one: ActionedFeedbackRequest = serde_json::from_value(serde_json::json!({
            "source": "general",
            "feedbackIdentity": a.to_string(),
            "action": "applied"
        }))
        .unwrap();
        let many: ActionedFeedbackRequest = serde_json::from_value(serde_json::json!({
            "source": "itemized",
            "feedbackIdentity": [a.to_string(), b.to_string()],
            "action": "ignored"
        }))
        .unwrap();

        assert_eq!(one.into_action().unwrap().feedback_ids(), &[a]);
        let many = many.into_action().unwrap();
        assert_eq!(many.feedback_ids(), &[a, b]);
        assert_eq!(many.action(), ResolvedAction::Ignored);
    }

    #[test]
    fn unknown_action_is_rejected() {
        let request: ActionedFeedbackRequest = serde_json::from_value(serde_json::json!({
            "source": "general",
            "feedbackIdentity": FeedbackId::new().to_string(),
            "action": "postponed"
        }))
        .unwrap();
        assert_eq!(request.into_action().unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn error_response_shape() {
        let body = serde_json::to_value(ErrorResponse::new(ErrorKind::Conflict, "Refresh")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "error", "message": "Refresh", "kind": "conflict"})
        );
    }
}
