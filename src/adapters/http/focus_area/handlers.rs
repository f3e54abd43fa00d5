//! HTTP handlers for package and focus-area endpoints.
//!
//! These handlers connect axum routes to application layer command/query handlers.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use super::dto::{
    to_patch_set, CreateFocusAreaRequest, CreatePackageRequest, ErrorResponse,
    FocusAreaCreatedResponse, FeedbackSubmittedResponse, PackageResponse, PackageStateParams,
    PackageStateResponse, ReviseRequest, RevisionResponse, SnapshotParams, StatusResponse,
    SubmitFeedbackRequest, UnresolvedFeedbackResponse, VersionSnapshotResponse,
};
use crate::application::handlers::{
    CreateFocusAreaCommand, CreateFocusAreaHandler, CreatePackageCommand, CreatePackageHandler,
    DeleteFocusAreaCommand, DeleteFocusAreaHandler, GetPackageStateHandler, GetPackageStateQuery,
    GetUnresolvedFeedbackHandler, GetUnresolvedFeedbackQuery, GetVersionSnapshotHandler,
    GetVersionSnapshotQuery, ReviseFocusAreaCommand, ReviseFocusAreaError,
    ReviseFocusAreaHandler, SubmitFeedbackCommand, SubmitFeedbackHandler,
};
use crate::domain::feedback::FeedbackTarget;
use crate::domain::focus_area::{GridIndex, VersionNumber};
use crate::domain::foundation::{
    DomainError, ErrorKind, FocusAreaId, OrganizationId, PackageId, RequestContext, UserId,
    VersionId,
};
use crate::ports::{FocusAreaReader, RecordStore};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for focus-area HTTP handlers.
#[derive(Clone)]
pub struct FocusAreaAppState {
    pub store: Arc<dyn RecordStore>,
    pub reader: Arc<dyn FocusAreaReader>,
}

impl FocusAreaAppState {
    pub fn new(store: Arc<dyn RecordStore>, reader: Arc<dyn FocusAreaReader>) -> Self {
        Self { store, reader }
    }

    pub fn create_package_handler(&self) -> CreatePackageHandler {
        CreatePackageHandler::new(self.store.clone())
    }

    pub fn create_focus_area_handler(&self) -> CreateFocusAreaHandler {
        CreateFocusAreaHandler::new(self.store.clone())
    }

    pub fn delete_focus_area_handler(&self) -> DeleteFocusAreaHandler {
        DeleteFocusAreaHandler::new(self.store.clone())
    }

    pub fn revise_focus_area_handler(&self) -> ReviseFocusAreaHandler {
        ReviseFocusAreaHandler::new(self.store.clone())
    }

    pub fn submit_feedback_handler(&self) -> SubmitFeedbackHandler {
        SubmitFeedbackHandler::new(self.store.clone())
    }

    pub fn get_package_state_handler(&self) -> GetPackageStateHandler {
        GetPackageStateHandler::new(self.reader.clone())
    }

    pub fn get_unresolved_feedback_handler(&self) -> GetUnresolvedFeedbackHandler {
        GetUnresolvedFeedbackHandler::new(self.reader.clone())
    }

    pub fn get_version_snapshot_handler(&self) -> GetVersionSnapshotHandler {
        GetVersionSnapshotHandler::new(self.reader.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Authentication
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity taken from gateway headers.
///
/// The gateway authenticates the user and forwards `X-User-Id` and
/// `X-Organization-Id`; `X-Request-Id` becomes the correlation id.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub RequestContext);

/// Rejection for requests without identity headers.
#[derive(Debug)]
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        ApiError::Unauthorized("Authentication is required".to_string()).into_response()
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header(parts, "X-User-Id")
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;
        let organization_id = header(parts, "X-Organization-Id")
            .and_then(|s| OrganizationId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        let mut ctx = RequestContext::new(user_id, organization_id);
        if let Some(request_id) = header(parts, "X-Request-Id") {
            ctx = ctx.with_correlation_id(request_id);
        }
        Ok(AuthenticatedUser(ctx))
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Package Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/packages - Create a package
pub async fn create_package(
    State(state): State<FocusAreaAppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    body: Result<Json<CreatePackageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;

    let package = state
        .create_package_handler()
        .handle(CreatePackageCommand { name: request.name }, &ctx)
        .await?;

    Ok((StatusCode::CREATED, Json(PackageResponse::from(&package))))
}

/// GET /api/packages/:package_id/focus-areas - Current state of every focus area
pub async fn get_package_state(
    State(state): State<FocusAreaAppState>,
    Path(package_id): Path<String>,
    Query(params): Query<PackageStateParams>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetPackageStateQuery {
        package_id: parse_package_id(&package_id)?,
        include_deleted: params.include_deleted,
        include_history: params.include_history,
    };

    let package_state = state.get_package_state_handler().handle(query, &ctx).await?;

    Ok(Json(PackageStateResponse::from(&package_state)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Focus Area Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/packages/:package_id/focus-areas - Create a focus area
pub async fn create_focus_area(
    State(state): State<FocusAreaAppState>,
    Path(package_id): Path<String>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    body: Result<Json<CreateFocusAreaRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let cmd = CreateFocusAreaCommand {
        package_id: parse_package_id(&package_id)?,
        name: request.name,
        initial_records: to_patch_set(request.records)?,
    };

    let result = state.create_focus_area_handler().handle(cmd, &ctx).await?;

    let response = FocusAreaCreatedResponse::new(
        result.focus_area.id().to_string(),
        result.focus_area.name().to_string(),
        &result.version,
        &result.records,
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/packages/:package_id/revisions - Commit a revision
pub async fn revise_focus_area(
    State(state): State<FocusAreaAppState>,
    Path(package_id): Path<String>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    body: Result<Json<ReviseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let expected_version_id: VersionId = request
        .expected_version_id
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid version ID format".to_string()))?;
    let actioned_feedback = request
        .actioned_feedback
        .into_iter()
        .map(|a| a.into_action())
        .collect::<Result<Vec<_>, _>>()?;

    let cmd = ReviseFocusAreaCommand {
        package_id: parse_package_id(&package_id)?,
        focus_area_name: request.focus_area_name,
        expected_version_id,
        patches: to_patch_set(request.records)?,
        revision_summary: request.revision_summary,
        actioned_feedback,
    };

    let result = state.revise_focus_area_handler().handle(cmd, &ctx).await?;

    Ok(Json(RevisionResponse::from(&result)))
}

/// DELETE /api/packages/:package_id/focus-areas/:focus_area_id - Soft-delete a focus area
pub async fn delete_focus_area(
    State(state): State<FocusAreaAppState>,
    Path((package_id, focus_area_id)): Path<(String, String)>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = DeleteFocusAreaCommand {
        package_id: parse_package_id(&package_id)?,
        focus_area_id: parse_focus_area_id(&focus_area_id)?,
    };

    state.delete_focus_area_handler().handle(cmd, &ctx).await?;

    Ok(Json(StatusResponse::success()))
}

/// GET /api/packages/:package_id/focus-areas/:focus_area_id/versions/:version - One version
pub async fn get_version_snapshot(
    State(state): State<FocusAreaAppState>,
    Path((package_id, focus_area_id, version)): Path<(String, String, u32)>,
    Query(params): Query<SnapshotParams>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let version_number = VersionNumber::new(version)
        .map_err(|_| ApiError::BadRequest("Version numbers start at 1".to_string()))?;
    let query = GetVersionSnapshotQuery {
        package_id: parse_package_id(&package_id)?,
        focus_area_id: parse_focus_area_id(&focus_area_id)?,
        version_number,
        include_deleted: params.include_deleted,
    };

    let snapshot = state.get_version_snapshot_handler().handle(query, &ctx).await?;

    Ok(Json(VersionSnapshotResponse::from(&snapshot)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Feedback Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/packages/:package_id/focus-areas/:focus_area_id/feedback - Submit feedback
pub async fn submit_feedback(
    State(state): State<FocusAreaAppState>,
    Path((package_id, focus_area_id)): Path<(String, String)>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    body: Result<Json<SubmitFeedbackRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let target = match request.grid_index {
        Some(grid_index) => FeedbackTarget::Itemized {
            grid_index: GridIndex::new(grid_index),
        },
        None => FeedbackTarget::General,
    };
    let cmd = SubmitFeedbackCommand {
        package_id: parse_package_id(&package_id)?,
        focus_area_id: parse_focus_area_id(&focus_area_id)?,
        target,
        text: request.text,
        submitter_email: request.submitter_email,
    };

    let feedback = state.submit_feedback_handler().handle(cmd, &ctx).await?;

    Ok((
        StatusCode::CREATED,
        Json(FeedbackSubmittedResponse::from(&feedback)),
    ))
}

/// GET /api/packages/:package_id/focus-areas/:focus_area_id/feedback - Unresolved feedback
pub async fn get_unresolved_feedback(
    State(state): State<FocusAreaAppState>,
    Path((package_id, focus_area_id)): Path<(String, String)>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetUnresolvedFeedbackQuery {
        package_id: parse_package_id(&package_id)?,
        focus_area_id: parse_focus_area_id(&focus_area_id)?,
    };

    let feedback = state
        .get_unresolved_feedback_handler()
        .handle(query, &ctx)
        .await?;

    Ok(Json(UnresolvedFeedbackResponse::from(&feedback)))
}

fn parse_package_id(raw: &str) -> Result<PackageId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid package ID format".to_string()))
}

fn parse_focus_area_id(raw: &str) -> Result<FocusAreaId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid focus area ID format".to_string()))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type for focus-area endpoints.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::Validation,
            ApiError::Unauthorized(_) => ErrorKind::Unauthorized,
            ApiError::Forbidden(_) => ErrorKind::Forbidden,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::Internal(_) => ErrorKind::Persistence,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err.kind() {
            ErrorKind::Validation => ApiError::BadRequest(err.message),
            ErrorKind::NotFound => ApiError::NotFound(err.message),
            ErrorKind::Conflict => ApiError::Conflict(err.message),
            ErrorKind::Forbidden => ApiError::Forbidden(err.message),
            ErrorKind::Unauthorized => ApiError::Unauthorized(err.message),
            ErrorKind::Persistence => {
                tracing::error!(code = %err.code, error = %err.message, "storage failure");
                ApiError::Internal("The change could not be saved".to_string())
            }
        }
    }
}

impl From<ReviseFocusAreaError> for ApiError {
    fn from(err: ReviseFocusAreaError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(kind, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::focus_area::VersionConflict;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn domain_errors_map_by_kind() {
        let not_found: ApiError =
            DomainError::new(ErrorCode::FocusAreaNotFound, "Focus area not found").into();
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let conflict: ApiError =
            DomainError::new(ErrorCode::DuplicateFocusArea, "Name taken").into();
        assert!(matches!(conflict, ApiError::Conflict(_)));

        let invalid: ApiError = DomainError::new(ErrorCode::UnknownRecord, "Unknown").into();
        assert!(matches!(invalid, ApiError::BadRequest(_)));
    }

    #[test]
    fn storage_details_stay_on_the_server() {
        let err: ApiError =
            DomainError::new(ErrorCode::DatabaseError, "connection refused on 10.0.0.4").into();
        match err {
            ApiError::Internal(msg) => assert!(!msg.contains("10.0.0.4")),
            other => panic!("expected Internal, got {:?}", other),
        }
    }

    #[test]
    fn stale_revision_is_conflict() {
        let err: ApiError = ReviseFocusAreaError::Conflict(VersionConflict {
            focus_area_id: FocusAreaId::new(),
            expected: VersionId::new(),
            actual: VersionId::new(),
        })
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn api_error_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
