//! End-to-end revision scenarios against the in-memory record store.
//!
//! Covers the version transition, the optimistic concurrency guard, feedback
//! resolution and read idempotence through the public handlers.

use std::sync::Arc;

use focus_revisions::adapters::memory::InMemoryRecordStore;
use focus_revisions::application::handlers::{
    CreateFocusAreaCommand, CreateFocusAreaHandler, CreatePackageCommand, CreatePackageHandler,
    GetPackageStateHandler, GetPackageStateQuery, GetUnresolvedFeedbackHandler,
    GetUnresolvedFeedbackQuery, ReviseFocusAreaCommand, ReviseFocusAreaError,
    ReviseFocusAreaHandler, SubmitFeedbackCommand, SubmitFeedbackHandler,
};
use focus_revisions::domain::feedback::{FeedbackAction, FeedbackKind, FeedbackTarget, ResolvedAction};
use focus_revisions::domain::focus_area::{
    FocusAreaRecord, GridIndex, PatchSet, RecordPatch, RecordProperties,
};
use focus_revisions::domain::foundation::{
    ErrorKind, FeedbackId, FocusAreaId, OrganizationId, PackageId, RequestContext, UserId,
    VersionId,
};
use focus_revisions::ports::{FocusAreaReader, RecordStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn ctx() -> RequestContext {
    RequestContext::new(UserId::new("analyst").unwrap(), OrganizationId::new("acme").unwrap())
}

fn a(value: &str) -> RecordProperties {
    RecordProperties::from_pairs([("A", value)]).unwrap()
}

/// The "Risks" focus area at version 3 with records `{A:"x"}` and `{A:"y"}`.
struct RisksAtV3 {
    store: InMemoryRecordStore,
    package_id: PackageId,
    focus_area_id: FocusAreaId,
    v2: VersionId,
    v3: VersionId,
    records: Vec<FocusAreaRecord>,
}

impl RisksAtV3 {
    async fn new() -> Self {
        let store = InMemoryRecordStore::new();
        let shared: Arc<dyn RecordStore> = Arc::new(store.clone());

        let package = CreatePackageHandler::new(shared.clone())
            .handle(CreatePackageCommand { name: "Q3 review".into() }, &ctx())
            .await
            .unwrap();
        let created = CreateFocusAreaHandler::new(shared.clone())
            .handle(
                CreateFocusAreaCommand {
                    package_id: package.id(),
                    name: "Risks".into(),
                    initial_records: PatchSet::new(vec![
                        RecordPatch::insert(a("x")),
                        RecordPatch::insert(a("y")),
                    ])
                    .unwrap(),
                },
                &ctx(),
            )
            .await
            .unwrap();

        let revise = ReviseFocusAreaHandler::new(shared);
        let v2 = revise
            .handle(empty_revision(package.id(), created.version.id()), &ctx())
            .await
            .unwrap()
            .new_version_id;
        let v3 = revise
            .handle(empty_revision(package.id(), v2), &ctx())
            .await
            .unwrap()
            .new_version_id;

        let records = store.list_records(v3, true).await.unwrap();
        Self {
            store,
            package_id: package.id(),
            focus_area_id: created.focus_area.id(),
            v2,
            v3,
            records,
        }
    }

    fn shared(&self) -> Arc<dyn RecordStore> {
        Arc::new(self.store.clone())
    }

    fn record_at(&self, grid: u32) -> &FocusAreaRecord {
        self.records
            .iter()
            .find(|r| r.grid_index() == GridIndex::new(grid))
            .unwrap()
    }

    /// Update grid 1 to `z`, delete grid 2, insert `w`.
    fn submission(&self, expected_version_id: VersionId) -> ReviseFocusAreaCommand {
        ReviseFocusAreaCommand {
            package_id: self.package_id,
            focus_area_name: "Risks".into(),
            expected_version_id,
            patches: PatchSet::new(vec![
                RecordPatch::update(self.record_at(1).id(), a("z")),
                RecordPatch::delete(self.record_at(2).id(), a("y")),
                RecordPatch::insert(a("w")),
            ])
            .unwrap(),
            revision_summary: Some("Reworked risks".into()),
            actioned_feedback: vec![],
        }
    }

    async fn current_version_id(&self) -> VersionId {
        self.store
            .find_focus_area(self.package_id, self.focus_area_id)
            .await
            .unwrap()
            .unwrap()
            .current_version_id()
    }

    async fn submit_feedback(&self, target: FeedbackTarget, text: &str) -> FeedbackId {
        SubmitFeedbackHandler::new(self.shared())
            .handle(
                SubmitFeedbackCommand {
                    package_id: self.package_id,
                    focus_area_id: self.focus_area_id,
                    target,
                    text: text.into(),
                    submitter_email: "stakeholder@example.com".into(),
                },
                &ctx(),
            )
            .await
            .unwrap()
            .id()
    }
}

fn empty_revision(package_id: PackageId, expected_version_id: VersionId) -> ReviseFocusAreaCommand {
    ReviseFocusAreaCommand {
        package_id,
        focus_area_name: "Risks".into(),
        expected_version_id,
        patches: PatchSet::default(),
        revision_summary: None,
        actioned_feedback: vec![],
    }
}

fn state_query(package_id: PackageId) -> GetPackageStateQuery {
    GetPackageStateQuery {
        package_id,
        include_deleted: true,
        include_history: true,
    }
}

// =============================================================================
// Version transition
// =============================================================================

#[tokio::test]
async fn risks_v3_revision_produces_v4() {
    let risks = RisksAtV3::new().await;

    let result = ReviseFocusAreaHandler::new(risks.shared())
        .handle(risks.submission(risks.v3), &ctx())
        .await
        .unwrap();

    assert_eq!(result.new_version_number.as_u32(), 4);
    assert_eq!(risks.current_version_id().await, result.new_version_id);

    let v4 = risks.store.list_records(result.new_version_id, true).await.unwrap();
    let summary: Vec<(u32, bool, Option<&str>)> = v4
        .iter()
        .map(|r| (r.grid_index().as_u32(), r.is_deleted(), r.properties().get("A")))
        .collect();
    assert_eq!(
        summary,
        vec![
            (1, false, Some("z")),
            (2, true, Some("y")),
            (3, false, Some("w")),
        ]
    );

    // Version 3 is untouched
    let v3 = risks.store.list_records(risks.v3, true).await.unwrap();
    assert_eq!(v3.len(), 2);
    assert!(v3.iter().all(|r| !r.is_deleted()));
    assert_eq!(v3[0].properties().get("A"), Some("x"));
}

#[tokio::test]
async fn stale_expected_version_is_rejected_without_side_effects() {
    let risks = RisksAtV3::new().await;
    let versions_before = risks.store.version_count(risks.focus_area_id).await;
    let rows_before = risks.store.record_row_count().await;

    let err = ReviseFocusAreaHandler::new(risks.shared())
        .handle(risks.submission(risks.v2), &ctx())
        .await
        .unwrap_err();

    assert!(matches!(err, ReviseFocusAreaError::Conflict(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(risks.store.version_count(risks.focus_area_id).await, versions_before);
    assert_eq!(risks.store.record_row_count().await, rows_before);
    assert_eq!(risks.current_version_id().await, risks.v3);
}

#[tokio::test]
async fn concurrent_revisions_of_the_same_version_let_exactly_one_win() {
    let risks = RisksAtV3::new().await;
    let handler = Arc::new(ReviseFocusAreaHandler::new(risks.shared()));

    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let handler = handler.clone();
            let cmd = risks.submission(risks.v3);
            tokio::spawn(async move { handler.handle(cmd, &ctx()).await })
        })
        .collect();

    let mut committed = Vec::new();
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(result) => committed.push(result),
            Err(ReviseFocusAreaError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(committed.len(), 1);
    assert_eq!(conflicts, 1);
    assert_eq!(committed[0].new_version_number.as_u32(), 4);
    assert_eq!(risks.current_version_id().await, committed[0].new_version_id);
    assert_eq!(risks.store.version_count(risks.focus_area_id).await, 4);
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn package_state_reads_are_idempotent() {
    let risks = RisksAtV3::new().await;
    let reader: Arc<dyn FocusAreaReader> = Arc::new(risks.store.clone());
    let handler = GetPackageStateHandler::new(reader);

    let first = handler.handle(state_query(risks.package_id), &ctx()).await.unwrap();
    let second = handler.handle(state_query(risks.package_id), &ctx()).await.unwrap();

    assert_eq!(first.focus_areas.len(), 1);
    assert_eq!(first.focus_areas[0].version.id(), second.focus_areas[0].version.id());
    assert_eq!(first.focus_areas[0].records, second.focus_areas[0].records);
    assert_eq!(first.focus_areas[0].history, second.focus_areas[0].history);
    assert_eq!(first.focus_areas[0].history.as_ref().map(Vec::len), Some(3));
}

// =============================================================================
// Feedback resolution
// =============================================================================

#[tokio::test]
async fn resolved_feedback_leaves_the_unresolved_view() {
    let risks = RisksAtV3::new().await;
    let general = risks.submit_feedback(FeedbackTarget::General, "Too vague").await;
    let itemized_a = risks
        .submit_feedback(FeedbackTarget::Itemized { grid_index: GridIndex::new(1) }, "Quantify")
        .await;
    let itemized_b = risks
        .submit_feedback(FeedbackTarget::Itemized { grid_index: GridIndex::new(1) }, "Which region?")
        .await;
    let untouched = risks
        .submit_feedback(FeedbackTarget::Itemized { grid_index: GridIndex::new(2) }, "Still relevant?")
        .await;

    let mut cmd = risks.submission(risks.v3);
    cmd.actioned_feedback = vec![
        FeedbackAction::single(FeedbackKind::General, general, ResolvedAction::Applied),
        FeedbackAction::new(
            FeedbackKind::Itemized,
            vec![itemized_a, itemized_b],
            ResolvedAction::Instructed,
        )
        .unwrap(),
    ];
    let result = ReviseFocusAreaHandler::new(risks.shared())
        .handle(cmd, &ctx())
        .await
        .unwrap();
    assert_eq!(result.feedback.resolved.len(), 3);

    let unresolved = GetUnresolvedFeedbackHandler::new(Arc::new(risks.store.clone()))
        .handle(
            GetUnresolvedFeedbackQuery {
                package_id: risks.package_id,
                focus_area_id: risks.focus_area_id,
            },
            &ctx(),
        )
        .await
        .unwrap();

    assert!(unresolved.general.is_empty());
    assert_eq!(unresolved.itemized.len(), 1);
    assert_eq!(unresolved.itemized[0].feedback_ids(), vec![untouched]);
    assert_eq!(unresolved.itemized[0].grid_index, GridIndex::new(2));
}

#[tokio::test]
async fn unknown_feedback_rolls_back_the_whole_revision() {
    let risks = RisksAtV3::new().await;
    let general = risks.submit_feedback(FeedbackTarget::General, "Too vague").await;

    let mut cmd = risks.submission(risks.v3);
    cmd.actioned_feedback = vec![
        FeedbackAction::single(FeedbackKind::General, general, ResolvedAction::Applied),
        FeedbackAction::single(FeedbackKind::General, FeedbackId::new(), ResolvedAction::Ignored),
    ];
    let err = ReviseFocusAreaHandler::new(risks.shared())
        .handle(cmd, &ctx())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(risks.current_version_id().await, risks.v3);
    assert_eq!(risks.store.version_count(risks.focus_area_id).await, 3);

    let unresolved = risks.store.list_unresolved_feedback(risks.focus_area_id).await.unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].id(), general);
}
