//! Clone-and-patch: materializes a new version from the current one.
//!
//! The plan is built entirely in memory:
//!
//! 1. Every record of the current version is carried forward into an arena,
//!    and an explicit old-id → arena-slot map is recorded while doing so.
//! 2. `Update` patches resolve their target through that map and overwrite
//!    only content fields of the cloned row.
//! 3. `Insert` patches get a grid index strictly greater than every index
//!    already in the arena, and are appended at the end of display order.
//!
//! The store then persists the version and its records in one transaction.

use std::collections::HashMap;

use thiserror::Error;

use super::patch::{PatchSet, RecordPatch};
use super::record::{DisplayOrder, FocusAreaRecord, GridIndex};
use super::version::{FocusAreaVersion, VersionNumber};
use crate::domain::foundation::{
    DomainError, ErrorCode, FocusAreaId, RecordId, Timestamp, UserId, VersionId,
};

/// Reasons a plan cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionPlanError {
    #[error("Record {record_id} is not part of the current version")]
    UnknownRecord { record_id: RecordId },

    #[error("Record {record_id} belongs to version {found}, not {expected}")]
    ForeignRecord {
        record_id: RecordId,
        expected: VersionId,
        found: VersionId,
    },

    #[error("No grid index left for a new record")]
    GridIndexExhausted,

    #[error("Version number overflow")]
    VersionNumberExhausted,
}

impl From<RevisionPlanError> for DomainError {
    fn from(err: RevisionPlanError) -> Self {
        match &err {
            RevisionPlanError::UnknownRecord { record_id } => {
                DomainError::new(ErrorCode::UnknownRecord, err.to_string())
                    .with_detail("record_id", record_id.to_string())
            }
            RevisionPlanError::ForeignRecord { .. } => {
                DomainError::new(ErrorCode::InternalError, err.to_string())
            }
            RevisionPlanError::GridIndexExhausted | RevisionPlanError::VersionNumberExhausted => {
                DomainError::new(ErrorCode::ValidationFailed, err.to_string())
            }
        }
    }
}

/// Hands out grid indexes and display orders for inserted rows.
struct SlotAllocator {
    next_grid: Option<GridIndex>,
    next_order: Option<DisplayOrder>,
}

impl SlotAllocator {
    fn after(records: &[FocusAreaRecord]) -> Self {
        let next_grid = match records.iter().map(|r| r.grid_index()).max() {
            Some(max) => max.next(),
            None => Some(GridIndex::FIRST),
        };
        let next_order = match records.iter().map(|r| r.display_order()).max() {
            Some(max) => max.next(),
            None => Some(DisplayOrder::FIRST),
        };
        Self {
            next_grid,
            next_order,
        }
    }

    fn allocate(&mut self) -> Result<(GridIndex, DisplayOrder), RevisionPlanError> {
        let grid = self.next_grid.ok_or(RevisionPlanError::GridIndexExhausted)?;
        // Display order saturates: it only affects presentation.
        let order = self.next_order.unwrap_or(DisplayOrder::new(u32::MAX));
        self.next_grid = grid.next();
        self.next_order = order.next().or(Some(order));
        Ok((grid, order))
    }
}

/// A fully built, not yet persisted, version transition.
#[derive(Debug, Clone)]
pub struct RevisionPlan {
    version: FocusAreaVersion,
    records: Vec<FocusAreaRecord>,
    carried: HashMap<RecordId, RecordId>,
    updated: Vec<RecordId>,
    inserted: Vec<RecordId>,
}

impl RevisionPlan {
    /// Builds version `current + 1` from the current version's records.
    ///
    /// `current_records` must be the complete record set of `current`,
    /// soft-deleted rows included, so the new version is copy-complete.
    pub fn build(
        current: &FocusAreaVersion,
        current_records: &[FocusAreaRecord],
        patches: &PatchSet,
        revision_summary: Option<String>,
        created_by: Option<UserId>,
        now: Timestamp,
    ) -> Result<Self, RevisionPlanError> {
        let number = current
            .version_number()
            .next()
            .ok_or(RevisionPlanError::VersionNumberExhausted)?;

        for record in current_records {
            if record.version_id() != current.id() {
                return Err(RevisionPlanError::ForeignRecord {
                    record_id: record.id(),
                    expected: current.id(),
                    found: record.version_id(),
                });
            }
        }

        let version = FocusAreaVersion::new(
            current.focus_area_id(),
            number,
            revision_summary,
            created_by,
            now,
        );
        Self::assemble(version, current_records, patches, now)
    }

    /// Builds version 1 of a new focus area. Only inserts are meaningful;
    /// an update has nothing to resolve against and is rejected.
    pub fn initial(
        focus_area_id: FocusAreaId,
        patches: &PatchSet,
        revision_summary: Option<String>,
        created_by: Option<UserId>,
        now: Timestamp,
    ) -> Result<Self, RevisionPlanError> {
        let version = FocusAreaVersion::new(
            focus_area_id,
            VersionNumber::INITIAL,
            revision_summary,
            created_by,
            now,
        );
        Self::assemble(version, &[], patches, now)
    }

    fn assemble(
        version: FocusAreaVersion,
        current_records: &[FocusAreaRecord],
        patches: &PatchSet,
        now: Timestamp,
    ) -> Result<Self, RevisionPlanError> {
        let mut arena: Vec<FocusAreaRecord> =
            Vec::with_capacity(current_records.len() + patches.insert_count());
        let mut slot_of: HashMap<RecordId, usize> = HashMap::with_capacity(current_records.len());

        for record in current_records {
            slot_of.insert(record.id(), arena.len());
            arena.push(record.carry_forward(version.id(), now));
        }

        let mut allocator = SlotAllocator::after(&arena);
        let mut updated = Vec::new();
        let mut inserted = Vec::new();

        for patch in patches.iter() {
            match patch {
                RecordPatch::Update {
                    record_id,
                    properties,
                    is_deleted,
                    provenance_id,
                } => {
                    let slot = *slot_of
                        .get(record_id)
                        .ok_or(RevisionPlanError::UnknownRecord {
                            record_id: *record_id,
                        })?;
                    let record = &mut arena[slot];
                    record.apply_update(properties.clone(), *is_deleted, *provenance_id);
                    updated.push(record.id());
                }
                RecordPatch::Insert {
                    properties,
                    is_deleted,
                    provenance_id,
                } => {
                    let (grid_index, display_order) = allocator.allocate()?;
                    let record = FocusAreaRecord::new_slot(
                        version.id(),
                        grid_index,
                        display_order,
                        properties.clone(),
                        *is_deleted,
                        *provenance_id,
                        now,
                    );
                    inserted.push(record.id());
                    arena.push(record);
                }
            }
        }

        let carried = slot_of
            .into_iter()
            .map(|(old, slot)| (old, arena[slot].id()))
            .collect();

        Ok(Self {
            version,
            records: arena,
            carried,
            updated,
            inserted,
        })
    }

    pub fn version(&self) -> &FocusAreaVersion {
        &self.version
    }

    /// All records of the new version, carried-forward rows first.
    pub fn records(&self) -> &[FocusAreaRecord] {
        &self.records
    }

    /// New storage identity of a record carried over from the prior version.
    pub fn carried_id(&self, previous: RecordId) -> Option<RecordId> {
        self.carried.get(&previous).copied()
    }

    /// Old → new identity map of every carried-forward record.
    pub fn carried_ids(&self) -> &HashMap<RecordId, RecordId> {
        &self.carried
    }

    /// New identities of rows touched by an update patch.
    pub fn updated_ids(&self) -> &[RecordId] {
        &self.updated
    }

    /// Identities of rows created by insert patches.
    pub fn inserted_ids(&self) -> &[RecordId] {
        &self.inserted
    }

    pub fn into_parts(self) -> (FocusAreaVersion, Vec<FocusAreaRecord>) {
        (self.version, self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::focus_area::record::RecordProperties;

    fn props(value: &str) -> RecordProperties {
        RecordProperties::from_pairs([("A", value)]).unwrap()
    }

    fn version(number: u32) -> FocusAreaVersion {
        FocusAreaVersion::new(
            FocusAreaId::new(),
            VersionNumber::new(number).unwrap(),
            None,
            None,
            Timestamp::now(),
        )
    }

    fn record(version: &FocusAreaVersion, grid: u32, order: u32, value: &str, deleted: bool) -> FocusAreaRecord {
        FocusAreaRecord::new_slot(
            version.id(),
            GridIndex::new(grid),
            DisplayOrder::new(order),
            props(value),
            deleted,
            None,
            Timestamp::now(),
        )
    }

    fn by_grid(plan: &RevisionPlan, grid: u32) -> &FocusAreaRecord {
        plan.records()
            .iter()
            .find(|r| r.grid_index() == GridIndex::new(grid))
            .unwrap()
    }

    #[test]
    fn risks_scenario_update_delete_insert() {
        let v3 = version(3);
        let r1 = record(&v3, 1, 2, "x", false);
        let r2 = record(&v3, 2, 3, "y", false);
        let patches = PatchSet::new(vec![
            RecordPatch::update(r1.id(), props("z")),
            RecordPatch::delete(r2.id(), props("y")),
            RecordPatch::insert(props("w")),
        ])
        .unwrap();

        let plan = RevisionPlan::build(&v3, &[r1.clone(), r2.clone()], &patches, None, None, Timestamp::now())
            .unwrap();

        assert_eq!(plan.version().version_number().as_u32(), 4);
        assert_eq!(plan.version().focus_area_id(), v3.focus_area_id());
        assert_eq!(plan.records().len(), 3);

        let g1 = by_grid(&plan, 1);
        assert_eq!(g1.properties().get("A"), Some("z"));
        assert!(!g1.is_deleted());

        let g2 = by_grid(&plan, 2);
        assert_eq!(g2.properties().get("A"), Some("y"));
        assert!(g2.is_deleted());

        let g3 = by_grid(&plan, 3);
        assert_eq!(g3.properties().get("A"), Some("w"));
        assert!(!g3.is_deleted());
        assert_eq!(g3.display_order(), DisplayOrder::new(4));

        assert!(plan.records().iter().all(|r| r.version_id() == plan.version().id()));
    }

    #[test]
    fn untouched_records_are_cloned_verbatim() {
        let v1 = version(1);
        let kept = record(&v1, 5, 9, "keep", true);
        let plan = RevisionPlan::build(&v1, &[kept.clone()], &PatchSet::default(), None, None, Timestamp::now())
            .unwrap();

        let clone = &plan.records()[0];
        assert_ne!(clone.id(), kept.id());
        assert_eq!(plan.carried_id(kept.id()), Some(clone.id()));
        assert_eq!(clone.grid_index(), kept.grid_index());
        assert_eq!(clone.display_order(), kept.display_order());
        assert_eq!(clone.properties(), kept.properties());
        assert!(clone.is_deleted());
    }

    #[test]
    fn update_resolves_through_clone_map_only() {
        let v2 = version(2);
        let r = record(&v2, 1, 1, "x", false);
        let stranger = RecordId::new();
        let patches = PatchSet::new(vec![RecordPatch::update(stranger, props("z"))]).unwrap();

        let err = RevisionPlan::build(&v2, &[r], &patches, None, None, Timestamp::now()).unwrap_err();
        assert_eq!(err, RevisionPlanError::UnknownRecord { record_id: stranger });
    }

    #[test]
    fn updating_new_identity_is_unknown() {
        // Ids of the plan's own clones are not valid update targets.
        let v1 = version(1);
        let r = record(&v1, 1, 1, "x", false);
        let first = RevisionPlan::build(&v1, &[r], &PatchSet::default(), None, None, Timestamp::now()).unwrap();
        let clone_id = first.records()[0].id();

        let v1_again = version(1);
        let r_again = record(&v1_again, 1, 1, "x", false);
        let patches = PatchSet::new(vec![RecordPatch::update(clone_id, props("z"))]).unwrap();
        assert!(RevisionPlan::build(&v1_again, &[r_again], &patches, None, None, Timestamp::now()).is_err());
    }

    #[test]
    fn inserts_get_increasing_unique_grid_indexes() {
        let v1 = version(1);
        let existing = vec![record(&v1, 3, 1, "a", false), record(&v1, 7, 2, "b", true)];
        let patches = PatchSet::new(vec![
            RecordPatch::insert(props("n1")),
            RecordPatch::insert(props("n2")),
            RecordPatch::insert(props("n3")),
        ])
        .unwrap();

        let plan = RevisionPlan::build(&v1, &existing, &patches, None, None, Timestamp::now()).unwrap();
        let grids: Vec<u32> = plan
            .inserted_ids()
            .iter()
            .map(|id| plan.records().iter().find(|r| r.id() == *id).unwrap().grid_index().as_u32())
            .collect();
        assert_eq!(grids, vec![8, 9, 10]);
    }

    #[test]
    fn insert_into_empty_version_starts_at_first_index() {
        let v1 = version(1);
        let patches = PatchSet::new(vec![RecordPatch::insert(props("a"))]).unwrap();
        let plan = RevisionPlan::build(&v1, &[], &patches, None, None, Timestamp::now()).unwrap();
        assert_eq!(plan.records()[0].grid_index(), GridIndex::FIRST);
        assert_eq!(plan.records()[0].display_order(), DisplayOrder::FIRST);
    }

    #[test]
    fn initial_plan_is_version_one() {
        let focus_area_id = FocusAreaId::new();
        let patches = PatchSet::new(vec![
            RecordPatch::insert(props("a")),
            RecordPatch::insert(props("b")),
        ])
        .unwrap();
        let plan = RevisionPlan::initial(focus_area_id, &patches, Some("Seed".into()), None, Timestamp::now())
            .unwrap();

        assert_eq!(plan.version().version_number(), VersionNumber::INITIAL);
        assert_eq!(plan.version().focus_area_id(), focus_area_id);
        let grids: Vec<u32> = plan.records().iter().map(|r| r.grid_index().as_u32()).collect();
        assert_eq!(grids, vec![1, 2]);
    }

    #[test]
    fn initial_plan_rejects_updates() {
        let patches = PatchSet::new(vec![RecordPatch::update(RecordId::new(), props("a"))]).unwrap();
        assert!(matches!(
            RevisionPlan::initial(FocusAreaId::new(), &patches, None, None, Timestamp::now()),
            Err(RevisionPlanError::UnknownRecord { .. })
        ));
    }

    #[test]
    fn foreign_record_is_rejected() {
        let v1 = version(1);
        let other = version(1);
        let stray = record(&other, 1, 1, "x", false);
        assert!(matches!(
            RevisionPlan::build(&v1, &[stray], &PatchSet::default(), None, None, Timestamp::now()),
            Err(RevisionPlanError::ForeignRecord { .. })
        ));
    }

    #[test]
    fn grid_index_exhaustion_is_reported() {
        let v1 = version(1);
        let full = record(&v1, u32::MAX, 1, "x", false);
        let patches = PatchSet::new(vec![RecordPatch::insert(props("n"))]).unwrap();
        assert_eq!(
            RevisionPlan::build(&v1, &[full], &patches, None, None, Timestamp::now()).unwrap_err(),
            RevisionPlanError::GridIndexExhausted
        );
    }

    #[test]
    fn unknown_record_maps_to_validation_kind() {
        let err: DomainError = RevisionPlanError::UnknownRecord {
            record_id: RecordId::new(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::UnknownRecord);
    }
}
