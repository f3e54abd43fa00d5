//! Groups unresolved feedback for display against the current version.
//!
//! Itemized feedback is joined to records by grid index, never by record
//! id: record ids change on every clone while the grid index is durable.

use std::collections::BTreeMap;

use serde::Serialize;

use super::entry::{FeedbackTarget, StakeholderFeedback};
use crate::domain::focus_area::{FocusAreaRecord, GridIndex};
use crate::domain::foundation::FeedbackId;

/// How an itemized group relates to the current version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorState {
    /// A live record with this grid index exists.
    Live,
    /// The record exists but is soft-deleted in the current version.
    Deleted,
    /// No record with this grid index exists in the current version.
    Orphaned,
}

/// All unresolved feedback about one record slot.
#[derive(Debug, Clone, Serialize)]
pub struct ItemizedFeedbackGroup {
    pub grid_index: GridIndex,
    pub anchor: AnchorState,
    /// The current version's record for this slot, if any.
    pub record: Option<FocusAreaRecord>,
    pub entries: Vec<StakeholderFeedback>,
}

impl ItemizedFeedbackGroup {
    /// Identities to resolve together when one action is chosen for the group.
    pub fn feedback_ids(&self) -> Vec<FeedbackId> {
        self.entries.iter().map(|f| f.id()).collect()
    }
}

/// Unresolved feedback of one focus area.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnresolvedFeedback {
    pub general: Vec<StakeholderFeedback>,
    pub itemized: Vec<ItemizedFeedbackGroup>,
}

impl UnresolvedFeedback {
    /// Builds the grouped view.
    ///
    /// `current_records` must include soft-deleted rows so deleted anchors
    /// can be told apart from orphans. Resolved entries are skipped.
    pub fn assemble(feedback: Vec<StakeholderFeedback>, current_records: &[FocusAreaRecord]) -> Self {
        let by_grid: BTreeMap<GridIndex, &FocusAreaRecord> = current_records
            .iter()
            .map(|r| (r.grid_index(), r))
            .collect();

        let mut general = Vec::new();
        let mut grouped: BTreeMap<GridIndex, Vec<StakeholderFeedback>> = BTreeMap::new();

        for entry in feedback.into_iter().filter(|f| !f.is_resolved()) {
            match entry.target() {
                FeedbackTarget::General => general.push(entry),
                FeedbackTarget::Itemized { grid_index } => {
                    grouped.entry(grid_index).or_default().push(entry)
                }
            }
        }

        general.sort_by_key(|f| f.submitted_at());

        let itemized = grouped
            .into_iter()
            .map(|(grid_index, mut entries)| {
                entries.sort_by_key(|f| f.submitted_at());
                let record = by_grid.get(&grid_index).map(|r| (*r).clone());
                let anchor = match &record {
                    Some(r) if r.is_deleted() => AnchorState::Deleted,
                    Some(_) => AnchorState::Live,
                    None => AnchorState::Orphaned,
                };
                ItemizedFeedbackGroup {
                    grid_index,
                    anchor,
                    record,
                    entries,
                }
            })
            .collect();

        Self { general, itemized }
    }

    /// Total number of unresolved entries, general and itemized.
    pub fn count(&self) -> usize {
        self.general.len() + self.itemized.iter().map(|g| g.entries.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Groups whose slot no longer exists in the current version.
    pub fn orphaned(&self) -> impl Iterator<Item = &ItemizedFeedbackGroup> {
        self.itemized
            .iter()
            .filter(|g| g.anchor == AnchorState::Orphaned)
    }
}
