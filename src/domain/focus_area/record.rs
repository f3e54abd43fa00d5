//! Focus-area records and their value objects.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ProvenanceId, RecordId, Timestamp, ValidationError, VersionId};

/// Durable positional identity of a logical row.
///
/// Preserved verbatim whenever a record is carried into a new version;
/// storage identity (`RecordId`) is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridIndex(u32);

impl GridIndex {
    /// Grid index handed to the first row of an empty focus area.
    pub const FIRST: GridIndex = GridIndex(1);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// The index directly after this one, or `None` on overflow.
    pub fn next(&self) -> Option<GridIndex> {
        self.0.checked_add(1).map(GridIndex)
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Presentation order, independent of grid index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayOrder(u32);

impl DisplayOrder {
    pub const FIRST: DisplayOrder = DisplayOrder(1);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Option<DisplayOrder> {
        self.0.checked_add(1).map(DisplayOrder)
    }
}

/// User-editable content of a record.
///
/// An insertion-ordered map of string keys to string values. The key set and
/// order survive storage round trips unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordProperties(IndexMap<String, String>);

impl RecordProperties {
    /// Creates validated properties.
    ///
    /// Keys must contain at least one non-whitespace character.
    pub fn new(map: IndexMap<String, String>) -> Result<Self, ValidationError> {
        let properties = Self(map);
        properties.validate()?;
        Ok(properties)
    }

    /// Builds properties from key/value pairs, keeping their order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, ValidationError>
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Checks the key constraints; used for values that arrived via serde.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.0.keys().any(|k| k.trim().is_empty()) {
            return Err(ValidationError::invalid_format(
                "properties",
                "property keys cannot be blank",
            ));
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One row of content inside a focus-area version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusAreaRecord {
    id: RecordId,
    version_id: VersionId,
    grid_index: GridIndex,
    display_order: DisplayOrder,
    properties: RecordProperties,
    is_deleted: bool,
    provenance_id: Option<ProvenanceId>,
    created_at: Timestamp,
}

impl FocusAreaRecord {
    /// Creates a brand-new slot in a version.
    pub(crate) fn new_slot(
        version_id: VersionId,
        grid_index: GridIndex,
        display_order: DisplayOrder,
        properties: RecordProperties,
        is_deleted: bool,
        provenance_id: Option<ProvenanceId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: RecordId::new(),
            version_id,
            grid_index,
            display_order,
            properties,
            is_deleted,
            provenance_id,
            created_at,
        }
    }

    /// Rebuilds a record from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: RecordId,
        version_id: VersionId,
        grid_index: GridIndex,
        display_order: DisplayOrder,
        properties: RecordProperties,
        is_deleted: bool,
        provenance_id: Option<ProvenanceId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            version_id,
            grid_index,
            display_order,
            properties,
            is_deleted,
            provenance_id,
            created_at,
        }
    }

    /// Copies this record into another version under a fresh storage identity.
    ///
    /// Grid index, display order, properties, deletion flag and provenance are
    /// carried verbatim.
    pub(crate) fn carry_forward(&self, version_id: VersionId, created_at: Timestamp) -> Self {
        Self {
            id: RecordId::new(),
            version_id,
            grid_index: self.grid_index,
            display_order: self.display_order,
            properties: self.properties.clone(),
            is_deleted: self.is_deleted,
            provenance_id: self.provenance_id,
            created_at,
        }
    }

    /// Overwrites the editable fields of a freshly cloned record.
    ///
    /// Grid index and display order are never touched. Provenance is only
    /// replaced when a new link is supplied.
    pub(crate) fn apply_update(
        &mut self,
        properties: RecordProperties,
        is_deleted: bool,
        provenance_id: Option<ProvenanceId>,
    ) {
        self.properties = properties;
        self.is_deleted = is_deleted;
        if provenance_id.is_some() {
            self.provenance_id = provenance_id;
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    pub fn grid_index(&self) -> GridIndex {
        self.grid_index
    }

    pub fn display_order(&self) -> DisplayOrder {
        self.display_order
    }

    pub fn properties(&self) -> &RecordProperties {
        &self.properties
    }

    pub fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    pub fn provenance_id(&self) -> Option<ProvenanceId> {
        self.provenance_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Sorts records into presentation order (display order, then grid index).
pub fn sort_for_display(records: &mut [FocusAreaRecord]) {
    records.sort_by_key(|r| (r.display_order(), r.grid_index()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> RecordProperties {
        RecordProperties::from_pairs(pairs.iter().copied()).unwrap()
    }

    // ───────────────────────────────────────────────────────────────
    // RecordProperties
    // ───────────────────────────────────────────────────────────────

    #[test]
    fn properties_keep_insertion_order() {
        let p = props(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
        let keys: Vec<_> = p.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn properties_round_trip_through_json() {
        let p = props(&[("Risk", "Churn"), ("Owner", ""), ("Likelihood", "High")]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"Risk":"Churn","Owner":"","Likelihood":"High"}"#);

        let back: RecordProperties = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["Risk", "Owner", "Likelihood"]);
    }

    #[test]
    fn blank_property_key_is_rejected() {
        assert!(RecordProperties::from_pairs([(" ", "x")]).is_err());
    }

    #[test]
    fn empty_properties_are_allowed() {
        let p = RecordProperties::default();
        assert!(p.is_empty());
        assert!(p.validate().is_ok());
    }

    // ───────────────────────────────────────────────────────────────
    // FocusAreaRecord
    // ───────────────────────────────────────────────────────────────

    fn sample_record() -> FocusAreaRecord {
        FocusAreaRecord::new_slot(
            VersionId::new(),
            GridIndex::new(4),
            DisplayOrder::new(7),
            props(&[("A", "x")]),
            false,
            Some(ProvenanceId::new()),
            Timestamp::now(),
        )
    }

    #[test]
    fn carry_forward_preserves_slot_identity() {
        let original = sample_record();
        let target = VersionId::new();
        let clone = original.carry_forward(target, Timestamp::now());

        assert_ne!(clone.id(), original.id());
        assert_eq!(clone.version_id(), target);
        assert_eq!(clone.grid_index(), original.grid_index());
        assert_eq!(clone.display_order(), original.display_order());
        assert_eq!(clone.properties(), original.properties());
        assert_eq!(clone.is_deleted(), original.is_deleted());
        assert_eq!(clone.provenance_id(), original.provenance_id());
    }

    #[test]
    fn apply_update_leaves_position_alone() {
        let mut record = sample_record();
        let provenance = record.provenance_id();
        record.apply_update(props(&[("A", "z")]), true, None);

        assert_eq!(record.grid_index(), GridIndex::new(4));
        assert_eq!(record.display_order(), DisplayOrder::new(7));
        assert_eq!(record.properties().get("A"), Some("z"));
        assert!(record.is_deleted());
        assert_eq!(record.provenance_id(), provenance);
    }

    #[test]
    fn apply_update_replaces_supplied_provenance() {
        let mut record = sample_record();
        let fresh = ProvenanceId::new();
        record.apply_update(props(&[("A", "z")]), false, Some(fresh));
        assert_eq!(record.provenance_id(), Some(fresh));
    }

    #[test]
    fn grid_index_next_detects_overflow() {
        assert_eq!(GridIndex::new(1).next(), Some(GridIndex::new(2)));
        assert_eq!(GridIndex::new(u32::MAX).next(), None);
    }

    #[test]
    fn sort_for_display_orders_by_display_then_grid() {
        let version = VersionId::new();
        let make = |grid, order| {
            FocusAreaRecord::new_slot(
                version,
                GridIndex::new(grid),
                DisplayOrder::new(order),
                RecordProperties::default(),
                false,
                None,
                Timestamp::now(),
            )
        };
        let mut records = vec![make(3, 2), make(1, 5), make(2, 2)];
        sort_for_display(&mut records);
        let grids: Vec<u32> = records.iter().map(|r| r.grid_index().as_u32()).collect();
        assert_eq!(grids, vec![2, 3, 1]);
    }
}
