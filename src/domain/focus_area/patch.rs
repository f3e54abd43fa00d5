//! Patch instructions applied while creating a new version.

use std::collections::HashSet;

use thiserror::Error;

use super::record::RecordProperties;
use crate::domain::foundation::{DomainError, ErrorCode, ProvenanceId, RecordId, ValidationError};

/// One client-submitted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordPatch {
    /// Overwrite the content of a record carried over from the current version.
    Update {
        record_id: RecordId,
        properties: RecordProperties,
        is_deleted: bool,
        provenance_id: Option<ProvenanceId>,
    },
    /// Add a genuinely new row.
    Insert {
        properties: RecordProperties,
        is_deleted: bool,
        provenance_id: Option<ProvenanceId>,
    },
}

impl RecordPatch {
    /// Update that keeps the row live.
    pub fn update(record_id: RecordId, properties: RecordProperties) -> Self {
        RecordPatch::Update {
            record_id,
            properties,
            is_deleted: false,
            provenance_id: None,
        }
    }

    /// Update that soft-deletes the row, keeping its last content.
    pub fn delete(record_id: RecordId, properties: RecordProperties) -> Self {
        RecordPatch::Update {
            record_id,
            properties,
            is_deleted: true,
            provenance_id: None,
        }
    }

    /// Insert of a live row.
    pub fn insert(properties: RecordProperties) -> Self {
        RecordPatch::Insert {
            properties,
            is_deleted: false,
            provenance_id: None,
        }
    }

    /// Builder: attach provenance to the patch.
    pub fn with_provenance(mut self, id: ProvenanceId) -> Self {
        match &mut self {
            RecordPatch::Update { provenance_id, .. } | RecordPatch::Insert { provenance_id, .. } => {
                *provenance_id = Some(id)
            }
        }
        self
    }

    pub fn properties(&self) -> &RecordProperties {
        match self {
            RecordPatch::Update { properties, .. } | RecordPatch::Insert { properties, .. } => {
                properties
            }
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, RecordPatch::Insert { .. })
    }
}

/// Shape errors detected before anything is read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Patch {position} has invalid properties: {source}")]
    InvalidProperties {
        position: usize,
        #[source]
        source: ValidationError,
    },

    #[error("Record {record_id} is updated more than once in the same revision")]
    DuplicateUpdate { record_id: RecordId },
}

impl From<PatchError> for DomainError {
    fn from(err: PatchError) -> Self {
        match &err {
            PatchError::InvalidProperties { position, .. } => {
                DomainError::new(ErrorCode::InvalidFormat, err.to_string())
                    .with_detail("position", position.to_string())
            }
            PatchError::DuplicateUpdate { record_id } => {
                DomainError::new(ErrorCode::ValidationFailed, err.to_string())
                    .with_detail("record_id", record_id.to_string())
            }
        }
    }
}

/// An ordered, shape-validated batch of patches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet(Vec<RecordPatch>);

impl PatchSet {
    /// Validates the batch: property keys must be well formed and no record
    /// may be targeted by two updates.
    pub fn new(patches: Vec<RecordPatch>) -> Result<Self, PatchError> {
        let mut targets = HashSet::new();
        for (position, patch) in patches.iter().enumerate() {
            patch
                .properties()
                .validate()
                .map_err(|source| PatchError::InvalidProperties { position, source })?;

            if let RecordPatch::Update { record_id, .. } = patch {
                if !targets.insert(*record_id) {
                    return Err(PatchError::DuplicateUpdate {
                        record_id: *record_id,
                    });
                }
            }
        }
        Ok(Self(patches))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordPatch> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert_count(&self) -> usize {
        self.0.iter().filter(|p| p.is_insert()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn props(value: &str) -> RecordProperties {
        RecordProperties::from_pairs([("A", value)]).unwrap()
    }

    #[test]
    fn mixed_batch_is_accepted_in_order() {
        let a = RecordId::new();
        let set = PatchSet::new(vec![
            RecordPatch::update(a, props("z")),
            RecordPatch::insert(props("w")),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.insert_count(), 1);
        assert!(!set.iter().next().unwrap().is_insert());
    }

    #[test]
    fn duplicate_update_is_rejected() {
        let a = RecordId::new();
        let err = PatchSet::new(vec![
            RecordPatch::update(a, props("1")),
            RecordPatch::delete(a, props("1")),
        ])
        .unwrap_err();
        assert_eq!(err, PatchError::DuplicateUpdate { record_id: a });
    }

    #[test]
    fn blank_key_reports_position() {
        // Bypass the validating constructor the way serde would.
        let mut raw = IndexMap::new();
        raw.insert(" ".to_string(), "x".to_string());
        let bad: RecordProperties = serde_json::from_value(serde_json::to_value(raw).unwrap()).unwrap();

        let err = PatchSet::new(vec![RecordPatch::insert(props("ok")), RecordPatch::insert(bad)])
            .unwrap_err();
        assert!(matches!(err, PatchError::InvalidProperties { position: 1, .. }));
    }

    #[test]
    fn with_provenance_sets_link() {
        let provenance = ProvenanceId::new();
        let patch = RecordPatch::insert(props("w")).with_provenance(provenance);
        match patch {
            RecordPatch::Insert { provenance_id, .. } => assert_eq!(provenance_id, Some(provenance)),
            RecordPatch::Update { .. } => panic!("expected insert"),
        }
    }

    #[test]
    fn empty_batch_is_valid() {
        assert!(PatchSet::new(vec![]).unwrap().is_empty());
    }
}
