//! Reference store - labeled feature vectors from prior scans
//!
//! Append-only, in-memory. Entries are labeled normal or abnormal and carry
//! optional clinical metadata used when an abnormal match wins.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::features::FeatureVector;
use crate::Result;

// ============================================================================
// ENTRIES
// ============================================================================

/// Ground-truth label of a reference scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceLabel {
    Normal,
    Abnormal,
}

impl ReferenceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceLabel::Normal => "normal",
            ReferenceLabel::Abnormal => "abnormal",
        }
    }
}

impl std::fmt::Display for ReferenceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Clinical context attached to a reference scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceMetadata {
    pub disorder_type: Option<String>,
    pub progression_pct: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// One labeled reference scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: Uuid,
    pub features: FeatureVector,
    pub label: ReferenceLabel,
    pub metadata: ReferenceMetadata,
}

impl ReferenceEntry {
    pub fn new(features: FeatureVector, label: ReferenceLabel, metadata: ReferenceMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            features,
            label,
            metadata,
        }
    }
}

// ============================================================================
// STORE
// ============================================================================

/// Thread-safe, append-only collection of reference entries.
pub struct ReferenceStore {
    entries: RwLock<Vec<ReferenceEntry>>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append an entry. Vectors from an incompatible feature layout are
    /// rejected rather than silently compared against current ones.
    pub fn add(&self, entry: ReferenceEntry) -> Result<Uuid> {
        if !entry.features.is_layout_compatible() {
            return Err(AnalysisError::Input(format!(
                "reference {} uses an incompatible feature layout",
                entry.id
            )));
        }
        let id = entry.id;
        self.entries.write().push(entry);
        log::debug!("reference {} stored ({})", id, self.count_summary());
        Ok(id)
    }

    /// (normal, abnormal) entry counts.
    pub fn counts(&self) -> (usize, usize) {
        let entries = self.entries.read();
        let normal = entries
            .iter()
            .filter(|e| e.label == ReferenceLabel::Normal)
            .count();
        (normal, entries.len() - normal)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Point-in-time copy of all entries.
    pub fn snapshot(&self) -> Vec<ReferenceEntry> {
        self.entries.read().clone()
    }

    fn count_summary(&self) -> String {
        let (normal, abnormal) = self.counts();
        format!("{} normal / {} abnormal", normal, abnormal)
    }
}

impl Default for ReferenceStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_counts_by_label() {
        let store = ReferenceStore::new();
        assert!(store.is_empty());
        store
            .add(ReferenceEntry::new(
                FeatureVector::zeroed(),
                ReferenceLabel::Normal,
                ReferenceMetadata::default(),
            ))
            .unwrap();
        store
            .add(ReferenceEntry::new(
                FeatureVector::zeroed(),
                ReferenceLabel::Abnormal,
                ReferenceMetadata::default(),
            ))
            .unwrap();
        store
            .add(ReferenceEntry::new(
                FeatureVector::zeroed(),
                ReferenceLabel::Abnormal,
                ReferenceMetadata::default(),
            ))
            .unwrap();
        assert_eq!(store.counts(), (1, 2));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_incompatible_layout_is_rejected() {
        let store = ReferenceStore::new();
        let mut features = FeatureVector::zeroed();
        features.layout_hash = features.layout_hash.wrapping_add(1);
        let err = store
            .add(ReferenceEntry::new(
                features,
                ReferenceLabel::Normal,
                ReferenceMetadata::default(),
            ))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = ReferenceStore::new();
        store
            .add(ReferenceEntry::new(
                FeatureVector::zeroed(),
                ReferenceLabel::Normal,
                ReferenceMetadata::default(),
            ))
            .unwrap();
        let snapshot = store.snapshot();
        store
            .add(ReferenceEntry::new(
                FeatureVector::zeroed(),
                ReferenceLabel::Normal,
                ReferenceMetadata::default(),
            ))
            .unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }
}
