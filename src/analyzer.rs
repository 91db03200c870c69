//! Analyzer - classifier seam and top-level facade
//!
//! `Classifier` is the seam every verdict source sits behind: the rule
//! engine, the reference matcher, and the adapter for a caller-supplied
//! external model. `Analyzer` owns the built-in classifiers, runs feature
//! extraction once per scan, and fuses whatever verdicts come back.

use std::sync::Arc;

use uuid::Uuid;

use crate::features::{extract, FeatureVector};
use crate::fusion::{
    fuse_strict, OracleVerdict, SourceVerdict, Verdict, ORACLE_RELIABILITY,
    REFERENCE_RELIABILITY, RULES_RELIABILITY,
};
use crate::reference::{
    ReferenceEntry, ReferenceLabel, ReferenceMatcher, ReferenceMetadata, ReferenceStore,
};
use crate::result::AnalysisResult;
use crate::rules::{CalibrationReport, RuleEngine};
use crate::scan::{AgeGroup, ScanImage};
use crate::Result;

// ============================================================================
// CLASSIFIER SEAM
// ============================================================================

/// A verdict source. Returning `None` means the source has no opinion on
/// this scan and is left out of fusion entirely.
pub trait Classifier {
    fn name(&self) -> &'static str;

    /// Relative trust in this source, renormalized across present sources
    /// at fusion time.
    fn reliability(&self) -> f64;

    fn evaluate(&self, features: &FeatureVector, age_group: AgeGroup) -> Option<Verdict>;
}

impl Classifier for RuleEngine {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn reliability(&self) -> f64 {
        RULES_RELIABILITY
    }

    fn evaluate(&self, features: &FeatureVector, age_group: AgeGroup) -> Option<Verdict> {
        Some(self.classify(features, age_group).into())
    }
}

impl Classifier for ReferenceMatcher {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn reliability(&self) -> f64 {
        REFERENCE_RELIABILITY
    }

    fn evaluate(&self, features: &FeatureVector, _age_group: AgeGroup) -> Option<Verdict> {
        if self.store().is_empty() {
            return None;
        }
        Some(self.match_features(features).into())
    }
}

/// Adapter that feeds one caller-supplied external verdict into fusion.
pub struct OracleAdapter {
    verdict: OracleVerdict,
}

impl OracleAdapter {
    pub fn new(verdict: OracleVerdict) -> Self {
        Self { verdict }
    }
}

impl Classifier for OracleAdapter {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn reliability(&self) -> f64 {
        ORACLE_RELIABILITY
    }

    fn evaluate(&self, _features: &FeatureVector, _age_group: AgeGroup) -> Option<Verdict> {
        Some(self.verdict.clone().into())
    }
}

// ============================================================================
// ANALYZER
// ============================================================================

/// Top-level facade: one feature extraction per scan, every classifier
/// consulted, verdicts fused.
pub struct Analyzer {
    rules: RuleEngine,
    store: Arc<ReferenceStore>,
    matcher: ReferenceMatcher,
}

impl Analyzer {
    pub fn new() -> Self {
        let store = Arc::new(ReferenceStore::new());
        Self {
            rules: RuleEngine::new(),
            matcher: ReferenceMatcher::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn references(&self) -> &ReferenceStore {
        &self.store
    }

    /// Full ensemble analysis of one scan. The oracle verdict is optional;
    /// the reference matcher abstains while its store is empty.
    pub fn analyze(
        &self,
        scan: &ScanImage,
        age: Option<u32>,
        oracle: Option<OracleVerdict>,
    ) -> Result<AnalysisResult> {
        let age_group = AgeGroup::from_age(age);
        let features = extract(scan);

        let oracle_adapter = oracle.map(OracleAdapter::new);
        let mut classifiers: Vec<&dyn Classifier> = vec![&self.rules, &self.matcher];
        if let Some(adapter) = oracle_adapter.as_ref() {
            classifiers.push(adapter);
        }

        let sources: Vec<SourceVerdict> = classifiers
            .iter()
            .filter_map(|c| {
                c.evaluate(&features, age_group)
                    .map(|v| SourceVerdict::new(c.name(), c.reliability(), v))
            })
            .collect();

        log::debug!(
            "analyzing scan {:?} as {} with {} classifier(s)",
            scan.dim(),
            age_group,
            sources.len()
        );
        fuse_strict(&sources)
    }

    /// Rule-engine-only analysis.
    pub fn analyze_with_rules(&self, scan: &ScanImage, age: Option<u32>) -> AnalysisResult {
        let features = extract(scan);
        self.rules.classify(&features, AgeGroup::from_age(age))
    }

    /// Reference-matcher-only analysis.
    pub fn analyze_with_references(&self, scan: &ScanImage) -> AnalysisResult {
        let features = extract(scan);
        self.matcher.match_features(&features)
    }

    /// Extract and store a labeled reference scan.
    pub fn add_reference(
        &self,
        scan: &ScanImage,
        label: ReferenceLabel,
        metadata: ReferenceMetadata,
    ) -> Result<Uuid> {
        let features = extract(scan);
        self.store.add(ReferenceEntry::new(features, label, metadata))
    }

    /// Recalibrate the rule engine's thresholds from labeled scan cohorts.
    pub fn calibrate(
        &self,
        normal: &[ScanImage],
        abnormal: &[ScanImage],
    ) -> Result<CalibrationReport> {
        let normal_features: Vec<FeatureVector> = normal.iter().map(extract).collect();
        let abnormal_features: Vec<FeatureVector> = abnormal.iter().map(extract).collect();
        self.rules.calibrate(&normal_features, &abnormal_features)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
