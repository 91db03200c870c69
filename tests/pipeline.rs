//! End-to-end pipeline tests over synthetic scans

use ndarray::Array2;

use neuroscan_core::{
    fuse, Analyzer, OracleVerdict, ReferenceLabel, ReferenceMetadata, ScanImage, SourceVerdict,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Disc-shaped "brain" on a black background with an optional darker
/// central "ventricle" disc.
fn synthetic_scan(size: usize, brain_radius: f64, ventricle_radius: f64) -> ScanImage {
    let mut pixels = Array2::<u8>::zeros((size, size));
    let c = size as f64 / 2.0;
    for y in 0..size {
        for x in 0..size {
            let d = ((y as f64 - c).powi(2) + (x as f64 - c).powi(2)).sqrt();
            if d <= ventricle_radius {
                pixels[[y, x]] = 20;
            } else if d <= brain_radius {
                pixels[[y, x]] = 150;
            }
        }
    }
    ScanImage::new(pixels).unwrap()
}

fn healthy_scan() -> ScanImage {
    synthetic_scan(256, 100.0, 0.0)
}

fn atrophic_scan() -> ScanImage {
    synthetic_scan(256, 100.0, 38.0)
}

#[test]
fn blank_scan_analyzes_as_negative() {
    init_logging();
    let analyzer = Analyzer::new();
    let scan = ScanImage::new(Array2::<u8>::zeros((128, 128))).unwrap();
    let result = analyzer.analyze(&scan, Some(40), None).unwrap();
    assert!(!result.detection);
    assert!(result.confidence > 0.0);
    assert!(result.disorder_type.is_none());
    assert!(result.progression_pct.is_none());
}

#[test]
fn enlarged_ventricles_flag_an_elderly_scan() {
    init_logging();
    let analyzer = Analyzer::new();
    let result = analyzer.analyze_with_rules(&atrophic_scan(), Some(70));
    assert!(result.detection, "expected detection, got {:?}", result);
    assert!(result.confidence >= 40.0);
    assert!(result.disorder_type.is_some());
    assert!(result.progression_pct.is_some());
    assert!(result
        .observations
        .iter()
        .any(|o| o.contains("ventricular enlargement")));
    assert!(!result.recommendations.is_empty());
}

#[test]
fn elderly_leniency_lowers_confidence_versus_adult() {
    init_logging();
    let analyzer = Analyzer::new();
    let scan = atrophic_scan();
    let adult = analyzer.analyze_with_rules(&scan, Some(40));
    let elderly = analyzer.analyze_with_rules(&scan, Some(70));
    assert!(adult.detection);
    assert!(elderly.confidence < adult.confidence);
}

#[test]
fn reference_matching_follows_the_labeled_cohort() {
    init_logging();
    let analyzer = Analyzer::new();
    for _ in 0..3 {
        analyzer
            .add_reference(
                &healthy_scan(),
                ReferenceLabel::Normal,
                ReferenceMetadata::default(),
            )
            .unwrap();
    }
    analyzer
        .add_reference(
            &atrophic_scan(),
            ReferenceLabel::Abnormal,
            ReferenceMetadata {
                disorder_type: Some("Alzheimer's disease".to_string()),
                progression_pct: Some(60.0),
                timestamp: None,
            },
        )
        .unwrap();

    let abnormal_match = analyzer.analyze_with_references(&atrophic_scan());
    assert!(abnormal_match.detection);
    assert_eq!(
        abnormal_match.disorder_type.as_deref(),
        Some("Alzheimer's disease")
    );

    let normal_match = analyzer.analyze_with_references(&healthy_scan());
    assert!(!normal_match.detection);
}

#[test]
fn matcher_with_only_normal_references_never_detects() {
    init_logging();
    let analyzer = Analyzer::new();
    analyzer
        .add_reference(
            &healthy_scan(),
            ReferenceLabel::Normal,
            ReferenceMetadata::default(),
        )
        .unwrap();
    let result = analyzer.analyze_with_references(&atrophic_scan());
    assert!(!result.detection);
}

#[test]
fn ensemble_uses_references_once_available() {
    init_logging();
    let analyzer = Analyzer::new();
    analyzer
        .add_reference(
            &atrophic_scan(),
            ReferenceLabel::Abnormal,
            ReferenceMetadata {
                disorder_type: Some("Alzheimer's disease".to_string()),
                progression_pct: Some(60.0),
                timestamp: None,
            },
        )
        .unwrap();
    analyzer
        .add_reference(
            &healthy_scan(),
            ReferenceLabel::Normal,
            ReferenceMetadata::default(),
        )
        .unwrap();

    let result = analyzer.analyze(&atrophic_scan(), Some(70), None).unwrap();
    assert!(result.detection);
    assert!(result.confidence >= 30.0);
    let note = result
        .observations
        .iter()
        .find(|o| o.contains("Consensus of 2"))
        .expect("missing provenance note");
    assert!(note.contains("rules") && note.contains("reference"));
}

#[test]
fn agreeing_oracle_raises_the_ensemble_to_full_confidence() {
    init_logging();
    let analyzer = Analyzer::new();
    let oracle = OracleVerdict {
        detection: true,
        confidence: 90.0,
        disorder_type: Some("Alzheimer's disease".to_string()),
        progression_pct: Some(55.0),
        observations: vec![],
    };
    let result = analyzer
        .analyze(&atrophic_scan(), Some(70), Some(oracle))
        .unwrap();
    assert!(result.detection);
    assert_eq!(result.confidence, 100.0);
}

#[test]
fn dissenting_oracle_pulls_confidence_toward_the_floor() {
    init_logging();
    let analyzer = Analyzer::new();
    let oracle = OracleVerdict {
        detection: false,
        confidence: 60.0,
        disorder_type: None,
        progression_pct: None,
        observations: vec![],
    };
    let agreed = analyzer.analyze(&atrophic_scan(), Some(70), None).unwrap();
    let contested = analyzer
        .analyze(&atrophic_scan(), Some(70), Some(oracle))
        .unwrap();
    assert!(contested.confidence < agreed.confidence);
    assert!(contested.confidence >= 30.0);
}

#[test]
fn fusion_weights_renormalize_over_present_sources() {
    init_logging();
    // One lone source should dominate completely regardless of its
    // absolute reliability
    let lone = SourceVerdict::new(
        "oracle",
        0.25,
        OracleVerdict {
            detection: true,
            confidence: 70.0,
            disorder_type: None,
            progression_pct: None,
            observations: vec![],
        }
        .into(),
    );
    let result = fuse(&[lone]);
    assert!(result.detection);
    assert_eq!(result.confidence, 100.0);
}

#[test]
fn calibration_tightens_thresholds_and_keeps_them_ordered() {
    init_logging();
    let analyzer = Analyzer::new();
    let normal: Vec<ScanImage> = (0..4)
        .map(|i| synthetic_scan(256, 100.0, 8.0 + i as f64))
        .collect();
    let abnormal: Vec<ScanImage> = (0..4)
        .map(|i| synthetic_scan(256, 100.0, 40.0 + 4.0 * i as f64))
        .collect();

    let report = analyzer.calibrate(&normal, &abnormal).unwrap();
    assert_eq!(report.normal_count, 4);
    assert_eq!(report.abnormal_count, 4);
    assert!(analyzer.rules().profile().is_ordered());

    // A scan from the abnormal cohort still classifies as abnormal under
    // the calibrated thresholds
    let result = analyzer.analyze_with_rules(&synthetic_scan(256, 100.0, 48.0), Some(40));
    assert!(result.detection);
}

#[test]
fn calibration_is_deterministic_across_engines() {
    init_logging();
    let a = Analyzer::new();
    let b = Analyzer::new();
    let normal = vec![healthy_scan(), synthetic_scan(256, 100.0, 5.0)];
    let abnormal = vec![atrophic_scan(), synthetic_scan(256, 100.0, 50.0)];
    a.calibrate(&normal, &abnormal).unwrap();
    b.calibrate(&normal, &abnormal).unwrap();
    assert_eq!(*a.rules().profile(), *b.rules().profile());
}

#[test]
fn analysis_is_deterministic() {
    init_logging();
    let analyzer = Analyzer::new();
    let scan = atrophic_scan();
    let first = analyzer.analyze(&scan, Some(70), None).unwrap();
    let second = analyzer.analyze(&scan, Some(70), None).unwrap();
    assert_eq!(first.detection, second.detection);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.observations, second.observations);
}
