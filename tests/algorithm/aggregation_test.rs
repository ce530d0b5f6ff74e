use crate::utils::{
    POSITIVE_U5, Row, TESTED_U5, adamawa_registry, batch, counts, text, upload,
};
use ward_fusion::algorithm::aggregation::AggregationOutput;
use ward_fusion::{
    AggregationPolicy, Anomaly, DataQualityKind, FacilityFilter, FusionConfig, IdentityResolver,
    MatchResult, MetricAggregator, RecordBatch, ResolutionKey, Stratum, detect_schema,
    extract_records,
};

fn aggregate_upload(rows: &[Row], policy: AggregationPolicy) -> AggregationOutput {
    aggregate_table(&upload(rows), policy)
}

fn aggregate_table(upload: &RecordBatch, policy: AggregationPolicy) -> AggregationOutput {
    let roles = detect_schema(upload).unwrap();
    let records = extract_records(upload, &roles).unwrap().records;

    let registry = adamawa_registry();
    let mut resolver = IdentityResolver::new(registry.units(), &FusionConfig::default());
    let positions: Vec<usize> = records
        .iter()
        .map(|record| resolver.resolve_position(&ResolutionKey::from_record(record)))
        .collect();
    let matches = resolver.into_cache().into_results();
    let per_record: Vec<&MatchResult> = positions.iter().map(|&p| &matches[p]).collect();

    MetricAggregator::new(policy).aggregate(&records, &per_record)
}

fn all_under5() -> AggregationPolicy {
    AggregationPolicy::new(FacilityFilter::All, Stratum::Under5)
}

fn quality_kinds(output: &AggregationOutput) -> Vec<DataQualityKind> {
    output
        .anomalies
        .iter()
        .filter_map(|anomaly| match anomaly {
            Anomaly::DataQualityWarning { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect()
}

#[test]
fn test_rates_are_pooled_not_averaged() {
    let output = aggregate_upload(
        &[
            ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10),
            ("Adamawa", "Yola North", "Jimeta Ward", "Jimeta Clinic", 10, 5),
        ],
        all_under5(),
    );

    assert_eq!(output.metrics.len(), 1);
    let metric = &output.metrics[0];
    assert_eq!(metric.unit_id, "AD001");
    assert_eq!(metric.ward, "Jimeta");
    assert!((metric.tested - 110.0).abs() < f64::EPSILON);
    assert!((metric.positive - 15.0).abs() < f64::EPSILON);

    let rate = metric.rate.unwrap();
    assert!((rate - 1500.0 / 110.0).abs() < 1e-9);
    assert!((rate - 30.0).abs() > 1.0);
    assert_eq!(metric.facility_count, 2);
    assert_eq!(metric.record_count, 2);
}

#[test]
fn test_primary_filter_excludes_hospitals() {
    let output = aggregate_upload(
        &[
            ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10),
            ("Adamawa", "Yola North", "Jimeta", "General Hospital Yola", 200, 50),
            ("Adamawa", "Yola North", "Doubeli", "Doubeli Dispensary", 20, 2),
        ],
        AggregationPolicy::new(FacilityFilter::Primary, Stratum::Under5),
    );

    assert_eq!(output.excluded_by_filter, 1);
    assert_eq!(output.aggregated_records, 2);
    let jimeta = output.metrics.iter().find(|m| m.unit_id == "AD001").unwrap();
    assert!((jimeta.tested - 100.0).abs() < f64::EPSILON);
    assert_eq!(jimeta.facility_count, 1);
}

#[test]
fn test_missing_stratum_is_skipped() {
    let output = aggregate_upload(
        &[("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10)],
        AggregationPolicy::new(FacilityFilter::All, Stratum::Over5),
    );
    assert_eq!(output.skipped_no_data, 1);
    assert!(output.metrics.is_empty());
}

#[test]
fn test_impossible_rates_are_flagged_not_clamped() {
    let output = aggregate_upload(
        &[
            ("Adamawa", "Fufore", "Gurin", "PHC Gurin", 5, 8),
            ("Adamawa", "Yola North", "Doubeli", "PHC Doubeli", 0, 3),
        ],
        all_under5(),
    );

    let gurin = output.metrics.iter().find(|m| m.unit_id == "AD006").unwrap();
    assert!((gurin.rate.unwrap() - 160.0).abs() < 1e-9);

    let doubeli = output.metrics.iter().find(|m| m.unit_id == "AD002").unwrap();
    assert!(doubeli.rate.is_none());

    let kinds = quality_kinds(&output);
    assert!(kinds.contains(&DataQualityKind::RateAbove100));
    assert!(kinds.contains(&DataQualityKind::ZeroDenominator));
    assert!(kinds.contains(&DataQualityKind::PositiveWithoutTests));
}

#[test]
fn test_unresolved_records_are_pooled_by_raw_names() {
    let output = aggregate_upload(
        &[
            ("Adamawa", "Yola North", "Atlantis", "PHC Atlantis", 40, 4),
            ("Adamawa", "Yola North", "Atlantis", "Atlantis Clinic", 60, 6),
            ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 10, 1),
        ],
        all_under5(),
    );

    assert_eq!(output.metrics.len(), 1);
    assert_eq!(output.unresolved.len(), 1);
    let group = &output.unresolved[0];
    assert_eq!(group.ward.as_deref(), Some("Atlantis"));
    assert_eq!(group.record_count, 2);
    assert!((group.rate.unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn test_positives_under_an_untested_method_are_reported() {
    let table = batch(vec![
        ("State", text(&["Adamawa"])),
        ("LGA", text(&["Yola North"])),
        ("Ward", text(&["Jimeta"])),
        ("Health Facility", text(&["PHC Jimeta"])),
        (TESTED_U5, counts(&[10])),
        (POSITIVE_U5, counts(&[2])),
        ("Persons positive Microscopy <5yrs", counts(&[7])),
    ]);
    let output = aggregate_table(&table, all_under5());

    let metric = &output.metrics[0];
    assert!((metric.tested - 10.0).abs() < f64::EPSILON);
    assert!((metric.positive - 2.0).abs() < f64::EPSILON);

    let warnings: Vec<_> = output
        .anomalies
        .iter()
        .filter_map(|anomaly| match anomaly {
            Anomaly::DataQualityWarning { kind, row, raw, .. } => Some((*kind, *row, raw.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(warnings.len(), 1);
    let (kind, row, raw) = &warnings[0];
    assert_eq!(*kind, DataQualityKind::PositiveWithoutTests);
    assert_eq!(*row, Some(0));
    assert!(raw.starts_with("7 positive"));
}

#[test]
fn test_unresolved_zero_denominator_is_reported() {
    let output = aggregate_upload(
        &[("Adamawa", "Yola North", "Atlantis", "PHC Atlantis", 0, 0)],
        all_under5(),
    );

    assert_eq!(output.unresolved.len(), 1);
    assert!(output.unresolved[0].rate.is_none());
    assert!(output.anomalies.iter().any(|anomaly| matches!(
        anomaly,
        Anomaly::DataQualityWarning {
            kind: DataQualityKind::ZeroDenominator,
            unit_id: None,
            raw,
            ..
        } if raw.contains("Atlantis")
    )));
}
