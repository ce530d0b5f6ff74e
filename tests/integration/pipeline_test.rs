use crate::utils::{adamawa_registry, batch, counts, text, unit, upload};
use ward_fusion::algorithm::resolution::TieBreak;
use ward_fusion::schema::ColumnRole;
use ward_fusion::{
    Anomaly, BoundaryRegistry, FacilityFilter, FusionConfig, FusionPipeline, Technique,
};

fn pipeline() -> FusionPipeline {
    FusionPipeline::new(FusionConfig::default()).unwrap()
}

#[test]
fn test_decorated_dhis2_names_resolve_and_join() {
    let upload = upload(&[(
        "Adamawa State",
        "ad Yola North Local Government Area",
        "Jimeta Ward",
        "PHC Jimeta",
        100,
        10,
    )]);
    let output = pipeline().run(&upload, &adamawa_registry()).unwrap();

    assert_eq!(output.matches.len(), 1);
    let resolution = &output.matches[0];
    assert_eq!(resolution.unit_id.as_deref(), Some("AD001"));
    assert_eq!(resolution.technique, Technique::Normalized);
    assert!(resolution.confidence >= 95.0);

    assert_eq!(output.dataset.len(), 1);
    let row = &output.dataset.rows[0];
    assert_eq!(row.unit_id, "AD001");
    assert_eq!(row.geometry, "POLYGON ((AD001))");
    assert!((row.metric.rate.unwrap() - 10.0).abs() < 1e-9);
}

#[test]
fn test_every_record_is_accounted_for() {
    let upload = upload(&[
        ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10),
        ("Adamawa", "Yola North", "Jimeta", "Jimeta Clinic", 10, 5),
        ("Adamawa", "Yola North", "Doubeli", "PHC Doubeli", 40, 8),
        ("Adamawa", "Yola North", "Atlantis", "PHC Atlantis", 30, 3),
    ]);
    let output = pipeline().run(&upload, &adamawa_registry()).unwrap();
    let report = &output.report;

    assert_eq!(report.input_records, 4);
    assert_eq!(report.matched_records, 3);
    assert_eq!(report.unmatched_records, 1);
    assert!(report.is_complete());
    assert_eq!(report.distinct_keys, 3);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.ward_metrics, 2);
    assert_eq!(report.unresolved.len(), 1);

    let unresolved: Vec<_> = report
        .anomalies
        .iter()
        .filter_map(|anomaly| match anomaly {
            Anomaly::UnresolvedIdentity { ward, records, .. } => Some((ward.clone(), *records)),
            _ => None,
        })
        .collect();
    assert_eq!(unresolved, vec![(Some("Atlantis".to_string()), 1)]);

    let jimeta = output
        .dataset
        .rows
        .iter()
        .find(|row| row.unit_id == "AD001")
        .unwrap();
    assert!((jimeta.metric.rate.unwrap() - 1500.0 / 110.0).abs() < 1e-9);
}

#[test]
fn test_shared_ward_names_join_through_their_lga() {
    let registry = BoundaryRegistry::new(vec![
        unit("KN001", "Kano", Some("Dala"), "Central"),
        unit("KN002", "Kano", Some("Fagge"), "Central"),
    ]);
    let upload = upload(&[
        ("Kano", "Dala", "Central", "PHC Dala", 10, 2),
        ("Kano", "Fagge", "Central", "PHC Fagge", 20, 4),
    ]);
    let output = pipeline().run(&upload, &registry).unwrap();

    assert_eq!(output.dataset.len(), 2);
    for row in &output.dataset.rows {
        assert_eq!(row.geometry, format!("POLYGON (({}))", row.metric.unit_id));
        assert!(!row.ambiguous);
    }
    assert!(
        !output
            .report
            .anomalies
            .iter()
            .any(|anomaly| matches!(anomaly, Anomaly::AmbiguousJoin { .. }))
    );
}

#[test]
fn test_facility_filter_from_config() {
    let config = FusionConfig::default().with_facility_filter(FacilityFilter::Primary);
    let pipeline = FusionPipeline::new(config).unwrap();
    let upload = upload(&[
        ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10),
        ("Adamawa", "Yola North", "Jimeta", "General Hospital Jimeta", 300, 90),
    ]);
    let output = pipeline.run(&upload, &adamawa_registry()).unwrap();

    assert_eq!(output.report.excluded_by_filter, 1);
    assert!(output.report.is_complete());
    let row = &output.dataset.rows[0];
    assert!((row.metric.tested - 100.0).abs() < f64::EPSILON);
    assert!(output.report.summary().contains("Excluded by Filter: 1"));
}

#[test]
fn test_duplicate_registry_units_are_reported() {
    let mut units = adamawa_registry().units().to_vec();
    units.push(unit("AD101", "Adamawa", Some("Fufore"), "Gurin"));
    let registry = BoundaryRegistry::new(units);
    let upload = upload(&[("Adamawa", "Fufore", "Gurin", "PHC Gurin", 10, 1)]);
    let output = pipeline().run(&upload, &registry).unwrap();

    assert_eq!(output.report.registry_units, 7);
    assert_eq!(output.report.working_units, 6);
    assert_eq!(output.dataset.rows[0].unit_id, "AD006");
    assert!(output.report.anomalies.iter().any(|anomaly| matches!(
        anomaly,
        Anomaly::DuplicateRegistryFeature { kept, dropped, .. }
            if kept == "AD006" && dropped == &vec!["AD101".to_string()]
    )));
}

#[test]
fn test_unusable_table_is_a_structural_error() {
    let table = batch(vec![
        ("LGA", text(&["Yola North"])),
        ("Ward", text(&["Jimeta"])),
        ("population", counts(&[1200])),
    ]);
    let err = pipeline().run(&table, &adamawa_registry()).unwrap_err();
    assert!(err.is_structural());
}

#[test]
fn test_batches_and_parallel_uploads() {
    let pipeline = pipeline();
    let registry = adamawa_registry();
    assert!(pipeline.run_batches(&[], &registry).is_err());

    let first = upload(&[("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 10, 1)]);
    let second = upload(&[("Adamawa", "Fufore", "Gurin", "PHC Gurin", 20, 4)]);

    let combined = pipeline
        .run_batches(&[first.clone(), second.clone()], &registry)
        .unwrap();
    assert_eq!(combined.report.input_records, 2);
    assert_eq!(combined.dataset.len(), 2);

    let outputs = pipeline.run_many(&[first, second], &registry);
    assert_eq!(outputs.len(), 2);
    let units: Vec<String> = outputs
        .into_iter()
        .map(|output| output.unwrap().dataset.rows[0].unit_id.clone())
        .collect();
    assert_eq!(units, vec!["AD001".to_string(), "AD006".to_string()]);
}

#[test]
fn test_tied_lga_is_reported_as_an_anomaly() {
    let upload = upload(&[("Adamawa", "Yola", "Jimeta", "PHC Jimeta", 50, 5)]);
    let output = pipeline().run(&upload, &adamawa_registry()).unwrap();
    let report = &output.report;

    assert_eq!(report.low_confidence_keys, 1);
    let ties: Vec<_> = report
        .anomalies
        .iter()
        .filter_map(|anomaly| match anomaly {
            Anomaly::TiedResolution {
                level,
                candidates,
                chosen,
                rule,
                ..
            } => Some((*level, candidates.clone(), chosen.clone(), *rule)),
            _ => None,
        })
        .collect();
    assert_eq!(
        ties,
        vec![(
            ColumnRole::Lga,
            vec!["Yola North".to_string(), "Yola South".to_string()],
            "Yola North".to_string(),
            TieBreak::LowestId,
        )]
    );
    assert!(output.dataset.rows[0].metric.low_confidence);
}
