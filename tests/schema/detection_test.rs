use crate::utils::{POSITIVE_U5, TESTED_U5, batch, counts, text, upload};
use ward_fusion::models::{Measure, Stratum, TestMethod};
use ward_fusion::schema::ColumnRole;
use ward_fusion::{FusionError, detect_schema};

#[test]
fn test_hinted_upload_roles() {
    let upload = upload(&[
        ("Adamawa", "Yola North", "Jimeta", "PHC Jimeta", 100, 10),
        ("Adamawa", "Yola North", "Doubeli", "PHC Doubeli", 50, 5),
    ]);
    let roles = detect_schema(&upload).unwrap();

    assert_eq!(roles.state.as_ref().unwrap().name, "State");
    assert_eq!(roles.lga.as_ref().unwrap().name, "LGA");
    assert_eq!(roles.ward.as_ref().unwrap().name, "Ward");
    assert_eq!(roles.facility.as_ref().unwrap().name, "Health Facility");
    assert!(roles.locations().iter().all(|(_, column)| column.hinted));

    let metrics: Vec<_> = roles.metrics.iter().map(|m| (m.name.as_str(), m.spec)).collect();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0].0, TESTED_U5);
    assert_eq!(metrics[0].1.measure, Measure::Tested);
    assert_eq!(metrics[1].0, POSITIVE_U5);
    assert_eq!(metrics[1].1.measure, Measure::Positive);
    assert!(metrics.iter().all(|(_, spec)| {
        spec.method == TestMethod::Rdt && spec.stratum == Stratum::Under5
    }));
    assert!(roles.period.is_none());
}

#[test]
fn test_orgunit_export_is_ordered_by_cardinality() {
    let export = batch(vec![
        ("periodname", text(&["January 2024", "January 2024", "January 2024", "January 2024"])),
        ("orgunitlevel4", text(&["ad Jimeta Ward", "ad Doubeli Ward", "ad Gurin Ward", "ad Gurin Ward"])),
        ("orgunitlevel2", text(&["ad Adamawa State", "ad Adamawa State", "ad Adamawa State", "ad Adamawa State"])),
        ("orgunitlevel5", text(&["ad PHC Jimeta", "ad PHC Doubeli", "ad PHC Gurin", "ad Gurin Clinic"])),
        ("orgunitlevel3", text(&["ad Yola North LGA", "ad Yola North LGA", "ad Fufore LGA", "ad Fufore LGA"])),
        ("Facility Type", text(&["Primary Health Centre", "Primary Health Centre", "Primary Health Centre", "Clinic"])),
        ("u5_rdt_tested", counts(&[10, 20, 30, 40])),
        ("u5_rdt_pos", counts(&[1, 2, 3, 4])),
        ("Malaria confirmed by microscopy - Pregnant women", counts(&[0, 1, 0, 1])),
    ]);
    let roles = detect_schema(&export).unwrap();

    assert_eq!(roles.period.as_ref().unwrap().name, "periodname");
    assert_eq!(roles.category.as_ref().unwrap().name, "Facility Type");
    assert_eq!(roles.state.as_ref().unwrap().name, "orgunitlevel2");
    assert_eq!(roles.lga.as_ref().unwrap().name, "orgunitlevel3");
    assert_eq!(roles.ward.as_ref().unwrap().name, "orgunitlevel4");
    assert_eq!(roles.facility.as_ref().unwrap().name, "orgunitlevel5");
    assert!(roles.hierarchy_warnings.is_empty());

    assert_eq!(roles.metrics.len(), 3);
    let pregnant = &roles.metrics[2].spec;
    assert_eq!(pregnant.measure, Measure::Positive);
    assert_eq!(pregnant.method, TestMethod::Microscopy);
    assert_eq!(pregnant.stratum, Stratum::Pregnant);
}

#[test]
fn test_identifier_columns_are_never_locations() {
    let export = batch(vec![
        ("ward_id", text(&["w1", "w2", "w3"])),
        ("lga", text(&["Yola North", "Yola North", "Fufore"])),
        ("ward", text(&["Jimeta", "Doubeli", "Gurin"])),
        (TESTED_U5, counts(&[1, 2, 3])),
    ]);
    let roles = detect_schema(&export).unwrap();
    assert_eq!(roles.unused, vec!["ward_id".to_string()]);
    assert_eq!(roles.location_count(), 2);
}

#[test]
fn test_table_without_metrics_is_rejected() {
    let export = batch(vec![
        ("lga", text(&["Yola North", "Fufore"])),
        ("ward", text(&["Jimeta", "Gurin"])),
        ("population", counts(&[1000, 2000])),
    ]);
    match detect_schema(&export) {
        Err(FusionError::StructuralValidation { role, .. }) => assert_eq!(role, ColumnRole::Metric),
        other => panic!("expected a structural error, got {other:?}"),
    }
}
