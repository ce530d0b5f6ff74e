use std::collections::BTreeMap;

use crate::utils::{adamawa_registry, unit};
use ward_fusion::algorithm::fusion::{JoinKind, deduplicate};
use ward_fusion::{Anomaly, BoundaryRegistry, GeometryFuser, Stratum, WardMetric};

fn metric(unit_id: &str, lga: &str, ward: &str) -> WardMetric {
    WardMetric {
        unit_id: unit_id.to_string(),
        state: "Adamawa".to_string(),
        lga: Some(lga.to_string()),
        ward: ward.to_string(),
        period: Some("2024-01".to_string()),
        stratum: Stratum::Under5,
        tested: 50.0,
        positive: 5.0,
        rate: Some(10.0),
        facility_count: 2,
        record_count: 2,
        method_mix: BTreeMap::new(),
        low_confidence: false,
    }
}

#[test]
fn test_same_ward_name_in_two_lgas_joins_its_own_geometry() {
    let registry = adamawa_registry();
    let fuser = GeometryFuser::new(&registry);
    let dataset = fuser.fuse(&[
        metric("AD001", "Yola North", "Jimeta"),
        metric("AD005", "Yola South", "Jimeta"),
    ]);

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.rows[0].unit_id, "AD001");
    assert_eq!(dataset.rows[0].geometry, "POLYGON ((AD001))");
    assert_eq!(dataset.rows[1].unit_id, "AD005");
    assert_eq!(dataset.rows[1].geometry, "POLYGON ((AD005))");
    assert!(dataset.rows.iter().all(|row| row.join == JoinKind::Full && !row.ambiguous));
    assert!(dataset.anomalies.is_empty());
}

#[test]
fn test_duplicate_registry_units_collapse_to_smallest_id() {
    let mut units = adamawa_registry().units().to_vec();
    units.insert(0, unit("AD009", "Adamawa", Some("Yola North LGA"), "JIMETA"));
    let registry = BoundaryRegistry::new(units);

    let (working, collapses) = deduplicate(registry.units());
    assert_eq!(working.len(), 6);
    assert_eq!(working[0].unit_id, "AD001");
    assert_eq!(collapses.len(), 1);
    assert_eq!(collapses[0].kept, "AD001");
    assert_eq!(collapses[0].dropped, vec!["AD009".to_string()]);
    assert!(collapses[0].geometry_differs);

    let fuser = GeometryFuser::new(&registry);
    assert_eq!(fuser.units().len(), 6);
    assert!(matches!(
        &fuser.collapse_anomalies()[..],
        [Anomaly::DuplicateRegistryFeature { kept, .. }] if kept == "AD001"
    ));

    let dataset = fuser.fuse(&[metric("AD001", "Yola North", "Jimeta")]);
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.rows[0].geometry, "POLYGON ((AD001))");
}

#[test]
fn test_metric_without_registry_unit_is_unjoined() {
    let fuser = GeometryFuser::new(&adamawa_registry());
    let dataset = fuser.fuse(&[
        metric("AD001", "Yola North", "Jimeta"),
        metric("XX001", "Yola North", "Atlantis"),
    ]);

    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.unjoined.len(), 1);
    assert!(dataset.unjoined[0].reason.contains("Atlantis"));
}

#[test]
fn test_fused_rows_serialize_with_join_kind() {
    let fuser = GeometryFuser::new(&adamawa_registry());
    let dataset = fuser.fuse(&[metric("AD006", "Fufore", "Gurin")]);

    let json = serde_json::to_value(&dataset).unwrap();
    assert_eq!(json["rows"][0]["join"], "full");
    assert_eq!(json["rows"][0]["metric"]["ward"], "Gurin");
    assert_eq!(json["rows"][0]["metric"]["rate"], 10.0);
}
