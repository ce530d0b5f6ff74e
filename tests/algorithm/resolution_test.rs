use crate::utils::{adamawa_registry, unit};
use ward_fusion::algorithm::resolution::{TieBreak, resolve};
use ward_fusion::{FusionConfig, IdentityResolver, ResolutionKey, Technique};

fn resolve_in_yola_north(ward: &str) -> (Technique, Option<String>, f64) {
    let registry = adamawa_registry();
    let result = resolve(
        Some("Adamawa"),
        Some("Yola North"),
        Some(ward),
        registry.units(),
        &FusionConfig::default(),
    );
    (result.technique, result.unit_id, result.confidence)
}

#[test]
fn test_earliest_accepting_stage_is_reported() {
    let (technique, unit_id, confidence) = resolve_in_yola_north("JIMETA");
    assert_eq!(technique, Technique::Exact);
    assert_eq!(unit_id.as_deref(), Some("AD001"));
    assert!((confidence - 100.0).abs() < f64::EPSILON);

    let (technique, unit_id, confidence) = resolve_in_yola_north("Jimeta Ward");
    assert_eq!(technique, Technique::Normalized);
    assert_eq!(unit_id.as_deref(), Some("AD001"));
    assert!((confidence - 95.0).abs() < f64::EPSILON);

    let (technique, unit_id, confidence) = resolve_in_yola_north("Jimmeta");
    assert_eq!(technique, Technique::Phonetic);
    assert_eq!(unit_id.as_deref(), Some("AD001"));
    assert!(confidence <= 90.0);
}

#[test]
fn test_enumerated_wards_resolve_by_ordinal() {
    let (technique, unit_id, _) = resolve_in_yola_north("Gwale 1");
    assert_eq!(technique, Technique::OrdinalDisambiguated);
    assert_eq!(unit_id.as_deref(), Some("AD003"));

    let (technique, unit_id, _) = resolve_in_yola_north("Gwale 2");
    assert_eq!(technique, Technique::OrdinalDisambiguated);
    assert_eq!(unit_id.as_deref(), Some("AD004"));

    let (technique, unit_id, _) = resolve_in_yola_north("Gwale 3");
    assert_eq!(technique, Technique::Unmatched);
    assert!(unit_id.is_none());
}

#[test]
fn test_mixed_case_roman_siblings() {
    let units: Vec<_> = ["Item I", "Item Ii", "Item Iii", "Item Iv", "Item V"]
        .iter()
        .enumerate()
        .map(|(i, ward)| unit(&format!("KN{i}"), "Kano", Some("Dala"), ward))
        .collect();
    let result = resolve(
        Some("Kano"),
        Some("Dala"),
        Some("Item 4"),
        &units,
        &FusionConfig::default(),
    );
    assert_eq!(result.technique, Technique::OrdinalDisambiguated);
    assert_eq!(result.canonical.unwrap().ward, "Item Iv");
}

#[test]
fn test_decorated_parent_names_narrow_the_ward_pool() {
    let registry = adamawa_registry();
    let result = resolve(
        Some("Adamawa State"),
        Some("ad Yola South Local Government Area"),
        Some("Jimeta"),
        registry.units(),
        &FusionConfig::default(),
    );
    assert_eq!(result.unit_id.as_deref(), Some("AD005"));
    assert_eq!(result.lga.unwrap().technique, Technique::Exact);
    assert!(result.tie_break.is_none());
    assert!(!result.low_confidence);
}

#[test]
fn test_repeated_keys_are_memoized() {
    let registry = adamawa_registry();
    let mut resolver = IdentityResolver::new(registry.units(), &FusionConfig::default());
    let key = ResolutionKey::new(Some("Adamawa"), Some("Yola North"), Some("Doubeli"));

    let first = resolver.resolve(&key).clone();
    let second = resolver.resolve(&key).clone();
    assert_eq!(first, second);
    assert_eq!(resolver.cache().len(), 1);
    assert_eq!(resolver.cache().hits(), 1);
}

#[test]
fn test_ward_without_lga_prefers_the_prior_resolution() {
    let registry = adamawa_registry();
    let mut resolver = IdentityResolver::new(registry.units(), &FusionConfig::default());

    let without_lga = ResolutionKey::new(Some("Adamawa"), None, Some("Jimeta"));
    let tied = resolver.resolve(&without_lga).clone();
    assert_eq!(tied.unit_id.as_deref(), Some("AD001"));
    assert_eq!(tied.tie_break, Some(TieBreak::LowestId));
    assert_eq!(tied.tied, vec!["AD001".to_string(), "AD005".to_string()]);
    assert!(tied.low_confidence);

    let mut fresh = IdentityResolver::new(registry.units(), &FusionConfig::default());
    let south = fresh
        .resolve(&ResolutionKey::new(Some("Adamawa"), Some("Yola South"), Some("Jimeta")))
        .clone();
    assert_eq!(south.unit_id.as_deref(), Some("AD005"));
    let follow_up = fresh.resolve(&without_lga);
    assert_eq!(follow_up.unit_id.as_deref(), Some("AD005"));
    assert_eq!(follow_up.tie_break, Some(TieBreak::PriorResolution));
}

#[test]
fn test_state_wide_fallback_is_opt_in() {
    let registry = adamawa_registry();
    let misfiled = |config: FusionConfig| {
        resolve(
            Some("Adamawa"),
            Some("Yola North"),
            Some("Gurin"),
            registry.units(),
            &config,
        )
    };

    let strict = misfiled(FusionConfig::default());
    assert_eq!(strict.technique, Technique::Unmatched);
    assert!(!strict.candidates.is_empty());

    let relaxed = misfiled(FusionConfig::default().with_state_wide_fallback(true));
    assert_eq!(relaxed.unit_id.as_deref(), Some("AD006"));
    assert!(relaxed.low_confidence);
    assert!(relaxed.notes.iter().any(|note| note.contains("fallback")));
}

#[test]
fn test_registry_without_lga_tier() {
    let units = vec![
        unit("LG1", "Lagos", None, "Ikeja"),
        unit("LG2", "Lagos", None, "Yaba"),
    ];
    let result = resolve(
        Some("Lagos"),
        Some("Ikeja LGA"),
        Some("Yaba"),
        &units,
        &FusionConfig::default(),
    );
    assert_eq!(result.unit_id.as_deref(), Some("LG2"));
    assert!(result.lga.is_none());
    assert!(result.low_confidence);
}

#[test]
fn test_tied_lga_is_low_confidence_and_noted() {
    let registry = adamawa_registry();
    let result = resolve(
        Some("Adamawa"),
        Some("Yola"),
        Some("Jimeta"),
        registry.units(),
        &FusionConfig::default(),
    );

    let lga = result.lga.as_ref().unwrap();
    assert_eq!(lga.tie_break, Some(TieBreak::LowestId));
    assert_eq!(lga.id.as_deref(), Some("Yola North"));
    assert_eq!(lga.tied, vec!["Yola North".to_string(), "Yola South".to_string()]);

    assert_eq!(result.unit_id.as_deref(), Some("AD001"));
    assert!(result.low_confidence);
    assert!(
        result
            .notes
            .iter()
            .any(|note| note.contains("tied between Yola North, Yola South"))
    );
}

#[test]
fn test_arabic_ordinal_picks_the_lone_roman_sibling() {
    let units: Vec<_> = ["Item 1", "Item 2", "Item 3", "Item Iv"]
        .iter()
        .enumerate()
        .map(|(i, ward)| unit(&format!("KN{i}"), "Kano", Some("Dala"), ward))
        .collect();
    let result = resolve(
        Some("Kano"),
        Some("Dala"),
        Some("Item 4"),
        &units,
        &FusionConfig::default(),
    );
    assert_eq!(result.technique, Technique::OrdinalDisambiguated);
    assert_eq!(result.canonical.unwrap().ward, "Item Iv");
}

#[test]
fn test_first_ordinal_is_not_confused_with_its_neighbours() {
    let units: Vec<_> = ["X I", "X II", "X III", "X IV"]
        .iter()
        .enumerate()
        .map(|(i, ward)| unit(&format!("KN{i}"), "Kano", Some("Dala"), ward))
        .collect();
    let result = resolve(
        Some("Kano"),
        Some("Dala"),
        Some("X 1"),
        &units,
        &FusionConfig::default(),
    );
    assert_eq!(result.technique, Technique::OrdinalDisambiguated);
    assert_eq!(result.unit_id.as_deref(), Some("KN0"));
    assert_eq!(result.canonical.unwrap().ward, "X I");
}

#[test]
fn test_sole_registry_state_is_assumed_with_a_note() {
    let registry = adamawa_registry();
    let result = resolve(
        Some("Atlantis"),
        Some("Yola North"),
        Some("Doubeli"),
        registry.units(),
        &FusionConfig::default(),
    );
    assert!(!result.state.as_ref().unwrap().is_match());
    assert_eq!(result.unit_id.as_deref(), Some("AD002"));
    assert!(
        result
            .notes
            .iter()
            .any(|note| note.contains("'Atlantis' unresolved") && note.contains("Adamawa"))
    );
}
