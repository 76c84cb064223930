//! # Authoring Integration Tests
//!
//! End-to-end checks of the declarative layer:
//!
//! 1. **Sandboxing**: hostile or broken formulas fall back to defaults
//! 2. **Round trip**: export then import preserves every template
//! 3. **Determinism**: template-built entities match across builders
//!
//! Run with: cargo test --package genesis_authoring --test authoring_test

use std::sync::Arc;

use genesis_authoring::{
    AuthoringError, CacheSpec, OutputSpec, Preset, PresetValue, ProceduralSystemBuilder,
    PropertyTemplate, SystemTemplate, ValidationIssue, DEFAULT_TEST_ENTITY,
};
use genesis_procedural::{NoiseSource, ProceduralEntity, PropertyValue, SeedManager};
use proptest::prelude::*;

fn star_system() -> SystemTemplate {
    SystemTemplate::new("Stars")
        .with_description("Main sequence stars")
        .with_property(
            PropertyTemplate::new("mass", "Solar Masses", OutputSpec::ranged(0.1, 50.0))
                .with_group("core")
                .with_noise(NoiseSource::Simplex),
        )
        .with_property(
            PropertyTemplate::new("luminosity", "Luminosity", OutputSpec::number())
                .with_group("core")
                .with_inputs(["mass"])
                .with_formula("pow(mass, 3.5)")
                .with_cache(CacheSpec::default()),
        )
        .with_property(
            PropertyTemplate::new(
                "class",
                "Spectral Class",
                OutputSpec::discrete(["M", "K", "G", "F", "A", "B", "O"]),
            )
            .with_group("classification")
            .with_inputs(["mass"])
            .with_formula("mass < 0.45 ? 'M' : mass < 0.8 ? 'K' : mass < 1.04 ? 'G' : mass < 1.4 ? 'F' : mass < 2.1 ? 'A' : mass < 16 ? 'B' : 'O'"),
        )
        .with_property(
            PropertyTemplate::new("flare", "Flare Star", OutputSpec::Boolean)
                .with_group("classification")
                .with_inputs(["class"])
                .with_formula("class == 'M' && noise(seed, 'flare') > 0.5"),
        )
}

// ============================================================================
// SANDBOXING
// ============================================================================

#[test]
fn test_hostile_formulas_fall_back_to_defaults() {
    let mut builder = ProceduralSystemBuilder::new();
    let mut system = SystemTemplate::new("Hostile");
    for (i, formula) in [
        "process.exit(1)",
        "require('child_process')",
        "this.constructor",
        "globalThis",
        "(() => 1)()",
        "eval('1')",
        "x = 5",
        "while(true){}",
    ]
    .into_iter()
    .enumerate()
    {
        system.properties.push(
            PropertyTemplate::new(format!("p{i}"), format!("P{i}"), OutputSpec::ranged(7.0, 9.0))
                .with_formula(formula),
        );
    }
    let graph = builder.create_system(system).expect("hostile system still builds");

    let values = graph
        .evaluate(&genesis_procedural::Seed::from_raw("any"))
        .expect("generation never fails on formula errors");
    for (id, value) in values.iter() {
        assert_eq!(value, &PropertyValue::Number(7.0), "{id} should use the range minimum");
    }

    let analysis = builder.analyze_system("Hostile");
    assert!(!analysis.valid);
    assert!(analysis.issues.iter().all(|issue| matches!(
        issue,
        ValidationIssue::InvalidFormula { .. }
            | ValidationIssue::UnknownFunction { .. }
            | ValidationIssue::UndeclaredReference { .. }
    )));
}

// ============================================================================
// EXPORT / IMPORT
// ============================================================================

#[test]
fn test_export_import_round_trip() {
    let mut builder = ProceduralSystemBuilder::new();
    builder.create_system(star_system()).unwrap();
    builder
        .create_preset(
            "Stars",
            "sun",
            Preset::from([
                ("mass".to_string(), PresetValue::Number(1.0)),
                ("class".to_string(), PresetValue::from("G")),
            ]),
        )
        .unwrap();
    let exported = builder.export_system("Stars").unwrap();

    let mut fresh = ProceduralSystemBuilder::new();
    let imported = fresh.import_system(&exported).unwrap();
    let original = builder.system("Stars").unwrap();

    assert_eq!(imported.properties.len(), original.properties.len());
    for (a, b) in imported.properties.iter().zip(&original.properties) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.formula, b.formula);
    }
    assert_eq!(&imported, original, "Import must reproduce the exported system");
    assert_eq!(fresh.export_system("Stars").unwrap(), exported, "Export is stable");
}

#[test]
fn test_import_rejects_invalid_templates() {
    let mut builder = ProceduralSystemBuilder::new();
    let no_options = r#"
        name = "Broken"

        [[properties]]
        id = "kind"
        name = "Kind"
        output = { type = "discrete" }
    "#;
    assert_eq!(
        builder.import_system(no_options),
        Err(AuthoringError::MissingOptions("kind".into()))
    );

    let unnamed = "name = \"\"\n";
    assert!(matches!(
        builder.import_system(unnamed),
        Err(AuthoringError::InvalidSystem(_))
    ));
    assert_eq!(builder.available_systems().count(), 0);
}

// ============================================================================
// GENERATION
// ============================================================================

#[test]
fn test_imported_system_generates_same_values() {
    let mut builder = ProceduralSystemBuilder::new();
    builder.create_system(star_system()).unwrap();
    let exported = builder.export_system("Stars").unwrap();

    let mut fresh = ProceduralSystemBuilder::new();
    fresh.import_system(&exported).unwrap();

    let a = builder.create_test_entity("Stars", DEFAULT_TEST_ENTITY).unwrap();
    let b = fresh.create_test_entity("Stars", DEFAULT_TEST_ENTITY).unwrap();
    assert_eq!(a.generate().unwrap(), b.generate().unwrap());
}

#[test]
fn test_star_values_are_consistent() {
    let mut builder = ProceduralSystemBuilder::new();
    let graph = Arc::new(builder.create_system(star_system()).unwrap());
    let seeds = Arc::new(SeedManager::new("GenesisAlpha42"));

    for i in 0..20 {
        let star = ProceduralEntity::new(
            format!("Star{i}"),
            ["Galaxy".to_string(), format!("Star{i}")],
            Arc::clone(&seeds),
            Arc::clone(&graph),
        );
        let values = star.generate().unwrap();
        let mass = values.number("mass").unwrap();
        assert!((0.1..=50.0).contains(&mass));
        assert_eq!(values.number("luminosity"), Some(mass.powf(3.5)));

        let class = values.text("class").unwrap();
        if class != "M" {
            assert_eq!(values.boolean("flare"), Some(false), "Only M dwarfs flare");
        }
    }
}

#[test]
fn test_grouped_output() {
    let mut builder = ProceduralSystemBuilder::new();
    builder.create_system(star_system()).unwrap();
    let entity = builder.create_test_entity("Stars", "Sol").unwrap();
    let grouped = entity.generate_grouped().unwrap();

    let groups: Vec<&str> = grouped.keys().map(String::as_str).collect();
    assert_eq!(groups, ["classification", "core"]);
}

proptest! {
    #[test]
    fn test_ranged_noise_stays_in_range(
        seed in "[a-zA-Z0-9]{1,16}",
        min in -1000.0f64..1000.0,
        span in 0.001f64..1000.0,
    ) {
        let builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("v", "V", OutputSpec::ranged(min, min + span))
            .with_noise(NoiseSource::Worley);
        let definition = builder.build_property_definition(&template);
        let value = definition
            .compute(&genesis_procedural::PropertyMap::new(), &genesis_procedural::Seed::from_raw(seed))
            .unwrap();
        let n = value.as_number().unwrap();
        prop_assert!(n >= min - 1e-9 && n <= min + span + 1e-9, "{} outside [{}, {}]", n, min, min + span);
    }
}
