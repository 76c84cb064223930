//! # Determinism Verification Tests
//!
//! End-to-end checks of the procedural core:
//!
//! 1. **Seeds**: same root and path, same seed, across fresh managers
//! 2. **Entities**: same root and path, same generated values
//! 3. **Noise**: fractal output stays bounded, cache never changes values
//!
//! Run with: cargo test --package genesis_procedural --test determinism_test

use std::sync::Arc;

use genesis_procedural::{
    noise01, NoiseAlgorithm, NoiseCacheConfig, NoiseConfig, NoiseEngine, ProceduralEntity,
    ProceduralError, PropertyDefinition, PropertyGraph, PropertyValue, SeedManager,
};
use proptest::prelude::*;

const ROOT: &str = "GenesisAlpha42";
const PATH: [&str; 3] = ["Galaxy", "System7", "Planet3"];

fn planet_graph() -> Arc<PropertyGraph> {
    let graph = PropertyGraph::new(vec![
        PropertyDefinition::new("mass", |inputs, _| {
            Ok(PropertyValue::Number(inputs.require_number("radius")?.powi(3)))
        })
        .with_inputs(["radius"])
        .with_group("basic"),
        PropertyDefinition::new("radius", |_, seed| {
            Ok(PropertyValue::Number(0.5 + 2.5 * noise01(seed.as_str(), "radius")))
        })
        .with_group("basic"),
    ])
    .expect("graph should build");
    Arc::new(graph)
}

// ============================================================================
// END-TO-END PLANET
// ============================================================================

#[test]
fn test_planet_radius_and_mass() {
    let graph = planet_graph();
    let planet = ProceduralEntity::new(
        "Planet3",
        PATH,
        Arc::new(SeedManager::new(ROOT)),
        Arc::clone(&graph),
    );

    let values = planet.generate().expect("planet should generate");
    let radius = values.number("radius").expect("radius should be numeric");
    let mass = values.number("mass").expect("mass should be numeric");

    assert!((0.5..=3.0).contains(&radius), "radius {radius} out of range");
    assert!((mass - radius.powi(3)).abs() < 1e-9, "mass must be radius cubed");

    // A fresh manager at the same root reproduces the values exactly
    let again = ProceduralEntity::new("Planet3", PATH, Arc::new(SeedManager::new(ROOT)), graph)
        .generate()
        .expect("planet should generate");
    assert_eq!(values, again);
}

#[test]
fn test_different_paths_differ() {
    let graph = planet_graph();
    let seeds = Arc::new(SeedManager::new(ROOT));
    let a = ProceduralEntity::new("A", ["Galaxy", "System7", "Planet3"], Arc::clone(&seeds), Arc::clone(&graph));
    let b = ProceduralEntity::new("B", ["Galaxy", "System7", "Planet4"], seeds, graph);
    assert_ne!(a.full_seed(), b.full_seed());
    assert_ne!(a.generate().unwrap(), b.generate().unwrap());
}

#[test]
fn test_cycle_fails_whole_evaluation() {
    let graph = PropertyGraph::new(vec![
        PropertyDefinition::new("radius", |_, _| Ok(PropertyValue::Number(1.0))),
        PropertyDefinition::new("a", |_, _| Ok(PropertyValue::Number(1.0))).with_inputs(["b"]),
        PropertyDefinition::new("b", |_, _| Ok(PropertyValue::Number(1.0))).with_inputs(["a"]),
    ])
    .unwrap();
    let planet = ProceduralEntity::new("X", PATH, Arc::new(SeedManager::new(ROOT)), Arc::new(graph));

    match planet.generate() {
        Err(ProceduralError::UnresolvedProperties { pending }) => {
            assert_eq!(pending, ["a", "b"]);
        }
        other => panic!("Expected UnresolvedProperties, got {other:?}"),
    }
}

// ============================================================================
// NOISE
// ============================================================================

#[test]
fn test_fractal_bounded_for_one_and_eight_octaves() {
    let engine = NoiseEngine::new(&NoiseCacheConfig::default());
    for octaves in [1, 8] {
        let config = NoiseConfig::new(NoiseAlgorithm::Fractal).with_octaves(octaves);
        for i in 0..5_000 {
            let t = f64::from(i);
            let v = engine.fractal_3d(t * 0.173, t * 0.071, t * -0.113, &config);
            assert!((-1.2..=1.2).contains(&v), "{octaves} octaves: {v} out of bounds");
        }
    }
}

#[test]
fn test_cache_does_not_change_values() {
    let engine = NoiseEngine::new(&NoiseCacheConfig {
        max_size: 64,
        grid_size: 10.0,
    });
    for algorithm in NoiseAlgorithm::ALL {
        let plain = NoiseConfig::new(algorithm);
        let cached = NoiseConfig::new(algorithm).with_cache(true);
        for i in 0..200 {
            let t = f64::from(i) * 0.37;
            let expected = engine.noise_3d(t, t * 2.0, 1.0, &plain);
            assert_eq!(engine.noise_3d(t, t * 2.0, 1.0, &cached), expected);
            assert_eq!(engine.noise_3d(t, t * 2.0, 1.0, &cached), expected);
        }
    }

    let stats = engine.cache_stats();
    assert_eq!(stats.size, 64, "Cache must stay at capacity");
    assert!(stats.evictions > 0);
}

proptest! {
    #[test]
    fn test_sub_seed_is_a_pure_function(
        root in "[A-Za-z0-9]{1,16}",
        path in proptest::collection::vec("[A-Za-z0-9 ]{0,8}", 0..5),
    ) {
        let a = SeedManager::new(root.clone()).sub_seed(&path);
        let manager = SeedManager::new(root);
        let b = manager.sub_seed(&path);
        let c = manager.sub_seed(&path);
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&b, &c);
        prop_assert_eq!(a.as_str().len(), 16);
    }
}
