//! # Planet Definitions
//!
//! A planet is four subsystems of properties:
//!
//! | Group        | Properties                                                    |
//! |--------------|---------------------------------------------------------------|
//! | `basic`      | radius, density, mass, gravity, tilt, day/year, water, temp   |
//! | `atmosphere` | density, type, composition                                    |
//! | `geology`    | crust, core, tectonics, magnetic field                        |
//! | `climate`    | weather pattern, dominant biome                               |
//!
//! Each subsystem is available as hand-written definitions. The whole
//! planet is also shipped as a declarative template
//! ([`planet_system_template`]) whose formulas reproduce the hand-written
//! values exactly.

use genesis_authoring::{AuthoringResult, SystemTemplate};
use genesis_procedural::{
    map_range01, noise01, resolve_discrete, ComputeError, ProceduralResult, PropertyDefinition,
    PropertyGraph, PropertyMap, PropertyValue, Seed,
};

/// Declarative planet system, as TOML.
pub const PLANET_TEMPLATE: &str = include_str!("../data/planet.toml");

/// Name of the planet system in [`PLANET_TEMPLATE`].
pub const PLANET_SYSTEM: &str = "Planet";

/// `noise01` for this seed mapped onto `[min, max]`.
fn ranged(seed: &Seed, label: &str, min: f64, max: f64) -> PropertyValue {
    PropertyValue::Number(map_range01(noise01(seed.as_str(), label), min, max))
}

/// Discrete pick from a threshold table.
fn discrete(n: f64, table: &[(f64, &str)]) -> PropertyValue {
    let choice = resolve_discrete(n, table).copied().unwrap_or_default();
    PropertyValue::Discrete(choice.to_string())
}

/// `low` below one half, `high` otherwise.
fn either(n: f64, low: &str, high: &str) -> PropertyValue {
    PropertyValue::Discrete(if n < 0.5 { low } else { high }.to_string())
}

/// Physical basics.
#[must_use]
pub fn basic_subsystem() -> Vec<PropertyDefinition> {
    vec![
        PropertyDefinition::new("radius", |_, seed| Ok(ranged(seed, "radius", 0.5, 3.0))),
        PropertyDefinition::new("density", |_, seed| Ok(ranged(seed, "density", 0.5, 5.0))),
        PropertyDefinition::new("mass", |inputs, _| {
            let radius = inputs.require_number("radius")?;
            let density = inputs.require_number("density")?;
            Ok(PropertyValue::Number(radius.powf(3.0) * density))
        })
        .with_inputs(["radius", "density"]),
        PropertyDefinition::new("gravity", |inputs, _| {
            let mass = inputs.require_number("mass")?;
            let radius = inputs.require_number("radius")?;
            Ok(PropertyValue::Number(mass / radius.powf(2.0)))
        })
        .with_inputs(["mass", "radius"]),
        PropertyDefinition::new("axial_tilt", |_, seed| Ok(ranged(seed, "tilt", 0.0, 45.0))),
        PropertyDefinition::new("day_length", |_, seed| Ok(ranged(seed, "day", 8.0, 40.0))),
        PropertyDefinition::new("year_length", |_, seed| Ok(ranged(seed, "year", 200.0, 800.0))),
        PropertyDefinition::new("water_coverage", |_, seed| {
            Ok(PropertyValue::Number(noise01(seed.as_str(), "water")))
        }),
        PropertyDefinition::new("base_temperature", |_, seed| {
            Ok(ranged(seed, "temp", 150.0, 350.0))
        }),
    ]
    .into_iter()
    .map(|d| d.with_group("basic"))
    .collect()
}

/// Atmosphere.
#[must_use]
pub fn atmosphere_subsystem() -> Vec<PropertyDefinition> {
    vec![
        PropertyDefinition::new("atmosphere_density", |_, seed| {
            Ok(ranged(seed, "atm_density", 0.0, 10.0))
        }),
        PropertyDefinition::new("atmosphere_type", |inputs, seed| {
            let density = inputs.require_number("atmosphere_density")?;
            let thinnest = if density < 0.1 { "none" } else { "thin" };
            Ok(discrete(
                noise01(seed.as_str(), "atm_type"),
                &[
                    (0.1, thinnest),
                    (0.4, "thin"),
                    (0.7, "breathable"),
                    (0.9, "thick"),
                    (1.0, "toxic"),
                ],
            ))
        })
        .with_inputs(["atmosphere_density"]),
        PropertyDefinition::new("atmosphere_composition", |inputs, seed| {
            if inputs.require_text("atmosphere_type")? == "none" {
                return Ok(PropertyValue::Discrete("vacuum".to_string()));
            }
            Ok(discrete(
                noise01(seed.as_str(), "atm_mix"),
                &[
                    (0.5, "nitrogen-oxygen"),
                    (0.7, "carbon-dioxide"),
                    (0.9, "methane"),
                    (1.0, "exotic"),
                ],
            ))
        })
        .with_inputs(["atmosphere_type"]),
    ]
    .into_iter()
    .map(|d| d.with_group("atmosphere"))
    .collect()
}

/// Crust, core and magnetism.
#[must_use]
pub fn geology_subsystem() -> Vec<PropertyDefinition> {
    vec![
        PropertyDefinition::new("crust_type", |_, seed| {
            Ok(discrete(
                noise01(seed.as_str(), "crust"),
                &[(0.5, "rocky"), (0.7, "icy"), (0.9, "oceanic"), (1.0, "metallic")],
            ))
        }),
        PropertyDefinition::new("core_type", |_, seed| {
            Ok(discrete(
                noise01(seed.as_str(), "core"),
                &[(0.5, "solid"), (0.8, "molten"), (1.0, "exotic")],
            ))
        }),
        PropertyDefinition::new("tectonic_activity", |_, seed| {
            Ok(discrete(
                noise01(seed.as_str(), "tectonic"),
                &[(0.3, "none"), (0.6, "minor"), (1.0, "major")],
            ))
        }),
        PropertyDefinition::new("magnetic_field_strength", |inputs, seed| {
            let base = match inputs.require_text("core_type")? {
                "molten" => 1.0,
                "solid" => 0.5,
                _ => 1.5,
            };
            let field = map_range01(noise01(seed.as_str(), "magfield"), 0.1, 3.0);
            Ok(PropertyValue::Number(base * field))
        })
        .with_inputs(["core_type", "radius"]),
    ]
    .into_iter()
    .map(|d| d.with_group("geology"))
    .collect()
}

/// Reads the two inputs every climate property depends on.
fn climate_inputs(inputs: &PropertyMap) -> Result<(f64, f64), ComputeError> {
    Ok((
        inputs.require_number("base_temperature")?,
        inputs.require_number("water_coverage")?,
    ))
}

/// Weather and biome.
#[must_use]
pub fn climate_subsystem() -> Vec<PropertyDefinition> {
    vec![
        PropertyDefinition::new("weather_pattern", |inputs, seed| {
            let (temperature, water) = climate_inputs(inputs)?;
            let n = noise01(seed.as_str(), "weather");
            Ok(if water < 0.2 {
                either(n, "dry", "windy")
            } else if temperature > 310.0 {
                either(n, "stormy", "humid")
            } else {
                either(n, "temperate", "variable")
            })
        }),
        PropertyDefinition::new("dominant_biome", |inputs, seed| {
            let (temperature, water) = climate_inputs(inputs)?;
            let n = noise01(seed.as_str(), "biome");
            Ok(if water > 0.6 {
                either(n, "ocean", "swamp")
            } else if temperature < 250.0 {
                either(n, "tundra", "glacier")
            } else if temperature > 320.0 {
                either(n, "desert", "volcanic")
            } else {
                either(n, "forest", "plains")
            })
        }),
    ]
    .into_iter()
    .map(|d| d.with_inputs(["base_temperature", "water_coverage"]).with_group("climate"))
    .collect()
}

/// Every planet property, all four subsystems.
#[must_use]
pub fn planet_definitions() -> Vec<PropertyDefinition> {
    let mut definitions = basic_subsystem();
    definitions.extend(atmosphere_subsystem());
    definitions.extend(geology_subsystem());
    definitions.extend(climate_subsystem());
    definitions
}

/// Graph over [`planet_definitions`].
///
/// # Errors
///
/// Only if the definitions were edited into duplicates.
pub fn planet_graph() -> ProceduralResult<PropertyGraph> {
    PropertyGraph::new(planet_definitions())
}

/// The declarative planet system.
///
/// # Errors
///
/// Only if [`PLANET_TEMPLATE`] was edited into invalid TOML.
pub fn planet_system_template() -> AuthoringResult<SystemTemplate> {
    SystemTemplate::from_toml_str(PLANET_TEMPLATE)
}
