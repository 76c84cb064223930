//! # Procedural System Builder
//!
//! Turns templates into property graphs and manages a library of named
//! systems.
//!
//! ## Compute Functions
//!
//! A template with a formula is parsed once when its definition is
//! built. At evaluation time the formula is interpreted against the
//! resolved inputs, and the result is coerced into the template's output
//! kind. A template without a formula samples its noise source with the
//! property id as label.
//!
//! A formula that fails to parse or evaluate never fails generation: the
//! error is logged and the output kind's default value is used instead.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use genesis_procedural::{
    advanced_noise01_with, LruCache, NoiseEngine, NoiseSource, ProceduralEntity, PropertyDefinition,
    PropertyGraph, PropertyMap, PropertyValue, Seed, SeedManager,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::analysis::{analyze, SystemAnalysis};
use crate::config::BuilderConfig;
use crate::error::{AuthoringError, AuthoringResult};
use crate::formula::{Arity, Formula, FormulaError, FormulaValue, FunctionRegistry};
use crate::template::{OutputSpec, Preset, PropertyTemplate, SystemTemplate};

/// Entity name used by [`ProceduralSystemBuilder::create_test_entity`]
/// when none is given.
pub const DEFAULT_TEST_ENTITY: &str = "TestEntity";

/// How a property produces its raw value.
enum Body {
    /// Parsed formula, or the parse error to report on every evaluation.
    Formula(Result<Formula, FormulaError>),
    /// No formula: sample this source.
    Noise(NoiseSource),
}

/// Everything a template's compute function needs at evaluation time.
struct TemplateCompute {
    id: String,
    output: OutputSpec,
    body: Body,
    functions: Arc<FunctionRegistry>,
    engine: NoiseEngine,
}

impl TemplateCompute {
    fn compute(&self, inputs: &PropertyMap, seed: &Seed) -> PropertyValue {
        let result = match &self.body {
            Body::Formula(Ok(formula)) => formula
                .evaluate(inputs, seed.as_str(), &self.functions)
                .and_then(|value| self.output.coerce(value)),
            Body::Formula(Err(e)) => Err(e.clone()),
            Body::Noise(source) => {
                let n = advanced_noise01_with(&self.engine, seed.as_str(), &self.id, *source);
                Ok(self.output.from_noise(n))
            }
        };

        result.unwrap_or_else(|error| {
            warn!(property = %self.id, %error, "formula failed, using default value");
            self.output.default_value()
        })
    }
}

/// Cache key for a property: its seed and the exact input values.
fn input_key(seed: &Seed, inputs: &PropertyMap) -> String {
    let mut key = seed.as_str().to_string();
    for (id, value) in inputs.iter() {
        // Numbers by bit pattern so distinct values never share a key
        let entry = match value {
            PropertyValue::Number(n) => format!("|{id}=n{:016x}", n.to_bits()),
            PropertyValue::Boolean(b) => format!("|{id}=b{b}"),
            PropertyValue::String(s) => format!("|{id}=s{}:{s}", s.len()),
            PropertyValue::Discrete(s) => format!("|{id}=d{}:{s}", s.len()),
        };
        key.push_str(&entry);
    }
    key
}

/// Builds property graphs from templates and keeps a library of systems.
#[derive(Debug)]
pub struct ProceduralSystemBuilder {
    config: BuilderConfig,
    engine: NoiseEngine,
    functions: Arc<FunctionRegistry>,
    templates: BTreeMap<String, PropertyTemplate>,
    systems: BTreeMap<String, SystemTemplate>,
}

impl Default for ProceduralSystemBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProceduralSystemBuilder {
    /// Builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BuilderConfig::default())
    }

    /// Builder with its own noise engine sized by `config`.
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        let engine = NoiseEngine::new(&config.noise_cache);
        let functions = Arc::new(FunctionRegistry::with_builtins(engine.clone()));
        Self {
            config,
            engine,
            functions,
            templates: BTreeMap::new(),
            systems: BTreeMap::new(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Noise engine used by formulas and noise-sourced properties.
    #[must_use]
    pub const fn noise_engine(&self) -> &NoiseEngine {
        &self.engine
    }

    /// Functions callable from formulas.
    #[must_use]
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Registers a function for formulas built from now on.
    ///
    /// Definitions built earlier keep the functions they were built with.
    pub fn add_custom_function<F>(&mut self, name: impl Into<String>, arity: Arity, function: F)
    where
        F: Fn(&[FormulaValue]) -> Result<FormulaValue, FormulaError> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(function = %name, "registering custom formula function");
        Arc::make_mut(&mut self.functions).register(name, arity, function);
    }

    /// Validates and stores a reusable template.
    ///
    /// # Errors
    ///
    /// The first validation rule the template breaks.
    pub fn create_property_template(&mut self, template: PropertyTemplate) -> AuthoringResult<()> {
        template.validate()?;
        self.templates.insert(template.id.clone(), template);
        Ok(())
    }

    /// A stored template.
    #[must_use]
    pub fn template(&self, id: &str) -> Option<&PropertyTemplate> {
        self.templates.get(id)
    }

    /// Builds the definition for one template.
    ///
    /// The formula is parsed here, once. The compute function never
    /// returns an error.
    #[must_use]
    pub fn build_property_definition(&self, template: &PropertyTemplate) -> PropertyDefinition {
        let body = match &template.formula {
            Some(source) => {
                let parsed = Formula::parse(source.as_str());
                if let Err(error) = &parsed {
                    warn!(property = %template.id, %error, "formula does not parse");
                }
                Body::Formula(parsed)
            }
            None => Body::Noise(template.noise),
        };

        let compute = TemplateCompute {
            id: template.id.clone(),
            output: template.output.clone(),
            body,
            functions: Arc::clone(&self.functions),
            engine: self.engine.clone(),
        };

        let definition = match template.cache {
            None => PropertyDefinition::new(template.id.clone(), move |inputs, seed| {
                Ok(compute.compute(inputs, seed))
            }),
            Some(spec) => {
                // A zero TTL means entries never expire
                let cache: Mutex<LruCache<String, PropertyValue>> = Mutex::new(match spec.ttl_ms {
                    Some(ms) if ms > 0 => LruCache::with_ttl(spec.max_size, Duration::from_millis(ms)),
                    _ => LruCache::new(spec.max_size),
                });
                PropertyDefinition::new(template.id.clone(), move |inputs, seed| {
                    let key = input_key(seed, inputs);
                    if let Some(hit) = cache.lock().get(&key) {
                        return Ok(hit.clone());
                    }
                    let value = compute.compute(inputs, seed);
                    cache.lock().insert(key, value.clone());
                    Ok(value)
                })
            }
        };

        let definition = definition.with_inputs(template.inputs.iter().cloned());
        match &template.group {
            Some(group) => definition.with_group(group.clone()),
            None => definition,
        }
    }

    fn build_graph(&self, system: &SystemTemplate) -> AuthoringResult<PropertyGraph> {
        let definitions = system
            .properties
            .iter()
            .map(|template| self.build_property_definition(template))
            .collect();
        Ok(PropertyGraph::new(definitions)?)
    }

    /// Builds a system's graph and registers the system under its name.
    ///
    /// # Errors
    ///
    /// A template validation error, or
    /// [`genesis_procedural::ProceduralError::DuplicateProperty`].
    pub fn create_system(&mut self, system: SystemTemplate) -> AuthoringResult<PropertyGraph> {
        system.validate()?;
        let graph = self.build_graph(&system)?;
        info!(
            system = %system.name,
            properties = graph.len(),
            max_depth = graph.max_depth(),
            "system registered"
        );
        self.systems.insert(system.name.clone(), system);
        Ok(graph)
    }

    /// A registered system.
    #[must_use]
    pub fn system(&self, name: &str) -> Option<&SystemTemplate> {
        self.systems.get(name)
    }

    /// Names of every registered system, sorted.
    pub fn available_systems(&self) -> impl Iterator<Item = &str> {
        self.systems.keys().map(String::as_str)
    }

    fn require_system(&self, name: &str) -> AuthoringResult<&SystemTemplate> {
        self.systems
            .get(name)
            .ok_or_else(|| AuthoringError::SystemNotFound(name.to_string()))
    }

    /// Rebuilds the graph of a registered system.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::SystemNotFound`], or a graph construction error.
    pub fn system_graph(&self, name: &str) -> AuthoringResult<PropertyGraph> {
        self.build_graph(self.require_system(name)?)
    }

    /// Checks a registered system for problems. Never fails.
    #[must_use]
    pub fn analyze_system(&self, name: &str) -> SystemAnalysis {
        match self.systems.get(name) {
            Some(system) => analyze(system, &self.functions, self.config.max_recommended_depth),
            None => SystemAnalysis::not_found(name),
        }
    }

    /// Serializes a registered system as TOML.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::SystemNotFound`] or [`AuthoringError::Serialize`].
    pub fn export_system(&self, name: &str) -> AuthoringResult<String> {
        self.require_system(name)?.to_toml_string()
    }

    /// Parses, validates and registers a TOML system.
    ///
    /// Replaces any system of the same name.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::Parse`] for malformed text, otherwise the first
    /// validation error.
    pub fn import_system(&mut self, text: &str) -> AuthoringResult<SystemTemplate> {
        let system = SystemTemplate::from_toml_str(text)?;
        system.validate()?;
        info!(
            system = %system.name,
            properties = system.properties.len(),
            "system imported"
        );
        self.systems.insert(system.name.clone(), system.clone());
        Ok(system)
    }

    /// Stores named overrides for a registered system.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::SystemNotFound`].
    pub fn create_preset(
        &mut self,
        system: &str,
        preset: impl Into<String>,
        values: Preset,
    ) -> AuthoringResult<()> {
        let template = self
            .systems
            .get_mut(system)
            .ok_or_else(|| AuthoringError::SystemNotFound(system.to_string()))?;
        template.presets.insert(preset.into(), values);
        Ok(())
    }

    /// Generates `entity` and applies a preset.
    ///
    /// Only properties the entity actually has are overridden; preset keys
    /// with no matching property are ignored.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::PresetNotFound`] if the system or the preset is
    /// missing, or the entity's generation error.
    pub fn apply_preset(
        &self,
        entity: &ProceduralEntity,
        system: &str,
        preset: &str,
    ) -> AuthoringResult<PropertyMap> {
        let overrides = self
            .systems
            .get(system)
            .and_then(|s| s.presets.get(preset))
            .ok_or_else(|| AuthoringError::PresetNotFound {
                system: system.to_string(),
                preset: preset.to_string(),
            })?;

        let mut values = entity.generate()?;
        for (id, value) in overrides {
            if let Some(current) = values.get(id) {
                let replacement = value.to_property(current);
                values.insert(id.clone(), replacement);
            }
        }
        Ok(values)
    }

    /// An entity of a registered system under a fixed test seed.
    ///
    /// The root seed is `"<system>-Test"` and the path is
    /// `["Test", system, entity_name]`.
    ///
    /// # Errors
    ///
    /// [`AuthoringError::SystemNotFound`], or a graph construction error.
    pub fn create_test_entity(&self, system: &str, entity_name: &str) -> AuthoringResult<ProceduralEntity> {
        let graph = self.system_graph(system)?;
        let seeds = SeedManager::new(format!("{system}-Test"));
        Ok(ProceduralEntity::new(
            entity_name,
            ["Test", system, entity_name],
            Arc::new(seeds),
            Arc::new(graph),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::template::{CacheSpec, PresetValue};
    use genesis_procedural::{ProceduralError, DEFAULT_GROUP};

    fn planets() -> SystemTemplate {
        SystemTemplate::new("Planets")
            .with_description("Rocky planets")
            .with_property(
                PropertyTemplate::new("radius", "Radius", OutputSpec::ranged(0.5, 3.0)).with_group("basic"),
            )
            .with_property(
                PropertyTemplate::new("mass", "Mass", OutputSpec::number())
                    .with_group("basic")
                    .with_inputs(["radius"])
                    .with_formula("radius ** 3"),
            )
            .with_property(
                PropertyTemplate::new("crust", "Crust", OutputSpec::discrete(["rocky", "icy", "metallic"]))
                    .with_group("geology")
                    .with_inputs(["mass"])
                    .with_formula("mass > 10 ? 'metallic' : randomChoice(seed, 'crust', ['rocky', 'icy'])"),
            )
    }

    #[test]
    fn test_create_system_generates() {
        let mut builder = ProceduralSystemBuilder::new();
        let graph = builder.create_system(planets()).unwrap();
        let values = graph.evaluate(&Seed::from_raw("s1")).unwrap();

        let radius = values.number("radius").unwrap();
        assert!((0.5..=3.0).contains(&radius));
        assert_eq!(values.number("mass"), Some(radius.powf(3.0)));
        assert!(matches!(values.text("crust"), Some("rocky" | "icy" | "metallic")));
        assert_eq!(builder.available_systems().collect::<Vec<_>>(), ["Planets"]);
    }

    #[test]
    fn test_bad_formula_uses_default() {
        let builder = ProceduralSystemBuilder::new();
        let seed = Seed::from_raw("s");
        for (formula, output, expected) in [
            ("1 +", OutputSpec::ranged(2.0, 4.0), PropertyValue::Number(2.0)),
            ("undefinedThing * 2", OutputSpec::number(), PropertyValue::Number(0.0)),
            ("1 / 0", OutputSpec::number(), PropertyValue::Number(0.0)),
            ("pow(2)", OutputSpec::Boolean, PropertyValue::Boolean(false)),
            ("nope()", OutputSpec::discrete(["a", "b"]), PropertyValue::Discrete("a".into())),
        ] {
            let template = PropertyTemplate::new("p", "P", output).with_formula(formula);
            let definition = builder.build_property_definition(&template);
            assert_eq!(
                definition.compute(&PropertyMap::new(), &seed),
                Ok(expected),
                "'{formula}' should fall back to the default"
            );
        }
    }

    #[test]
    fn test_noise_source_property() {
        let builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("terrain", "Terrain", OutputSpec::ranged(0.0, 100.0))
            .with_noise(NoiseSource::Fractal);
        let definition = builder.build_property_definition(&template);
        let seed = Seed::from_raw("world");

        let a = definition.compute(&PropertyMap::new(), &seed).unwrap();
        let b = definition.compute(&PropertyMap::new(), &seed).unwrap();
        assert_eq!(a, b, "Noise properties are deterministic");
        let n = a.as_number().unwrap();
        assert!((0.0..=100.0).contains(&n));
        assert_eq!(definition.group_or_default(), DEFAULT_GROUP);
    }

    #[test]
    fn test_hash_noise_matches_utils() {
        let builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("size", "Size", OutputSpec::ranged(0.0, 10.0));
        let definition = builder.build_property_definition(&template);
        let value = definition.compute(&PropertyMap::new(), &Seed::from_raw("abc")).unwrap();
        let expected = 10.0 * genesis_procedural::noise01("abc", "size");
        assert_eq!(value, PropertyValue::Number(expected));
    }

    #[test]
    fn test_cached_property_is_stable() {
        let builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("double", "Double", OutputSpec::number())
            .with_inputs(["x"])
            .with_formula("x * 2")
            .with_cache(CacheSpec { max_size: 2, ttl_ms: None });
        let definition = builder.build_property_definition(&template);
        let seed = Seed::from_raw("s");

        for x in [1.0, 2.0, 3.0, 1.0, 2.0] {
            let mut inputs = PropertyMap::new();
            inputs.insert("x", PropertyValue::Number(x));
            assert_eq!(
                definition.compute(&inputs, &seed),
                Ok(PropertyValue::Number(x * 2.0)),
                "Cached result must track input values"
            );
        }
    }

    /// A builder whose `counted(x)` returns `x` and counts its calls.
    fn counting_builder() -> (ProceduralSystemBuilder, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut builder = ProceduralSystemBuilder::new();
        builder.add_custom_function("counted", Arity::Exact(1), move |args| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(args[0].clone())
        });
        (builder, calls)
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        for ttl_ms in [None, Some(0)] {
            let (builder, calls) = counting_builder();
            let template = PropertyTemplate::new("echo", "Echo", OutputSpec::number())
                .with_inputs(["x"])
                .with_formula("counted(x)")
                .with_cache(CacheSpec { max_size: 4, ttl_ms });
            let definition = builder.build_property_definition(&template);
            let seed = Seed::from_raw("s");
            let mut inputs = PropertyMap::new();
            inputs.insert("x", PropertyValue::Number(3.0));

            for _ in 0..3 {
                assert_eq!(definition.compute(&inputs, &seed), Ok(PropertyValue::Number(3.0)));
            }
            assert_eq!(calls.load(Ordering::SeqCst), 1, "ttl {ttl_ms:?} should serve cache hits");
        }
    }

    #[test]
    fn test_positive_ttl_caches_until_expiry() {
        let (builder, calls) = counting_builder();
        let template = PropertyTemplate::new("echo", "Echo", OutputSpec::number())
            .with_inputs(["x"])
            .with_formula("counted(x)")
            .with_cache(CacheSpec { max_size: 4, ttl_ms: Some(60_000) });
        let definition = builder.build_property_definition(&template);
        let mut inputs = PropertyMap::new();
        inputs.insert("x", PropertyValue::Number(1.5));

        definition.compute(&inputs, &Seed::from_raw("s")).unwrap();
        definition.compute(&inputs, &Seed::from_raw("s")).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_long_operator_chain_uses_default() {
        let builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("sum", "Sum", OutputSpec::ranged(5.0, 10.0))
            .with_formula(format!("1{}", "+1".repeat(200_000)));
        let definition = builder.build_property_definition(&template);
        assert_eq!(
            definition.compute(&PropertyMap::new(), &Seed::from_raw("s")),
            Ok(PropertyValue::Number(5.0)),
            "An oversized formula is rejected, not evaluated"
        );
    }

    #[test]
    fn test_input_key_distinguishes_values() {
        let seed = Seed::from_raw("s");
        let mut a = PropertyMap::new();
        a.insert("x", PropertyValue::Number(0.1));
        let mut b = PropertyMap::new();
        b.insert("x", PropertyValue::Number(0.1 + f64::EPSILON));
        let mut c = PropertyMap::new();
        c.insert("x", PropertyValue::String("0.1".into()));
        assert_ne!(input_key(&seed, &a), input_key(&seed, &b));
        assert_ne!(input_key(&seed, &a), input_key(&seed, &c));
        assert_ne!(input_key(&seed, &a), input_key(&Seed::from_raw("t"), &a));
    }

    #[test]
    fn test_custom_function() {
        let mut builder = ProceduralSystemBuilder::new();
        builder.add_custom_function("triple", Arity::Exact(1), |args| {
            let n = args[0]
                .as_number()
                .ok_or_else(|| FormulaError::Type("triple needs a number".into()))?;
            Ok(FormulaValue::Number(n * 3.0))
        });
        let template = PropertyTemplate::new("t", "T", OutputSpec::number()).with_formula("triple(4)");
        let definition = builder.build_property_definition(&template);
        assert_eq!(
            definition.compute(&PropertyMap::new(), &Seed::from_raw("s")),
            Ok(PropertyValue::Number(12.0))
        );
        assert!(builder.functions().contains("sin"), "Builtins survive registration");
    }

    #[test]
    fn test_template_library() {
        let mut builder = ProceduralSystemBuilder::new();
        let template = PropertyTemplate::new("radius", "Radius", OutputSpec::ranged(0.5, 3.0));
        builder.create_property_template(template.clone()).unwrap();
        assert_eq!(builder.template("radius"), Some(&template));

        let invalid = PropertyTemplate::new("bad", "Bad", OutputSpec::ranged(3.0, 1.0));
        assert!(builder.create_property_template(invalid).is_err());
        assert!(builder.template("bad").is_none());
    }

    #[test]
    fn test_create_system_rejects_duplicates() {
        let mut builder = ProceduralSystemBuilder::new();
        let system = SystemTemplate::new("Dup")
            .with_property(PropertyTemplate::new("a", "A", OutputSpec::number()))
            .with_property(PropertyTemplate::new("a", "A", OutputSpec::number()));
        assert_eq!(
            builder.create_system(system).unwrap_err(),
            AuthoringError::Procedural(ProceduralError::DuplicateProperty("a".into()))
        );
        assert!(builder.system("Dup").is_none(), "Failed systems are not registered");
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut builder = ProceduralSystemBuilder::new();
        builder.create_system(planets()).unwrap();
        let text = builder.export_system("Planets").unwrap();

        let mut other = ProceduralSystemBuilder::new();
        let imported = other.import_system(&text).unwrap();
        assert_eq!(&imported, builder.system("Planets").unwrap());
        assert_eq!(imported.properties.len(), 3);

        assert_eq!(
            builder.export_system("Moons"),
            Err(AuthoringError::SystemNotFound("Moons".into()))
        );
    }

    #[test]
    fn test_import_validates() {
        let mut builder = ProceduralSystemBuilder::new();
        let text = r#"
            name = "Bad"

            [[properties]]
            id = "loop"
            name = "Loop"
            inputs = ["loop"]
            output = { type = "number" }
        "#;
        assert_eq!(
            builder.import_system(text),
            Err(AuthoringError::SelfDependency("loop".into()))
        );
        assert!(builder.system("Bad").is_none());
        assert!(matches!(builder.import_system("name = "), Err(AuthoringError::Parse(_))));
    }

    #[test]
    fn test_presets() {
        let mut builder = ProceduralSystemBuilder::new();
        builder.create_system(planets()).unwrap();
        builder
            .create_preset(
                "Planets",
                "giant",
                Preset::from([
                    ("radius".to_string(), PresetValue::Number(3.0)),
                    ("crust".to_string(), PresetValue::from("icy")),
                    ("moons".to_string(), PresetValue::Number(12.0)),
                ]),
            )
            .unwrap();

        let entity = builder.create_test_entity("Planets", "Giant").unwrap();
        let values = builder.apply_preset(&entity, "Planets", "giant").unwrap();
        assert_eq!(values.number("radius"), Some(3.0));
        assert_eq!(values.get("crust"), Some(&PropertyValue::Discrete("icy".into())));
        assert!(values.get("moons").is_none(), "Unknown preset keys are ignored");
        assert_eq!(values.len(), 3);

        assert_eq!(
            builder.apply_preset(&entity, "Planets", "dwarf"),
            Err(AuthoringError::PresetNotFound {
                system: "Planets".into(),
                preset: "dwarf".into(),
            })
        );
        assert!(matches!(
            builder.create_preset("Moons", "x", Preset::new()),
            Err(AuthoringError::SystemNotFound(_))
        ));
    }

    #[test]
    fn test_test_entity_seed_path() {
        let mut builder = ProceduralSystemBuilder::new();
        builder.create_system(planets()).unwrap();
        let entity = builder.create_test_entity("Planets", DEFAULT_TEST_ENTITY).unwrap();
        assert_eq!(entity.name(), "TestEntity");
        assert_eq!(entity.path(), ["Test", "Planets", "TestEntity"]);

        let expected = SeedManager::new("Planets-Test").sub_seed(&["Test", "Planets", "TestEntity"]);
        assert_eq!(entity.full_seed(), &expected);

        assert!(matches!(
            builder.create_test_entity("Moons", DEFAULT_TEST_ENTITY),
            Err(AuthoringError::SystemNotFound(_))
        ));
    }

    #[test]
    fn test_analyze_through_builder() {
        let mut builder = ProceduralSystemBuilder::new();
        builder.create_system(planets()).unwrap();
        let analysis = builder.analyze_system("Planets");
        assert!(analysis.valid, "{:?}", analysis.issues);
        assert_eq!(analysis.statistics.max_depth, 2);
        assert_eq!(analysis.statistics.groups, ["basic", "geology"]);

        assert!(!builder.analyze_system("Moons").valid);
    }
}
