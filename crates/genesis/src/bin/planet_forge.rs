//! # Planet Forge
//!
//! Command-line planet generator.
//!
//! ```text
//! planet_forge [--declarative] [--preset NAME] [ROOT] [PATH...]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::process::ExitCode;
use std::sync::Arc;

use genesis::planet::{planet_graph, PLANET_SYSTEM, PLANET_TEMPLATE};
use genesis_authoring::{AuthoringResult, ProceduralSystemBuilder};
use genesis_procedural::{
    GroupedProperties, ProceduralEntity, PropertyDefinition, PropertyGraph, PropertyMap, SeedManager,
    DEFAULT_GROUP,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_ROOT: &str = "GenesisAlpha42";
const DEFAULT_PATH: [&str; 3] = ["Galaxy", "System7", "Planet3"];

/// Parsed command line.
#[derive(Debug)]
struct Options {
    declarative: bool,
    preset: Option<String>,
    root: String,
    path: Vec<String>,
}

impl Options {
    /// `None` when usage was requested.
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, String> {
        let mut declarative = false;
        let mut preset = None;
        let mut positional = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => return Ok(None),
                "--declarative" => declarative = true,
                "--preset" => {
                    let name = args.next().ok_or("--preset needs a name")?;
                    preset = Some(name);
                    declarative = true;
                }
                flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let root = positional.next().unwrap_or_else(|| DEFAULT_ROOT.to_string());
        let mut path: Vec<String> = positional.collect();
        if path.is_empty() {
            path = DEFAULT_PATH.iter().map(ToString::to_string).collect();
        }

        Ok(Some(Self {
            declarative,
            preset,
            root,
            path,
        }))
    }
}

fn print_usage() {
    println!("Usage: planet_forge [--declarative] [--preset NAME] [ROOT] [PATH...]");
    println!();
    println!("Options:");
    println!("  --declarative   Build the planet from the TOML template");
    println!("  --preset NAME   Apply a template preset (implies --declarative)");
    println!();
    println!("Defaults: ROOT={DEFAULT_ROOT} PATH={}", DEFAULT_PATH.join(" "));
}

/// Regroups a flat map by the graph's group labels.
fn regroup(graph: &PropertyGraph, values: PropertyMap) -> GroupedProperties {
    let mut grouped = GroupedProperties::new();
    for (id, value) in values {
        let group = graph
            .definition(&id)
            .map_or(DEFAULT_GROUP, PropertyDefinition::group_or_default);
        grouped.entry(group.to_string()).or_default().insert(id, value);
    }
    grouped
}

fn forge(options: &Options) -> AuthoringResult<GroupedProperties> {
    let seeds = Arc::new(SeedManager::new(options.root.as_str()));
    let name = options.path.last().map_or(PLANET_SYSTEM, String::as_str);

    if !options.declarative {
        let entity = ProceduralEntity::new(name, options.path.iter().cloned(), seeds, Arc::new(planet_graph()?));
        return Ok(entity.generate_grouped()?);
    }

    let mut builder = ProceduralSystemBuilder::new();
    builder.import_system(PLANET_TEMPLATE)?;
    let analysis = builder.analyze_system(PLANET_SYSTEM);
    for issue in &analysis.issues {
        warn!(%issue, "planet template issue");
    }

    let graph = Arc::new(builder.system_graph(PLANET_SYSTEM)?);
    let entity = ProceduralEntity::new(name, options.path.iter().cloned(), seeds, Arc::clone(&graph));
    match &options.preset {
        Some(preset) => {
            let values = builder.apply_preset(&entity, PLANET_SYSTEM, preset)?;
            Ok(regroup(&graph, values))
        }
        None => Ok(entity.generate_grouped()?),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            error!("{message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    info!(
        root = %options.root,
        path = %options.path.join("/"),
        declarative = options.declarative,
        "forging planet"
    );

    let planet = match forge(&options) {
        Ok(planet) => planet,
        Err(e) => {
            error!(error = %e, "planet generation failed");
            return ExitCode::FAILURE;
        }
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         GENESIS PLANET FORGE                                     ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Root: {}", options.root);
    println!("Path: {}", options.path.join(" / "));
    if let Some(preset) = &options.preset {
        println!("Preset: {preset}");
    }

    for (group, values) in &planet {
        println!();
        println!("┌─ {} ", group.to_uppercase());
        for (id, value) in values.iter() {
            match value.as_number() {
                Some(n) => println!("│ {id:<26} {n:.4}"),
                None => println!("│ {id:<26} {value}"),
            }
        }
        println!("└──────────────────────────────────────────────────────────────────");
    }

    ExitCode::SUCCESS
}
