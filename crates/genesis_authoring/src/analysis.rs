//! # System Analysis
//!
//! Static checks over a [`SystemTemplate`]: undefined inputs, formulas
//! that do not parse or call unknown functions, identifiers a formula
//! reads without declaring, duplicate ids, cycles and long dependency
//! chains. Analysis never fails; everything it finds is an advisory
//! [`ValidationIssue`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use genesis_procedural::{PropertyDefinition, PropertyGraph, PropertyValue};

use crate::formula::{Formula, FunctionRegistry};
use crate::template::SystemTemplate;

const SUGGEST_GROUPS: &str = "Consider organizing properties into groups for better structure";
const SUGGEST_DEPENDENCIES: &str =
    "System has no dependencies - consider adding relationships between properties";
const SUGGEST_SHALLOWER: &str =
    "Deep dependency chains detected - consider simplifying for better performance";

/// A problem found by analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationIssue {
    /// No system registered under this name.
    SystemNotFound {
        /// Requested name.
        system: String,
    },
    /// Two properties share an id; only the first is analyzed.
    DuplicateProperty {
        /// Repeated id.
        property: String,
    },
    /// Input id that no property defines.
    MissingInput {
        /// Reading property.
        property: String,
        /// Undefined input.
        input: String,
    },
    /// Formula does not parse.
    InvalidFormula {
        /// Property with the formula.
        property: String,
        /// Parser message.
        message: String,
    },
    /// Formula calls a function that is not registered.
    UnknownFunction {
        /// Property with the formula.
        property: String,
        /// Unregistered name.
        function: String,
    },
    /// Formula reads a name that is not among the declared inputs.
    UndeclaredReference {
        /// Property with the formula.
        property: String,
        /// Name read.
        identifier: String,
    },
    /// Properties that depend on each other in a loop.
    DependencyCycle {
        /// Cycle path, first id repeated at the end.
        path: Vec<String>,
    },
    /// Dependency chain longer than recommended. Does not invalidate.
    ExcessiveDepth {
        /// Longest chain, in edges.
        depth: usize,
        /// Configured limit.
        limit: usize,
    },
}

impl ValidationIssue {
    /// Whether this issue makes the system invalid.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        !matches!(self, Self::ExcessiveDepth { .. })
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemNotFound { system } => write!(f, "System {system} not found"),
            Self::DuplicateProperty { property } => {
                write!(f, "Property {property} is defined more than once")
            }
            Self::MissingInput { property, input } => {
                write!(f, "Property {property} depends on undefined property {input}")
            }
            Self::InvalidFormula { property, message } => {
                write!(f, "Property {property} has invalid formula: {message}")
            }
            Self::UnknownFunction { property, function } => {
                write!(f, "Property {property} calls unknown function {function}")
            }
            Self::UndeclaredReference {
                property,
                identifier,
            } => write!(
                f,
                "Property {property} reads {identifier} without declaring it as an input"
            ),
            Self::DependencyCycle { path } => {
                write!(f, "Dependency cycle: {}", path.join(" -> "))
            }
            Self::ExcessiveDepth { depth, limit } => {
                write!(f, "Dependency depth {depth} exceeds recommended {limit}")
            }
        }
    }
}

/// Counts describing a system.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemStatistics {
    /// Number of property templates.
    pub total_properties: usize,
    /// Sum of input list lengths.
    pub dependencies: usize,
    /// Longest input chain, in edges.
    pub max_depth: usize,
    /// Explicit group names, sorted.
    pub groups: Vec<String>,
}

/// Result of [`analyze`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemAnalysis {
    /// No blocking issues.
    pub valid: bool,
    /// Everything found, in discovery order.
    pub issues: Vec<ValidationIssue>,
    /// Structural advice.
    pub suggestions: Vec<String>,
    /// Counts.
    pub statistics: SystemStatistics,
}

impl SystemAnalysis {
    /// Analysis of a system that does not exist.
    #[must_use]
    pub fn not_found(system: &str) -> Self {
        Self {
            valid: false,
            issues: vec![ValidationIssue::SystemNotFound {
                system: system.to_string(),
            }],
            suggestions: Vec::new(),
            statistics: SystemStatistics::default(),
        }
    }
}

/// Analyzes `system` against the callable `functions`.
///
/// Chains deeper than `max_recommended_depth` produce a non-blocking
/// [`ValidationIssue::ExcessiveDepth`] and a suggestion.
#[must_use]
pub fn analyze(
    system: &SystemTemplate,
    functions: &FunctionRegistry,
    max_recommended_depth: usize,
) -> SystemAnalysis {
    let mut issues = Vec::new();
    let mut groups = BTreeSet::new();
    let mut dependencies = 0;

    let defined: HashSet<&str> = system.properties.iter().map(|p| p.id.as_str()).collect();
    let mut seen = HashSet::new();
    let mut structure = Vec::with_capacity(system.properties.len());

    for property in &system.properties {
        if !seen.insert(property.id.as_str()) {
            issues.push(ValidationIssue::DuplicateProperty {
                property: property.id.clone(),
            });
            continue;
        }

        if let Some(group) = &property.group {
            groups.insert(group.clone());
        }

        dependencies += property.inputs.len();
        for input in &property.inputs {
            if !defined.contains(input.as_str()) {
                issues.push(ValidationIssue::MissingInput {
                    property: property.id.clone(),
                    input: input.clone(),
                });
            }
        }

        if let Some(source) = &property.formula {
            check_formula(&property.id, source, &property.inputs, functions, &mut issues);
        }

        // Shape only; analysis never evaluates
        structure.push(
            PropertyDefinition::new(property.id.clone(), |_, _| Ok(PropertyValue::Boolean(false)))
                .with_inputs(property.inputs.iter().cloned()),
        );
    }

    // Duplicates were filtered above, so construction cannot fail
    let (max_depth, cycle) = PropertyGraph::new(structure)
        .map(|graph| (graph.max_depth(), graph.find_cycle()))
        .unwrap_or_default();

    if let Some(path) = cycle {
        issues.push(ValidationIssue::DependencyCycle { path });
    }

    let mut suggestions = Vec::new();
    if groups.is_empty() {
        suggestions.push(SUGGEST_GROUPS.to_string());
    }
    if dependencies == 0 {
        suggestions.push(SUGGEST_DEPENDENCIES.to_string());
    }
    if max_depth > max_recommended_depth {
        issues.push(ValidationIssue::ExcessiveDepth {
            depth: max_depth,
            limit: max_recommended_depth,
        });
        suggestions.push(SUGGEST_SHALLOWER.to_string());
    }

    SystemAnalysis {
        valid: !issues.iter().any(ValidationIssue::is_blocking),
        issues,
        suggestions,
        statistics: SystemStatistics {
            total_properties: system.properties.len(),
            dependencies,
            max_depth,
            groups: groups.into_iter().collect(),
        },
    }
}

fn check_formula(
    property: &str,
    source: &str,
    inputs: &[String],
    functions: &FunctionRegistry,
    issues: &mut Vec<ValidationIssue>,
) {
    let formula = match Formula::parse(source) {
        Ok(formula) => formula,
        Err(e) => {
            issues.push(ValidationIssue::InvalidFormula {
                property: property.to_string(),
                message: e.to_string(),
            });
            return;
        }
    };

    for function in formula.functions() {
        if !functions.contains(function) {
            issues.push(ValidationIssue::UnknownFunction {
                property: property.to_string(),
                function: function.to_string(),
            });
        }
    }
    for identifier in formula.undeclared(inputs) {
        issues.push(ValidationIssue::UndeclaredReference {
            property: property.to_string(),
            identifier: identifier.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{OutputSpec, PropertyTemplate};

    fn analyze_default(system: &SystemTemplate) -> SystemAnalysis {
        analyze(system, &FunctionRegistry::default(), 5)
    }

    fn chain(length: usize) -> SystemTemplate {
        let mut system = SystemTemplate::new("Chain");
        for i in 0..length {
            let mut property =
                PropertyTemplate::new(format!("p{i}"), format!("P{i}"), OutputSpec::number()).with_group("chain");
            if i > 0 {
                property = property.with_inputs([format!("p{}", i - 1)]);
            }
            system.properties.push(property);
        }
        system
    }

    #[test]
    fn test_clean_system() {
        let analysis = analyze_default(&chain(3));
        assert!(analysis.valid, "{:?}", analysis.issues);
        assert!(analysis.issues.is_empty());
        assert!(analysis.suggestions.is_empty());
        assert_eq!(
            analysis.statistics,
            SystemStatistics {
                total_properties: 3,
                dependencies: 2,
                max_depth: 2,
                groups: vec!["chain".to_string()],
            }
        );
    }

    #[test]
    fn test_missing_input() {
        let system = SystemTemplate::new("Broken").with_property(
            PropertyTemplate::new("mass", "Mass", OutputSpec::number()).with_inputs(["radius"]),
        );
        let analysis = analyze_default(&system);
        assert!(!analysis.valid);
        assert_eq!(
            analysis.issues,
            [ValidationIssue::MissingInput {
                property: "mass".into(),
                input: "radius".into(),
            }]
        );
        assert_eq!(
            analysis.issues[0].to_string(),
            "Property mass depends on undefined property radius"
        );
    }

    #[test]
    fn test_formula_checks() {
        let system = SystemTemplate::new("Formulas")
            .with_property(PropertyTemplate::new("a", "A", OutputSpec::number()).with_formula("1 +"))
            .with_property(
                PropertyTemplate::new("b", "B", OutputSpec::number()).with_formula("teleport(seed)"),
            )
            .with_property(
                PropertyTemplate::new("c", "C", OutputSpec::number()).with_formula("a * 2 + PI"),
            );
        let analysis = analyze_default(&system);
        assert!(!analysis.valid);
        assert!(matches!(&analysis.issues[0], ValidationIssue::InvalidFormula { property, .. } if property == "a"));
        assert_eq!(
            analysis.issues[1],
            ValidationIssue::UnknownFunction {
                property: "b".into(),
                function: "teleport".into(),
            }
        );
        assert_eq!(
            analysis.issues[2],
            ValidationIssue::UndeclaredReference {
                property: "c".into(),
                identifier: "a".into(),
            }
        );
    }

    #[test]
    fn test_cycle_and_duplicates() {
        let system = SystemTemplate::new("Loop")
            .with_property(PropertyTemplate::new("a", "A", OutputSpec::number()).with_inputs(["b"]))
            .with_property(PropertyTemplate::new("b", "B", OutputSpec::number()).with_inputs(["a"]))
            .with_property(PropertyTemplate::new("a", "A again", OutputSpec::number()));
        let analysis = analyze_default(&system);
        assert!(!analysis.valid);
        assert!(analysis
            .issues
            .contains(&ValidationIssue::DuplicateProperty { property: "a".into() }));
        let cycle = analysis.issues.iter().find_map(|issue| match issue {
            ValidationIssue::DependencyCycle { path } => Some(path.clone()),
            _ => None,
        });
        let cycle = cycle.expect("cycle should be reported");
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 3);
    }

    #[test]
    fn test_deep_chain_is_advisory() {
        let analysis = analyze_default(&chain(8));
        assert!(analysis.valid, "Depth alone does not invalidate");
        assert_eq!(analysis.statistics.max_depth, 7);
        assert_eq!(
            analysis.issues,
            [ValidationIssue::ExcessiveDepth { depth: 7, limit: 5 }]
        );
        assert_eq!(analysis.suggestions, [SUGGEST_SHALLOWER]);
    }

    #[test]
    fn test_flat_ungrouped_suggestions() {
        let system = SystemTemplate::new("Flat")
            .with_property(PropertyTemplate::new("x", "X", OutputSpec::number()));
        let analysis = analyze_default(&system);
        assert!(analysis.valid);
        assert_eq!(analysis.suggestions, [SUGGEST_GROUPS, SUGGEST_DEPENDENCIES]);
    }

    #[test]
    fn test_not_found() {
        let analysis = SystemAnalysis::not_found("Ghost");
        assert!(!analysis.valid);
        assert_eq!(analysis.issues[0].to_string(), "System Ghost not found");
        assert_eq!(analysis.statistics.total_properties, 0);
    }
}
