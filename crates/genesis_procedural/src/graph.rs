//! # Property Graph
//!
//! Dependency-resolved evaluation of interdependent properties.
//!
//! ## Evaluation Plan
//!
//! Each definition names the ids it reads. At construction the graph runs
//! Kahn's algorithm once over the input relation:
//!
//! ```text
//! radius ──► mass ──► gravity
//!    │                   ▲
//!    └───────────────────┘
//! ```
//!
//! Definitions reach the plan in an order where every input precedes its
//! reader. Definitions that never reach in-degree zero (an undefined input,
//! a cycle, or anything downstream of either) form the pending set, and
//! every evaluation fails with the full list of them.
//!
//! ## Purity
//!
//! A compute function sees only its declared inputs and the seed, so the
//! same seed always yields the same map.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{ComputeError, ProceduralError, ProceduralResult};
use crate::seed::Seed;
use crate::value::{GroupedProperties, PropertyMap, PropertyValue};

/// Group used for definitions without one.
pub const DEFAULT_GROUP: &str = "default";

/// Shared compute function of a definition.
pub type ComputeFn =
    Arc<dyn Fn(&PropertyMap, &Seed) -> Result<PropertyValue, ComputeError> + Send + Sync>;

/// One named, computable attribute.
#[derive(Clone)]
pub struct PropertyDefinition {
    id: String,
    inputs: Vec<String>,
    group: Option<String>,
    compute: ComputeFn,
}

impl PropertyDefinition {
    /// Creates a definition with no inputs and no group.
    pub fn new<F>(id: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&PropertyMap, &Seed) -> Result<PropertyValue, ComputeError> + Send + Sync + 'static,
    {
        Self::from_shared(id, Arc::new(compute))
    }

    /// Creates a definition from an already shared compute function.
    #[must_use]
    pub fn from_shared(id: impl Into<String>, compute: ComputeFn) -> Self {
        Self {
            id: id.into(),
            inputs: Vec::new(),
            group: None,
            compute,
        }
    }

    /// Sets the ids this definition reads.
    #[must_use]
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the group label.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared inputs, in order.
    #[inline]
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Group label, if any.
    #[inline]
    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Group label, falling back to [`DEFAULT_GROUP`].
    #[must_use]
    pub fn group_or_default(&self) -> &str {
        self.group().unwrap_or(DEFAULT_GROUP)
    }

    /// Runs the compute function.
    ///
    /// # Errors
    ///
    /// Propagates the compute function's error.
    pub fn compute(&self, inputs: &PropertyMap, seed: &Seed) -> Result<PropertyValue, ComputeError> {
        (self.compute)(inputs, seed)
    }
}

impl fmt::Debug for PropertyDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDefinition")
            .field("id", &self.id)
            .field("inputs", &self.inputs)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

/// Process-unique identity of a graph instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(u64);

impl GraphId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Values of one evaluation together with the exact inputs each
/// definition saw.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EvaluationTrace {
    /// Every computed value.
    pub values: PropertyMap,
    /// Per id, the input sub-map handed to its compute function.
    pub inputs: BTreeMap<String, PropertyMap>,
}

/// Immutable set of definitions with a precomputed evaluation plan.
#[derive(Clone, Debug)]
pub struct PropertyGraph {
    id: GraphId,
    definitions: Vec<PropertyDefinition>,
    index: HashMap<String, usize>,
    /// Definition indices in evaluation order.
    order: Vec<usize>,
    /// Ids that can never be evaluated, sorted.
    pending: Vec<String>,
    max_depth: usize,
}

impl PropertyGraph {
    /// Builds a graph and its evaluation plan.
    ///
    /// Undefined inputs and cycles are not rejected here; they surface as
    /// [`ProceduralError::UnresolvedProperties`] when evaluating.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::DuplicateProperty`] if two definitions
    /// share an id.
    pub fn new(definitions: Vec<PropertyDefinition>) -> ProceduralResult<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ProceduralError::DuplicateProperty(def.id.clone()));
            }
        }

        // Kahn's algorithm: edge input -> reader
        let mut in_degree = vec![0usize; definitions.len()];
        let mut readers: Vec<Vec<usize>> = vec![Vec::new(); definitions.len()];

        for (i, def) in definitions.iter().enumerate() {
            for input in &def.inputs {
                in_degree[i] += 1;
                if let Some(&producer) = index.get(input) {
                    readers[producer].push(i);
                }
            }
        }

        let mut queue: VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut depth = vec![0usize; definitions.len()];
        let mut order = Vec::with_capacity(definitions.len());

        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &reader in &readers[i] {
                depth[reader] = depth[reader].max(depth[i] + 1);
                in_degree[reader] -= 1;
                if in_degree[reader] == 0 {
                    queue.push_back(reader);
                }
            }
        }

        let mut pending: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg > 0)
            .map(|(i, _)| definitions[i].id.clone())
            .collect();
        pending.sort();

        let max_depth = order.iter().map(|&i| depth[i]).max().unwrap_or(0);

        Ok(Self {
            id: GraphId::next(),
            definitions,
            index,
            order,
            pending,
            max_depth,
        })
    }

    /// Identity of this instance.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> GraphId {
        self.id
    }

    /// Number of definitions.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the graph has no definitions.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Looks up a definition by id.
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&PropertyDefinition> {
        self.index.get(id).map(|&i| &self.definitions[i])
    }

    /// All definitions, in construction order.
    #[must_use]
    pub fn definitions(&self) -> &[PropertyDefinition] {
        &self.definitions
    }

    /// Ids in the order they are evaluated.
    ///
    /// Excludes pending ids.
    pub fn evaluation_order(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|&i| self.definitions[i].id.as_str())
    }

    /// Ids that can never be evaluated, sorted.
    #[must_use]
    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    /// Longest input chain among resolvable definitions, in edges.
    ///
    /// A definition with no inputs has depth 0.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Evaluates every definition.
    ///
    /// # Errors
    ///
    /// - [`ProceduralError::UnresolvedProperties`] if any definition can
    ///   never be evaluated. No partial map is returned.
    /// - [`ProceduralError::ComputeFailed`] if a compute function fails.
    pub fn evaluate(&self, seed: &Seed) -> ProceduralResult<PropertyMap> {
        self.run(seed, |_, _, _| {})
    }

    /// Evaluates every definition and groups the values by group label.
    ///
    /// Ungrouped definitions land under [`DEFAULT_GROUP`].
    ///
    /// # Errors
    ///
    /// Same as [`PropertyGraph::evaluate`].
    pub fn evaluate_grouped(&self, seed: &Seed) -> ProceduralResult<GroupedProperties> {
        let values = self.evaluate(seed)?;
        let mut grouped = GroupedProperties::new();
        for (id, value) in values {
            let group = self
                .definition(&id)
                .map_or(DEFAULT_GROUP, PropertyDefinition::group_or_default);
            grouped.entry(group.to_string()).or_default().insert(id, value);
        }
        Ok(grouped)
    }

    /// Evaluates every definition and records each one's input sub-map.
    ///
    /// # Errors
    ///
    /// Same as [`PropertyGraph::evaluate`].
    pub fn evaluate_with_trace(&self, seed: &Seed) -> ProceduralResult<EvaluationTrace> {
        let mut inputs = BTreeMap::new();
        let values = self.run(seed, |def, seen, _| {
            inputs.insert(def.id.clone(), seen.clone());
        })?;
        Ok(EvaluationTrace { values, inputs })
    }

    fn run(
        &self,
        seed: &Seed,
        mut observe: impl FnMut(&PropertyDefinition, &PropertyMap, &PropertyValue),
    ) -> ProceduralResult<PropertyMap> {
        if !self.pending.is_empty() {
            tracing::warn!(pending = ?self.pending, "property graph has unresolved properties");
            return Err(ProceduralError::UnresolvedProperties {
                pending: self.pending.clone(),
            });
        }

        let mut resolved = PropertyMap::new();
        for &i in &self.order {
            let def = &self.definitions[i];
            let inputs: PropertyMap = def
                .inputs
                .iter()
                .filter_map(|id| resolved.get(id).map(|v| (id.clone(), v.clone())))
                .collect();

            let value = def
                .compute(&inputs, seed)
                .map_err(|e| ProceduralError::ComputeFailed {
                    property: def.id.clone(),
                    reason: e.to_string(),
                })?;

            tracing::debug!(property = %def.id, %value, "property resolved");
            observe(def, &inputs, &value);
            resolved.insert(def.id.clone(), value);
        }

        Ok(resolved)
    }

    /// Finds one dependency cycle, if any.
    ///
    /// The returned path starts and ends with the same id and follows
    /// reader -> input edges. Useful for debugging a graph whose
    /// evaluation fails.
    #[must_use]
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut rec_stack = HashSet::new();
        let mut path = Vec::new();

        for start in 0..self.definitions.len() {
            if !visited.contains(&start) {
                if let Some(cycle) = self.dfs_find_cycle(start, &mut visited, &mut rec_stack, &mut path) {
                    return Some(cycle);
                }
            }
        }

        None
    }

    /// DFS helper for cycle detection.
    fn dfs_find_cycle(
        &self,
        node: usize,
        visited: &mut HashSet<usize>,
        rec_stack: &mut HashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        visited.insert(node);
        rec_stack.insert(node);
        path.push(node);

        for input in &self.definitions[node].inputs {
            let Some(&next) = self.index.get(input) else {
                continue;
            };

            if !visited.contains(&next) {
                if let Some(cycle) = self.dfs_find_cycle(next, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(&next) {
                let start = path.iter().position(|&i| i == next).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&i| self.definitions[i].id.clone())
                    .collect();
                cycle.push(self.definitions[next].id.clone());
                return Some(cycle);
            }
        }

        path.pop();
        rec_stack.remove(&node);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(id: &str, value: f64) -> PropertyDefinition {
        PropertyDefinition::new(id, move |_, _| Ok(PropertyValue::Number(value)))
    }

    fn sum(id: &str, inputs: &[&str]) -> PropertyDefinition {
        let names: Vec<String> = inputs.iter().map(|s| (*s).to_string()).collect();
        PropertyDefinition::new(id, move |map, _| {
            let mut total = 0.0;
            for name in &names {
                total += map.require_number(name)?;
            }
            Ok(PropertyValue::Number(total))
        })
        .with_inputs(inputs.iter().copied())
    }

    fn seed() -> Seed {
        Seed::from_raw("test-seed")
    }

    #[test]
    fn test_resolves_out_of_order_definitions() {
        let graph = PropertyGraph::new(vec![
            sum("c", &["a", "b"]),
            sum("b", &["a"]),
            constant("a", 2.0),
        ])
        .unwrap();

        let values = graph.evaluate(&seed()).unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values.number("a"), Some(2.0));
        assert_eq!(values.number("b"), Some(2.0));
        assert_eq!(values.number("c"), Some(4.0));

        let order: Vec<&str> = graph.evaluation_order().collect();
        assert_eq!(order, ["a", "b", "c"]);
        assert_eq!(graph.max_depth(), 2);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let err = PropertyGraph::new(vec![constant("a", 1.0), constant("a", 2.0)]).unwrap_err();
        assert_eq!(err, ProceduralError::DuplicateProperty("a".into()));
    }

    #[test]
    fn test_cycle_reports_all_pending() {
        let graph = PropertyGraph::new(vec![
            constant("root", 1.0),
            sum("a", &["b"]),
            sum("b", &["a"]),
            sum("downstream", &["a"]),
        ])
        .unwrap();

        let err = graph.evaluate(&seed()).unwrap_err();
        assert_eq!(
            err,
            ProceduralError::UnresolvedProperties {
                pending: vec!["a".into(), "b".into(), "downstream".into()],
            }
        );
        assert!(err.to_string().contains("a, b, downstream"));
    }

    #[test]
    fn test_missing_input_reports_pending() {
        let graph = PropertyGraph::new(vec![sum("mass", &["radius"])]).unwrap();
        let err = graph.evaluate(&seed()).unwrap_err();
        assert_eq!(
            err,
            ProceduralError::UnresolvedProperties {
                pending: vec!["mass".into()],
            }
        );
        assert!(graph.find_cycle().is_none(), "A missing input is not a cycle");
    }

    #[test]
    fn test_self_reference_is_pending() {
        let graph = PropertyGraph::new(vec![sum("a", &["a"])]).unwrap();
        assert_eq!(graph.pending(), ["a"]);
        assert_eq!(graph.find_cycle(), Some(vec!["a".to_string(), "a".to_string()]));
    }

    #[test]
    fn test_find_cycle() {
        let graph = PropertyGraph::new(vec![
            sum("a", &["c"]),
            sum("b", &["a"]),
            sum("c", &["b"]),
        ])
        .unwrap();
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);
    }

    #[test]
    fn test_inputs_are_sliced() {
        let graph = PropertyGraph::new(vec![
            constant("a", 1.0),
            constant("b", 2.0),
            PropertyDefinition::new("count", |map, _| Ok(PropertyValue::Number(map.len() as f64)))
                .with_inputs(["a"]),
        ])
        .unwrap();

        let trace = graph.evaluate_with_trace(&seed()).unwrap();
        assert_eq!(trace.values.number("count"), Some(1.0), "Only declared inputs are visible");
        assert_eq!(trace.inputs["count"].keys().collect::<Vec<_>>(), ["a"]);
        assert!(trace.inputs["a"].is_empty());
    }

    #[test]
    fn test_grouping() {
        let graph = PropertyGraph::new(vec![
            constant("radius", 1.0).with_group("basic"),
            sum("mass", &["radius"]).with_group("basic"),
            constant("albedo", 0.3),
        ])
        .unwrap();

        let grouped = graph.evaluate_grouped(&seed()).unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["basic"].len(), 2);
        assert_eq!(grouped[DEFAULT_GROUP].number("albedo"), Some(0.3));

        let flat = graph.evaluate(&seed()).unwrap();
        let regrouped: usize = grouped.values().map(PropertyMap::len).sum();
        assert_eq!(regrouped, flat.len());
    }

    #[test]
    fn test_compute_failure() {
        let graph = PropertyGraph::new(vec![
            PropertyDefinition::new("flag", |_, _| Ok(PropertyValue::Boolean(true))),
            sum("bad", &["flag"]),
        ])
        .unwrap();

        match graph.evaluate(&seed()) {
            Err(ProceduralError::ComputeFailed { property, reason }) => {
                assert_eq!(property, "bad");
                assert!(reason.contains("flag"));
            }
            other => panic!("Expected ComputeFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_seed_reaches_compute() {
        let graph = PropertyGraph::new(vec![PropertyDefinition::new("echo", |_, seed| {
            Ok(PropertyValue::String(seed.as_str().to_string()))
        })])
        .unwrap();
        let values = graph.evaluate(&Seed::from_raw("abc")).unwrap();
        assert_eq!(values.text("echo"), Some("abc"));
    }

    #[test]
    fn test_graph_ids_unique() {
        let a = PropertyGraph::new(Vec::new()).unwrap();
        let b = PropertyGraph::new(Vec::new()).unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.evaluate(&seed()).unwrap(), PropertyMap::new());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Random DAG: node i may only read nodes with a lower index, then
        /// the definition list is rotated so input order differs from
        /// dependency order.
        fn dag() -> impl Strategy<Value = (Vec<Vec<usize>>, usize)> {
            (1usize..24).prop_flat_map(|n| {
                let edges = (0..n)
                    .map(|i| proptest::collection::vec(0..i.max(1), 0..=i.min(3)))
                    .collect::<Vec<_>>();
                (edges, 0..n)
            })
        }

        proptest! {
            #[test]
            fn test_acyclic_sets_fully_resolve((edges, rotate) in dag()) {
                let mut defs: Vec<PropertyDefinition> = edges
                    .iter()
                    .enumerate()
                    .map(|(i, inputs)| {
                        let names: Vec<String> = inputs
                            .iter()
                            .filter(|&&j| j < i)
                            .map(|j| format!("p{j}"))
                            .collect();
                        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                        sum(&format!("p{i}"), &refs)
                    })
                    .collect();
                defs.rotate_left(rotate);

                let graph = PropertyGraph::new(defs).unwrap();
                let values = graph.evaluate(&seed()).unwrap();
                prop_assert_eq!(values.len(), edges.len());
                prop_assert!(graph.pending().is_empty());
            }
        }
    }
}
