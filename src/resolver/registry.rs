//! UnitRegistry - per-invocation record of evaluated units.
//!
//! Every unit is evaluated at most once per build invocation. The registry
//! tracks each unit's state, its exported settings once resolved, the plan
//! steps that produce its artifacts, and the unit dependency graph.

use std::collections::{BTreeMap, HashMap};

use anyhow::{bail, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::builder::plan::StepId;
use crate::core::settings::ExportedSettings;
use crate::core::unit::{UnitKind, UnitPath, UnitState};
use crate::resolver::errors::ResolveError;

/// Registry entry for one unit.
#[derive(Debug, Clone, Default)]
pub struct UnitEntry {
    pub state: UnitState,
    /// Kind of the unit's artifacts, set by the first quick declaration
    pub kind: Option<UnitKind>,
    /// Exported settings, final once `state` is `Resolved`
    pub settings: ExportedSettings,
    /// Plan steps a dependent's link has to wait for
    pub provides: Vec<StepId>,
    /// Direct dependencies in resolution order
    pub deps: Vec<UnitPath>,
}

/// Outcome of [`UnitRegistry::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Already evaluated; the cached exports.
    Resolved(ExportedSettings),
    /// Marked in-progress; the caller must evaluate the unit now.
    Started,
}

/// The per-invocation unit registry.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    entries: BTreeMap<UnitPath, UnitEntry>,
    /// Units currently being evaluated, outermost first
    stack: Vec<UnitPath>,
    graph: DiGraph<UnitPath, ()>,
    nodes: HashMap<UnitPath, NodeIndex>,
    evaluations: usize,
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `unit` on behalf of `requester`, starting its evaluation if
    /// it has not been seen yet.
    ///
    /// Requesting a unit that is still in progress is a cycle; the error
    /// carries the chain from the first occurrence back to it.
    pub fn begin(
        &mut self,
        unit: &UnitPath,
        requester: &UnitPath,
        spec: &str,
    ) -> Result<Lookup, ResolveError> {
        let state = self.state(unit);
        match state {
            UnitState::Resolved => {
                let settings = self.entries[unit].settings.clone();
                Ok(Lookup::Resolved(settings))
            }
            UnitState::InProgress => {
                let start = self.stack.iter().position(|u| u == unit).unwrap_or(0);
                let mut chain: Vec<UnitPath> = self.stack[start..].to_vec();
                chain.push(unit.clone());
                Err(ResolveError::CircularDependency {
                    requester: requester.clone(),
                    spec: spec.to_string(),
                    chain,
                })
            }
            UnitState::Unresolved => {
                self.entries.entry(unit.clone()).or_default().state = UnitState::InProgress;
                self.node(unit);
                self.stack.push(unit.clone());
                self.evaluations += 1;
                Ok(Lookup::Started)
            }
        }
    }

    /// Record a unit's exports and finish its evaluation.
    pub fn mark_resolved(&mut self, unit: &UnitPath, settings: ExportedSettings) -> Result<()> {
        let Some(entry) = self.entries.get_mut(unit) else {
            bail!("unit `{}` was never started", unit);
        };
        if entry.state != UnitState::InProgress {
            bail!("unit `{}` is {:?}, not in progress", unit, entry.state);
        }
        entry.state = UnitState::Resolved;
        entry.settings = settings;
        self.stack.retain(|u| u != unit);
        Ok(())
    }

    /// Drop an evaluation that failed part way.
    pub fn abandon(&mut self, unit: &UnitPath) {
        if let Some(entry) = self.entries.get_mut(unit) {
            if entry.state == UnitState::InProgress {
                entry.state = UnitState::Unresolved;
            }
        }
        self.stack.retain(|u| u != unit);
    }

    /// Record the artifact kind of `unit`; a second, different kind is an
    /// error because dependents rely on the shape of the exports.
    pub fn declare_kind(&mut self, unit: &UnitPath, kind: UnitKind) -> Result<(), ResolveError> {
        let entry = self.entries.entry(unit.clone()).or_default();
        match entry.kind {
            Some(existing) if existing != kind => Err(ResolveError::DuplicateUnitDeclaration {
                unit: unit.clone(),
                existing,
                requested: kind,
            }),
            _ => {
                entry.kind = Some(kind);
                Ok(())
            }
        }
    }

    /// Add plan steps that dependents of `unit` must wait for.
    pub fn add_provides(&mut self, unit: &UnitPath, steps: impl IntoIterator<Item = StepId>) {
        let entry = self.entries.entry(unit.clone()).or_default();
        for step in steps {
            if !entry.provides.contains(&step) {
                entry.provides.push(step);
            }
        }
    }

    pub fn provides(&self, unit: &UnitPath) -> &[StepId] {
        self.entries
            .get(unit)
            .map(|e| e.provides.as_slice())
            .unwrap_or(&[])
    }

    /// Record that `from` depends on `to`.
    pub fn record_dependency(&mut self, from: &UnitPath, to: &UnitPath) {
        let from_node = self.node(from);
        let to_node = self.node(to);
        if !self.graph.contains_edge(from_node, to_node) {
            self.graph.add_edge(from_node, to_node, ());
        }
        let entry = self.entries.entry(from.clone()).or_default();
        if !entry.deps.contains(to) {
            entry.deps.push(to.clone());
        }
    }

    fn node(&mut self, unit: &UnitPath) -> NodeIndex {
        if let Some(&node) = self.nodes.get(unit) {
            return node;
        }
        let node = self.graph.add_node(unit.clone());
        self.nodes.insert(unit.clone(), node);
        node
    }

    pub fn state(&self, unit: &UnitPath) -> UnitState {
        self.entries
            .get(unit)
            .map(|e| e.state)
            .unwrap_or(UnitState::Unresolved)
    }

    pub fn get(&self, unit: &UnitPath) -> Option<&UnitEntry> {
        self.entries.get(unit)
    }

    /// Exported settings of a resolved unit.
    pub fn settings(&self, unit: &UnitPath) -> Option<&ExportedSettings> {
        self.entries
            .get(unit)
            .filter(|e| e.state == UnitState::Resolved)
            .map(|e| &e.settings)
    }

    /// Direct dependencies of `unit`, in resolution order.
    pub fn dependencies(&self, unit: &UnitPath) -> &[UnitPath] {
        self.entries
            .get(unit)
            .map(|e| e.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Units that depend directly on `unit`, sorted.
    pub fn dependents(&self, unit: &UnitPath) -> Vec<UnitPath> {
        let Some(&node) = self.nodes.get(unit) else {
            return Vec::new();
        };
        let mut dependents: Vec<UnitPath> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Units currently being evaluated, outermost first.
    pub fn in_progress(&self) -> &[UnitPath] {
        &self.stack
    }

    /// All known units, ordered by path. The project root is excluded.
    pub fn units(&self) -> impl Iterator<Item = (&UnitPath, &UnitEntry)> {
        self.entries.iter().filter(|(unit, _)| !unit.is_root())
    }

    /// Number of unit evaluations started in this invocation.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }
}
