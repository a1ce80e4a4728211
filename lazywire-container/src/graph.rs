//! Dependency graph validation.
//!
//! Resolution discovers the graph lazily, one factory at a time. This module
//! offers an optional up-front check over the *declared* parameter names:
//! - Detects circular dependencies
//! - Checks that every declared parameter can be produced
//!
//! Nothing is invoked. Names resolved inside a factory body (for example by
//! a [`singleton_factory`](crate::inspect::singleton_factory)) are invisible
//! here and only checked when actually resolved.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use lazywire_support::rendering::{render_chain, suggest_similar};

use crate::error::{CircularDependencyError, MissingDependencyError, Result, WiringError};
use crate::name::DependencyName;

/// What the validator knows about a single name.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    /// Already produced: a leaf, whatever its producer declared.
    Resolved,
    /// Registered, with its declared parameters.
    Pending(Vec<DependencyName>),
}

/// Validates the declared dependency graph.
///
/// # Algorithm
/// Depth-first search from every pending name, keeping the current path to
/// detect cycles and a `validated` set so shared subgraphs are walked once.
pub(crate) struct GraphValidator {
    nodes: HashMap<DependencyName, Node>,
    /// Unknown names are tolerated (a fallback will be asked for them)
    tolerate_missing: bool,
    max_suggestions: usize,
    validated: HashSet<DependencyName>,
    path: Vec<DependencyName>,
}

impl GraphValidator {
    pub fn new(nodes: HashMap<DependencyName, Node>) -> Self {
        Self {
            nodes,
            tolerate_missing: false,
            max_suggestions: 0,
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    pub fn tolerate_missing(mut self, tolerate: bool) -> Self {
        self.tolerate_missing = tolerate;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.max_suggestions = max;
        self
    }

    /// Validates the entire graph.
    ///
    /// Names are visited in sorted order so the reported error is stable.
    ///
    /// # Errors
    /// - [`WiringError::CircularDependency`]: cycle detected
    /// - [`WiringError::MissingDependency`]: a parameter nobody produces
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<()> {
        let mut names: Vec<DependencyName> = self.nodes.keys().cloned().collect();
        names.sort();

        debug!(dependency_count = names.len(), "Starting dependency graph validation");

        for name in names {
            self.visit(&name)?;
        }

        debug!("Dependency graph validation passed");
        Ok(())
    }

    fn visit(&mut self, name: &DependencyName) -> Result<()> {
        if self.validated.contains(name) {
            return Ok(());
        }

        if self.path.contains(name) {
            let mut trail = self.path.clone();
            trail.push(name.clone());
            warn!(cycle = %render_chain(&trail), "Circular dependency detected");
            return Err(WiringError::CircularDependency(CircularDependencyError { trail }));
        }

        let params = match self.nodes.get(name) {
            Some(Node::Pending(params)) => params.clone(),
            Some(Node::Resolved) => Vec::new(),
            None if self.tolerate_missing => Vec::new(),
            None => return Err(self.missing(name)),
        };

        self.path.push(name.clone());
        for param in &params {
            self.visit(param)?;
        }
        self.path.pop();

        self.validated.insert(name.clone());
        Ok(())
    }

    fn missing(&self, name: &DependencyName) -> WiringError {
        let mut known: Vec<&str> = self.nodes.keys().map(DependencyName::as_str).collect();
        known.sort_unstable();

        WiringError::MissingDependency(MissingDependencyError {
            requested: name.clone(),
            required_by: self.path.last().cloned(),
            suggestions: suggest_similar(name.as_str(), &known, self.max_suggestions),
        })
    }
}
