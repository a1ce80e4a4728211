//! The resolution engine.
//!
//! A [`Resolution`] lives for exactly one top-level call (`get`, `inject`,
//! `construct`). It carries the trail of names currently being resolved and
//! borrows the registry only for individual lookups and writes, never while
//! a factory or the fallback runs. The trail is never stored on the
//! container, so independent calls cannot see each other's state, and an
//! error simply drops the whole `Resolution`.
//!
//! # Algorithm
//! For each requested name:
//! 1. already on the trail: cycle, fail with the full path
//! 2. memoized: return it
//! 3. no producer: ask the fallback, else fail as missing
//! 4. push on the trail, produce (value verbatim, or factory with each
//!    declared parameter resolved recursively), memoize, pop

use std::cell::RefCell;

use tracing::{debug, trace, warn};

use lazywire_support::rendering::{render_chain, suggest_similar};

use crate::error::{CircularDependencyError, MissingDependencyError, Result, WiringError};
use crate::inspect::NameInspector;
use crate::name::DependencyName;
use crate::producer::{AnyValue, Args, Factory, Overrides, Producer, Resolver};
use crate::registry::Registry;

pub(crate) struct Resolution<'a> {
    registry: &'a RefCell<Registry>,
    trail: Vec<DependencyName>,
    max_suggestions: usize,
}

impl<'a> Resolution<'a> {
    pub fn new(registry: &'a RefCell<Registry>, max_suggestions: usize) -> Self {
        Self {
            registry,
            trail: Vec::new(),
            max_suggestions,
        }
    }

    /// Resolves `name`, producing and memoizing it on first use.
    pub fn resolve(&mut self, name: &DependencyName) -> Result<AnyValue> {
        if self.trail.contains(name) {
            let mut trail = self.trail.clone();
            trail.push(name.clone());
            warn!(cycle = %render_chain(&trail), "Circular dependency detected");
            return Err(WiringError::CircularDependency(CircularDependencyError { trail }));
        }

        let memoized = self.registry.borrow().resolved(name.as_str());
        if let Some(value) = memoized {
            trace!(name = %name, "Memoized value hit");
            return Ok(value);
        }

        let producer = self.registry.borrow().producer(name.as_str()).cloned();
        let Some(producer) = producer else {
            return self.resolve_unregistered(name);
        };

        self.trail.push(name.clone());
        let produced = match producer {
            Producer::Value(value) => Ok(value),
            Producer::Factory(factory) => {
                debug!(name = %name, depth = self.trail.len(), "Invoking factory");
                self.invoke(&factory, None)
            }
        };
        // popped on failure too: a factory may recover from a nested error
        self.trail.pop();
        let value = produced?;

        self.registry.borrow_mut().memoize(name.clone(), value.clone());
        Ok(value)
    }

    /// Invokes `factory` with its parameters injected.
    ///
    /// A parameter present in `overrides` is taken verbatim; every other
    /// parameter is resolved. Nothing is memoized for the factory itself.
    pub fn invoke(&mut self, factory: &Factory, overrides: Option<&Overrides>) -> Result<AnyValue> {
        let params = factory.parameter_names().to_vec();

        let mut values = Vec::with_capacity(params.len());
        for param in &params {
            let overridden = overrides.and_then(|o| o.get(param.as_str())).cloned();
            let value = match overridden {
                Some(value) => value,
                None => self.resolve(param)?,
            };
            values.push(value);
        }

        let mut args = Args::new(params, values, self);
        factory.invoke(&mut args)
    }

    fn resolve_unregistered(&mut self, name: &DependencyName) -> Result<AnyValue> {
        let fallback = self.registry.borrow().fallback();
        if let Some(fallback) = fallback {
            debug!(name = %name, "Resolving through fallback");
            let value = fallback(name)?;
            self.registry.borrow_mut().memoize(name.clone(), value.clone());
            return Ok(value);
        }

        let known = self.registry.borrow().known_names();
        Err(WiringError::MissingDependency(MissingDependencyError {
            requested: name.clone(),
            required_by: self.trail.last().cloned(),
            suggestions: suggest_similar(name.as_str(), &known, self.max_suggestions),
        }))
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.trail.len()
    }
}

impl Resolver for Resolution<'_> {
    fn resolve_name(&mut self, name: &DependencyName) -> Result<AnyValue> {
        self.resolve(name)
    }
}
