//! Dependency registry: producers, memoized values and the fallback.
//!
//! The registry owns two maps keyed by [`DependencyName`]:
//! `unresolved` (every producer ever registered, kept after resolution for
//! existence checks) and `resolved` (values produced so far). It enforces
//! the registration rules; resolution itself lives in
//! [`resolution`](crate::resolution).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{AlreadyRegisteredError, Result, WiringError};
use crate::name::DependencyName;
use crate::producer::{AnyValue, Producer};

/// Resolver consulted for names that have no producer.
///
/// Must return an error (typically [`WiringError::missing`]) for names it
/// cannot produce.
pub type FallbackFn = Arc<dyn Fn(&DependencyName) -> Result<AnyValue> + Send + Sync>;

#[derive(Default)]
pub(crate) struct Registry {
    unresolved: HashMap<DependencyName, Producer>,
    resolved: HashMap<DependencyName, AnyValue>,
    fallback: Option<FallbackFn>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a producer under a fresh name.
    ///
    /// # Errors
    /// - [`WiringError::EmptyName`] for `""`
    /// - [`WiringError::AlreadyRegistered`] if the name has a producer or a
    ///   resolved value already
    pub fn register(&mut self, name: DependencyName, producer: Producer) -> Result<()> {
        if name.is_empty() {
            return Err(WiringError::EmptyName);
        }
        if self.unresolved.contains_key(&name) || self.resolved.contains_key(&name) {
            return Err(WiringError::AlreadyRegistered(AlreadyRegisteredError { name }));
        }

        debug!(name = %name, factory = producer.is_factory(), "Registered dependency");
        self.unresolved.insert(name, producer);
        Ok(())
    }

    /// Swaps the producer of a registered, not yet resolved name.
    pub fn replace(&mut self, name: DependencyName, producer: Producer) -> Result<()> {
        if !self.unresolved.contains_key(&name) {
            return Err(WiringError::NotRegistered(name));
        }
        if self.resolved.contains_key(&name) {
            return Err(WiringError::AlreadyResolved(name));
        }

        debug!(name = %name, factory = producer.is_factory(), "Replaced dependency");
        self.unresolved.insert(name, producer);
        Ok(())
    }

    /// True iff a producer was registered under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.unresolved.contains_key(name)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    /// Installs the fallback, replacing any previous one.
    pub fn set_fallback(&mut self, fallback: FallbackFn) {
        if self.fallback.is_some() {
            debug!("Replacing fallback resolver");
        } else {
            debug!("Installed fallback resolver");
        }
        self.fallback = Some(fallback);
    }

    pub fn fallback(&self) -> Option<FallbackFn> {
        self.fallback.clone()
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn producer(&self, name: &str) -> Option<&Producer> {
        self.unresolved.get(name)
    }

    pub fn resolved(&self, name: &str) -> Option<AnyValue> {
        self.resolved.get(name).cloned()
    }

    /// Stores a produced value. A name is memoized at most once.
    pub fn memoize(&mut self, name: DependencyName, value: AnyValue) {
        trace!(name = %name, "Memoized dependency");
        debug_assert!(!self.resolved.contains_key(&name));
        self.resolved.insert(name, value);
    }

    /// All producers, for graph validation.
    pub fn producers(&self) -> &HashMap<DependencyName, Producer> {
        &self.unresolved
    }

    /// Returns the number of registered producers.
    pub fn len(&self) -> usize {
        self.unresolved.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Every known name, sorted: registered ones plus those memoized
    /// through the fallback.
    pub fn known_names(&self) -> Vec<DependencyName> {
        let mut names: Vec<_> = self.unresolved.keys().cloned().collect();
        names.extend(
            self.resolved
                .keys()
                .filter(|name| !self.unresolved.contains_key(*name))
                .cloned(),
        );
        names.sort();
        names
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("registered", &self.unresolved.len())
            .field("resolved", &self.resolved.len())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}
