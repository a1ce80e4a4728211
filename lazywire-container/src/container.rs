//! # The Container: heart of lazywire
//!
//! Names are registered with a value or a [`Factory`]; a name is resolved on
//! first access, memoized, and shared by every later access. Factory
//! parameters are injected by name.
//!
//! # Architecture
//! ```text
//! ContainerBuilder ──build()──> Container ──get()/inject()/construct()──> Resolution
//!                                  │                                        │
//!                   ReentrantMutex<RefCell<Registry>> <── memoize / lookup ─┘
//! ```
//!
//! Every public operation takes the container lock for its whole duration:
//! a top-level resolution is atomic, and a factory runs exactly once even
//! when several threads ask for its name at the same time. Factories run
//! under that lock and resolve further names through their [`Args`].
//! Calling back into the running container from a factory or the fallback
//! is detected: read-only queries (`has`, `names`, `Debug`) answer normally,
//! while resolving or registering fails with [`WiringError::Reentrant`].
//!
//! [`Args`]: crate::producer::Args
//!
//! # Examples
//! ```rust
//! use lazywire_container::prelude::*;
//!
//! let container = Container::new();
//! container.set("d1", 40i32).unwrap();
//! container.set("d2", 2i32).unwrap();
//! container
//!     .set_factory(
//!         "d3",
//!         Factory::new(["d1", "d2"], |args| {
//!             Ok(*args.get::<i32>("d1")? + *args.get::<i32>("d2")?)
//!         }),
//!     )
//!     .unwrap();
//!
//! assert_eq!(*container.get::<i32>("d3").unwrap(), 42);
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, WiringError};
use crate::graph::{GraphValidator, Node};
use crate::inspect::{Injectable, construct_with, singleton_factory};
use crate::name::DependencyName;
use crate::producer::{AnyValue, Callable, Factory, Overrides, Producer, downcast, into_any};
use crate::provider::{Provider, ProviderRegistry};
use crate::registry::Registry;
use crate::resolution::Resolution;

// ============================================================
// Settings
// ============================================================

/// Tunables for a [`Container`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSettings {
    /// How many "did you mean?" names a missing-dependency error lists.
    pub max_suggestions: usize,
    /// Run [`Container::validate`] as part of [`ContainerBuilder::build`].
    pub validate_on_build: bool,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            max_suggestions: 3,
            validate_on_build: false,
        }
    }
}

// ============================================================
// ContainerBuilder
// ============================================================

/// Builds a [`Container`] with registered dependencies.
///
/// Registration errors do not interrupt the chain; `build()` reports the
/// first one.
///
/// # Examples
/// ```rust,ignore
/// let container = Container::builder()
///     .value("config", Config::load())
///     .factory("database", Factory::new(["config"], |args| { ... }))
///     .validate_on_build(true)
///     .build()?;
/// ```
pub struct ContainerBuilder {
    registry: Registry,
    settings: ContainerSettings,
    errors: Vec<WiringError>,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            settings: ContainerSettings::default(),
            errors: Vec::new(),
        }
    }

    /// Replace all settings at once.
    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn max_suggestions(mut self, max: usize) -> Self {
        self.settings.max_suggestions = max;
        self
    }

    /// Validate the declared graph before handing out the container.
    pub fn validate_on_build(mut self, validate: bool) -> Self {
        self.settings.validate_on_build = validate;
        self
    }

    /// Register a plain value.
    pub fn value<T: Any + Send + Sync>(self, name: impl Into<DependencyName>, value: T) -> Self {
        self.producer(name, Producer::value(value))
    }

    /// Register a factory, invoked on first resolve.
    pub fn factory(self, name: impl Into<DependencyName>, factory: Factory) -> Self {
        self.producer(name, factory)
    }

    /// Register any producer.
    pub fn producer(mut self, name: impl Into<DependencyName>, producer: impl Into<Producer>) -> Self {
        self.register_internal(name.into(), producer.into());
        self
    }

    /// Install the fallback resolver.
    pub fn fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn(&DependencyName) -> Result<AnyValue> + Send + Sync + 'static,
    {
        self.registry.set_fallback(Arc::new(fallback));
        self
    }

    /// Add a [`Provider`] module.
    pub fn add_provider(mut self, provider: &dyn Provider) -> Self {
        debug!(provider = provider.name(), "Adding provider");
        provider.register(&mut self);
        self
    }

    /// Build the container.
    ///
    /// # Errors
    /// The first registration error, then (with `validate_on_build`) any
    /// graph error.
    #[instrument(skip(self), name = "container_build")]
    pub fn build(mut self) -> Result<Container> {
        info!(registered = self.registry.len(), "Building container");

        if !self.errors.is_empty() {
            warn!(errors = self.errors.len(), "Registration failed");
            return Err(self.errors.remove(0));
        }

        let container = Container {
            state: ReentrantMutex::new(State::new(self.registry)),
            settings: self.settings,
        };

        if container.settings.validate_on_build {
            container.validate()?;
        }

        info!("Container built successfully");
        Ok(container)
    }

    fn register_internal(&mut self, name: DependencyName, producer: Producer) {
        if let Err(err) = self.registry.register(name, producer) {
            self.errors.push(err);
        }
    }
}

impl ProviderRegistry for ContainerBuilder {
    fn register_producer(&mut self, name: DependencyName, producer: Producer) {
        self.register_internal(name, producer);
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registered", &self.registry.len())
            .field("errors", &self.errors.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Registry plus the name of the resolving operation in progress, if any.
///
/// Only ever touched under the container's lock, so the cells are never
/// shared between threads.
struct State {
    registry: RefCell<Registry>,
    active: Cell<Option<&'static str>>,
}

impl State {
    fn new(registry: Registry) -> Self {
        Self {
            registry: RefCell::new(registry),
            active: Cell::new(None),
        }
    }
}

/// Clears the active operation, also when a factory panics.
struct ActiveGuard<'a>(&'a Cell<Option<&'static str>>);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.set(None);
    }
}

/// Lazy, memoizing dependency container keyed by name.
pub struct Container {
    state: ReentrantMutex<State>,
    settings: ContainerSettings,
}

impl Container {
    /// An empty container with default settings.
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            state: ReentrantMutex::new(State::new(Registry::new())),
            settings,
        }
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub fn settings(&self) -> &ContainerSettings {
        &self.settings
    }

    /// Runs `op` as the only resolving or registering operation.
    ///
    /// The lock is re-entrant, so a factory calling back into this container
    /// on the same thread gets here instead of deadlocking; it is turned
    /// away with [`WiringError::Reentrant`].
    fn exclusive<R>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&RefCell<Registry>) -> Result<R>,
    ) -> Result<R> {
        let state = self.state.lock();
        if let Some(active) = state.active.get() {
            warn!(operation, active, "Container re-entered from a factory");
            return Err(WiringError::Reentrant { operation, active });
        }

        state.active.set(Some(operation));
        let _guard = ActiveGuard(&state.active);
        op(&state.registry)
    }

    /// Runs a read-only query. Allowed from inside a factory: the registry
    /// is never borrowed mutably while user code runs.
    fn inspect<R>(&self, query: impl FnOnce(&Registry) -> R) -> R {
        let state = self.state.lock();
        let registry = state.registry.borrow();
        query(&registry)
    }

    // ── Registration ──

    /// Register a producer under a fresh name.
    ///
    /// # Errors
    /// [`WiringError::EmptyName`], or [`WiringError::AlreadyRegistered`] if
    /// the name is taken (registered or already resolved).
    pub fn register(&self, name: impl Into<DependencyName>, producer: impl Into<Producer>) -> Result<()> {
        let (name, producer) = (name.into(), producer.into());
        self.exclusive("register", |registry| registry.borrow_mut().register(name, producer))
    }

    /// Register a value. A [`Factory`] or [`Producer`] passed here is
    /// registered as such, see [`Producer::value`].
    pub fn set<T: Any + Send + Sync>(&self, name: impl Into<DependencyName>, value: T) -> Result<()> {
        self.register(name, Producer::value(value))
    }

    /// Register a factory.
    pub fn set_factory(&self, name: impl Into<DependencyName>, factory: Factory) -> Result<()> {
        self.register(name, factory)
    }

    /// Swap the producer of a name that has not been resolved yet.
    ///
    /// # Errors
    /// [`WiringError::NotRegistered`] or [`WiringError::AlreadyResolved`].
    pub fn replace(&self, name: impl Into<DependencyName>, producer: impl Into<Producer>) -> Result<()> {
        let (name, producer) = (name.into(), producer.into());
        self.exclusive("replace", |registry| registry.borrow_mut().replace(name, producer))
    }

    /// Install the resolver asked for names without a producer. A second
    /// call replaces the first.
    pub fn set_fallback<F>(&self, fallback: F)
    where
        F: Fn(&DependencyName) -> Result<AnyValue> + Send + Sync + 'static,
    {
        let state = self.state.lock();
        state.registry.borrow_mut().set_fallback(Arc::new(fallback));
    }

    // ── Introspection ──

    /// True iff a producer was registered under `name`.
    pub fn has(&self, name: &str) -> bool {
        self.inspect(|registry| registry.exists(name))
    }

    /// True once `name` has a memoized value.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.inspect(|registry| registry.is_resolved(name))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<DependencyName> {
        self.inspect(|registry| {
            let mut names: Vec<_> = registry.producers().keys().cloned().collect();
            names.sort();
            names
        })
    }

    /// Returns the number of registered dependencies.
    pub fn len(&self) -> usize {
        self.inspect(Registry::len)
    }

    /// Returns true if no dependencies are registered.
    pub fn is_empty(&self) -> bool {
        self.inspect(Registry::is_empty)
    }

    // ── Resolution ──

    /// Resolve a name to its shared, type-erased value.
    pub fn resolve(&self, name: &str) -> Result<AnyValue> {
        trace!(name, "Resolving");
        let name = DependencyName::from(name);
        let max_suggestions = self.settings.max_suggestions;
        self.exclusive("resolve", |registry| {
            Resolution::new(registry, max_suggestions).resolve(&name)
        })
    }

    /// Resolve a name and downcast it.
    ///
    /// ```rust,ignore
    /// let db: Arc<Database> = container.get("database")?;
    /// ```
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.resolve(name)?;
        downcast(&DependencyName::from(name), value)
    }

    /// Invoke `factory` once with injected parameters.
    ///
    /// Parameters found in `overrides` are used verbatim; the rest are
    /// resolved (and memoized) as usual. The result itself is not stored.
    pub fn inject_any(&self, factory: &Factory, overrides: &Overrides) -> Result<AnyValue> {
        debug!(factory = ?factory, overrides = overrides.len(), "Injecting");
        let max_suggestions = self.settings.max_suggestions;
        self.exclusive("inject", |registry| {
            Resolution::new(registry, max_suggestions).invoke(factory, Some(overrides))
        })
    }

    /// Typed variant of [`Container::inject_any`].
    pub fn inject<T: Any + Send + Sync>(&self, factory: &Factory, overrides: &Overrides) -> Result<Arc<T>> {
        let value = self.inject_any(factory, overrides)?;
        downcast(&DependencyName::from("<inject>"), value)
    }

    /// Build a fresh `T`, resolving its declared constructor parameters.
    pub fn construct<T: Injectable>(&self) -> Result<T> {
        debug!(ty = std::any::type_name::<T>(), "Constructing");
        let max_suggestions = self.settings.max_suggestions;
        self.exclusive("construct", |registry| {
            construct_with::<T>(&mut Resolution::new(registry, max_suggestions))
        })
    }

    /// Factory that constructs `T` on first resolve of the name it is
    /// registered under.
    pub fn singleton_factory<T: Injectable>(&self) -> Factory {
        singleton_factory::<T>()
    }

    /// Resolve `name` to a [`Callable`] and invoke it with caller-supplied
    /// positional arguments (not injected ones).
    ///
    /// The callable runs after the lock is released, so it may use the
    /// container freely.
    pub fn call_any(&self, name: &str, args: &[AnyValue]) -> Result<AnyValue> {
        let value = self.resolve(name)?;
        let callable = value
            .downcast_ref::<Callable>()
            .cloned()
            .ok_or_else(|| WiringError::NotCallable(name.into()))?;

        trace!(name, args = args.len(), "Calling dependency");
        callable.invoke(args)
    }

    /// Typed variant of [`Container::call_any`].
    pub fn call<R: Any + Send + Sync>(&self, name: &str, args: &[AnyValue]) -> Result<Arc<R>> {
        let value = self.call_any(name, args)?;
        downcast(&DependencyName::from(name), value)
    }

    /// Check the declared graph for cycles and missing names without
    /// invoking anything.
    #[instrument(skip(self), name = "container_validate")]
    pub fn validate(&self) -> Result<()> {
        let max_suggestions = self.settings.max_suggestions;
        self.inspect(|registry| {
            let mut nodes: HashMap<DependencyName, Node> = registry
                .producers()
                .iter()
                .map(|(name, producer)| {
                    let node = if registry.is_resolved(name.as_str()) {
                        Node::Resolved
                    } else {
                        Node::Pending(producer.dependencies().to_vec())
                    };
                    (name.clone(), node)
                })
                .collect();
            for name in registry.known_names() {
                nodes.entry(name).or_insert(Node::Resolved);
            }

            GraphValidator::new(nodes)
                .tolerate_missing(registry.has_fallback())
                .max_suggestions(max_suggestions)
                .validate()
        })
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (registered, fallback) = self.inspect(|registry| (registry.len(), registry.has_fallback()));
        f.debug_struct("Container")
            .field("registered", &registered)
            .field("fallback", &fallback)
            .finish()
    }
}

/// Wrap a value as a positional argument for [`Container::call`].
pub fn arg<T: Any + Send + Sync>(value: T) -> AnyValue {
    into_any(value)
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder, ContainerSettings, arg};
    pub use crate::error::{Result, WiringError};
    pub use crate::inspect::{Injectable, NameInspector, singleton_factory};
    pub use crate::name::DependencyName;
    pub use crate::producer::{AnyValue, Args, CallArgs, Callable, Factory, Overrides, Producer, into_any};
    pub use crate::provider::{Provider, ProviderRegistry};
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
