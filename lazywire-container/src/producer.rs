//! Producers: what a name is registered with.
//!
//! A [`Producer`] is either a ready value or a [`Factory`] that declares
//! the names of its parameters. Factories receive their injected values
//! through [`Args`], which also lets them resolve further names through
//! the resolution that invoked them.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, WiringError};
use crate::inspect::{Injectable, NameInspector, construct_with};
use crate::name::{DependencyName, names};

/// A type-erased, shared resolved value.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

/// Type-erases a value.
///
/// ```
/// use lazywire_container::producer::into_any;
///
/// let value = into_any(42i32);
/// assert_eq!(value.downcast_ref::<i32>(), Some(&42));
/// ```
#[inline]
pub fn into_any<T: Any + Send + Sync>(value: T) -> AnyValue {
    Arc::new(value)
}

/// Downcasts a resolved value, reporting `name` on mismatch.
pub fn downcast<T: Any + Send + Sync>(name: &DependencyName, value: AnyValue) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| WiringError::TypeMismatch {
        name: name.clone(),
        expected: type_name::<T>(),
    })
}

/// Body of a factory: builds a value from its injected arguments.
pub type FactoryFn = Arc<dyn Fn(&mut Args<'_>) -> Result<AnyValue> + Send + Sync>;

/// Resolves names on behalf of a running factory.
///
/// Implemented by the engine's per-call resolution; the trail of the
/// outer call is carried along, so cycles through a factory body are
/// caught like any other.
pub trait Resolver {
    fn resolve_name(&mut self, name: &DependencyName) -> Result<AnyValue>;
}

/// A producer function with an explicit, ordered parameter list.
///
/// # Examples
/// ```
/// use lazywire_container::inspect::NameInspector;
/// use lazywire_container::producer::Factory;
///
/// let sum = Factory::new(["d1", "d2"], |args| {
///     let d1 = args.get::<i32>("d1")?;
///     let d2 = args.get::<i32>("d2")?;
///     Ok(*d1 + *d2)
/// });
/// assert_eq!(sum.parameter_names().len(), 2);
/// ```
#[derive(Clone)]
pub struct Factory {
    params: Vec<DependencyName>,
    body: FactoryFn,
}

impl Factory {
    /// Creates a factory whose result is stored as `T`.
    pub fn new<I, S, T, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        T: Any + Send + Sync,
        F: Fn(&mut Args<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self::raw(params, move |args| body(args).map(into_any))
    }

    /// Creates a factory returning an already type-erased value.
    ///
    /// Useful for pass-through factories that hand back one of their
    /// arguments unchanged.
    pub fn raw<I, S, F>(params: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: Fn(&mut Args<'_>) -> Result<AnyValue> + Send + Sync + 'static,
    {
        Self {
            params: names(params),
            body: Arc::new(body),
        }
    }

    /// Factory without parameters.
    pub fn lazy<T, F>(body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> Result<T> + Send + Sync + 'static,
    {
        Self::new(std::iter::empty::<&str>(), move |_| body())
    }

    /// Factory without declared parameters that wires itself through
    /// [`Args::resolve`] or [`Args::construct`].
    pub fn lazy_with<T, F>(body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&mut Args<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self::new(std::iter::empty::<&str>(), body)
    }

    pub(crate) fn invoke(&self, args: &mut Args<'_>) -> Result<AnyValue> {
        (self.body)(args)
    }
}

impl NameInspector for Factory {
    fn parameter_names(&self) -> &[DependencyName] {
        &self.params
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory").field("params", &self.params).finish()
    }
}

/// What a name is registered with.
#[derive(Clone)]
pub enum Producer {
    /// Used verbatim as the resolved value.
    Value(AnyValue),
    /// Invoked once, with injected parameters, on first resolve.
    Factory(Factory),
}

impl Producer {
    /// Wraps a value.
    ///
    /// A [`Factory`] or a ready [`Producer`] is kept as what it is, so
    /// `set(name, factory)` registers a factory rather than an opaque value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        let any: &dyn Any = &value;
        if let Some(factory) = any.downcast_ref::<Factory>() {
            return Self::Factory(factory.clone());
        }
        if let Some(producer) = any.downcast_ref::<Producer>() {
            return producer.clone();
        }
        Self::Value(into_any(value))
    }

    /// Declared parameters; empty for plain values.
    pub fn dependencies(&self) -> &[DependencyName] {
        match self {
            Self::Value(_) => &[],
            Self::Factory(factory) => factory.parameter_names(),
        }
    }

    #[inline]
    pub fn is_factory(&self) -> bool {
        matches!(self, Self::Factory(_))
    }
}

impl From<Factory> for Producer {
    fn from(factory: Factory) -> Self {
        Self::Factory(factory)
    }
}

impl From<AnyValue> for Producer {
    fn from(value: AnyValue) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(_) => f.write_str("Producer::Value(..)"),
            Self::Factory(factory) => write!(f, "Producer::{factory:?}"),
        }
    }
}

/// Arguments handed to a running factory or constructor.
///
/// Values are stored in declaration order and can be read by name or by
/// position.
pub struct Args<'r> {
    names: Vec<DependencyName>,
    values: Vec<AnyValue>,
    resolver: &'r mut dyn Resolver,
}

impl<'r> Args<'r> {
    pub(crate) fn new(
        names: Vec<DependencyName>,
        values: Vec<AnyValue>,
        resolver: &'r mut dyn Resolver,
    ) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values, resolver }
    }

    /// Number of declared parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared parameter names, in order.
    pub fn names(&self) -> &[DependencyName] {
        &self.names
    }

    /// Type-erased value of a declared parameter.
    pub fn value(&self, name: &str) -> Result<AnyValue> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| self.values[index].clone())
            .ok_or_else(|| WiringError::UndeclaredArgument(name.into()))
    }

    /// Typed value of a declared parameter.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.value(name)?;
        downcast(&DependencyName::from(name), value)
    }

    /// Typed value by position.
    pub fn at<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.values.get(index).cloned().ok_or(WiringError::ArgumentOutOfRange {
            index,
            len: self.values.len(),
        })?;
        downcast(&self.names[index], value)
    }

    /// Resolves a name that was not declared as a parameter.
    ///
    /// Goes through the same resolution as the declared parameters, so it
    /// is memoized and cycle-checked.
    pub fn resolve<T: Any + Send + Sync>(&mut self, name: &str) -> Result<Arc<T>> {
        let name = DependencyName::from(name);
        let value = self.resolver.resolve_name(&name)?;
        downcast(&name, value)
    }

    /// Type-erased variant of [`Args::resolve`].
    pub fn resolve_any(&mut self, name: &str) -> Result<AnyValue> {
        self.resolver.resolve_name(&DependencyName::from(name))
    }

    /// Constructs `T`, injecting its declared dependencies.
    pub fn construct<T: Injectable>(&mut self) -> Result<T> {
        construct_with::<T>(&mut *self.resolver)
    }
}

impl fmt::Debug for Args<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args").field("names", &self.names).finish()
    }
}

/// Call-scoped values that take precedence over the registry in
/// [`inject`](crate::container::Container::inject).
///
/// Overrides are used verbatim: never resolved, never memoized.
#[derive(Clone, Default)]
pub struct Overrides {
    values: HashMap<DependencyName, AnyValue>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a typed override.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<DependencyName>, value: T) -> Self {
        self.values.insert(name.into(), into_any(value));
        self
    }

    /// Adds an already type-erased override.
    pub fn insert(&mut self, name: impl Into<DependencyName>, value: AnyValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&AnyValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(DependencyName::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Overrides").field("names", &keys).finish()
    }
}

/// A dependency value that can be invoked with caller-supplied
/// positional arguments.
///
/// ```
/// use lazywire_container::producer::{Callable, into_any};
///
/// let double = Callable::new(|args| Ok(*args.get::<i32>(0)? * 2));
/// let result = double.invoke(&[into_any(21i32)]).unwrap();
/// assert_eq!(result.downcast_ref::<i32>(), Some(&42));
/// ```
#[derive(Clone)]
pub struct Callable {
    body: Arc<dyn Fn(CallArgs<'_>) -> Result<AnyValue> + Send + Sync>,
}

impl Callable {
    pub fn new<T, F>(body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(CallArgs<'_>) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(move |args| body(args).map(into_any)),
        }
    }

    pub fn invoke(&self, args: &[AnyValue]) -> Result<AnyValue> {
        (self.body)(CallArgs { values: args })
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable(..)")
    }
}

/// Positional arguments of a [`Callable`] invocation.
#[derive(Clone, Copy)]
pub struct CallArgs<'a> {
    values: &'a [AnyValue],
}

impl CallArgs<'_> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let value = self.values.get(index).cloned().ok_or(WiringError::ArgumentOutOfRange {
            index,
            len: self.values.len(),
        })?;
        downcast(&DependencyName::from(format!("#{index}")), value)
    }
}
