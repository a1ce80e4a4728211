//! Parameter-name inspection.
//!
//! The engine never guesses what a producer needs: every factory and every
//! injectable type states its parameter names up front, in order. The
//! [`NameInspector`] trait is the seam the engine reads them through.

use std::fmt;
use std::marker::PhantomData;

use crate::error::Result;
use crate::name::{DependencyName, names};
use crate::producer::{Args, Factory, Resolver};

/// Reports the ordered parameter names of something invocable.
pub trait NameInspector {
    fn parameter_names(&self) -> &[DependencyName];
}

/// A type that can be built with injected dependencies.
///
/// # Examples
/// ```
/// use lazywire_container::inspect::Injectable;
/// use lazywire_container::producer::Args;
/// use lazywire_container::error::Result;
///
/// struct Sum {
///     d1: i32,
///     d2: i32,
/// }
///
/// impl Injectable for Sum {
///     const DEPENDENCIES: &'static [&'static str] = &["d1", "d2"];
///
///     fn construct(args: &mut Args<'_>) -> Result<Self> {
///         Ok(Sum {
///             d1: *args.get::<i32>("d1")?,
///             d2: *args.get::<i32>("d2")?,
///         })
///     }
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters, in order. Empty when the type needs nothing.
    const DEPENDENCIES: &'static [&'static str] = &[];

    fn construct(args: &mut Args<'_>) -> Result<Self>;
}

/// Constructor signature of an [`Injectable`] type.
pub struct Constructor<T> {
    params: Vec<DependencyName>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> Constructor<T> {
    pub fn of() -> Self {
        Self {
            params: names(T::DEPENDENCIES),
            _marker: PhantomData,
        }
    }
}

impl<T> NameInspector for Constructor<T> {
    fn parameter_names(&self) -> &[DependencyName] {
        &self.params
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("type", &std::any::type_name::<T>())
            .field("params", &self.params)
            .finish()
    }
}

/// Constructs `T`, resolving each constructor parameter through `resolver`.
pub(crate) fn construct_with<T: Injectable>(resolver: &mut dyn Resolver) -> Result<T> {
    let constructor = Constructor::<T>::of();
    let params = constructor.parameter_names().to_vec();

    let mut values = Vec::with_capacity(params.len());
    for name in &params {
        values.push(resolver.resolve_name(name)?);
    }

    let mut args = Args::new(params, values, resolver);
    T::construct(&mut args)
}

/// A zero-parameter factory that constructs `T` when invoked.
///
/// Registered under a name, the type is built lazily and exactly once,
/// on the first resolve of that name.
pub fn singleton_factory<T: Injectable>() -> Factory {
    Factory::lazy_with(|args| args.construct::<T>())
}
