//! Error types for lazywire container operations.
//!
//! Every failure is fatal to the call that raised it. The engine never
//! wraps errors coming out of user factories; only cycle errors carry
//! extra context (the resolution trail).

use std::fmt;

use lazywire_support::rendering::{render_chain, shorten_type_name};

use crate::name::DependencyName;

/// Main error type for all lazywire operations.
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// Tried to register the empty name.
    #[error("Dependency name must not be empty")]
    EmptyName,

    /// Name already has a producer (or an already resolved value).
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// `replace` on a name that was never registered.
    #[error("Dependency does not exist: {0}")]
    NotRegistered(DependencyName),

    /// `replace` on a name whose value was already produced.
    #[error("Could not replace resolved dependency: {0}")]
    AlreadyResolved(DependencyName),

    /// No producer and no fallback for the requested name.
    #[error("{}", .0)]
    MissingDependency(MissingDependencyError),

    /// The name is already being resolved further up the trail.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// The resolved value is not of the requested type.
    #[error("Type mismatch for {name}: expected {}", shorten_type_name(.expected))]
    TypeMismatch {
        name: DependencyName,
        expected: &'static str,
    },

    /// `call` on a dependency whose value is not a `Callable`.
    #[error("Dependency is not callable: {0}")]
    NotCallable(DependencyName),

    /// A factory asked for an argument it did not declare.
    #[error("Argument is not declared by the factory: {0}")]
    UndeclaredArgument(DependencyName),

    /// Positional argument lookup past the end of the argument list.
    #[error("Argument index {index} out of range ({len} given)")]
    ArgumentOutOfRange { index: usize, len: usize },

    /// A factory or fallback called back into the container that is
    /// running it. Nested names must be resolved through the factory's
    /// `Args`.
    #[error("Container re-entered for {operation} while {active} is in progress; resolve through the factory's Args instead")]
    Reentrant {
        operation: &'static str,
        active: &'static str,
    },

    /// Error raised by user code inside a factory, constructor or fallback.
    #[error("{0}")]
    Factory(Box<dyn std::error::Error + Send + Sync>),
}

impl WiringError {
    /// Boxes an arbitrary user error so it can leave a factory.
    pub fn factory(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Factory(error.into())
    }

    /// A plain missing-dependency error, for fallbacks that cannot
    /// produce the requested name.
    pub fn missing(name: impl Into<DependencyName>) -> Self {
        Self::MissingDependency(MissingDependencyError {
            requested: name.into(),
            required_by: None,
            suggestions: Vec::new(),
        })
    }

    /// Name this error is about, if it is about exactly one.
    pub fn name(&self) -> Option<&DependencyName> {
        match self {
            Self::AlreadyRegistered(e) => Some(&e.name),
            Self::NotRegistered(name)
            | Self::AlreadyResolved(name)
            | Self::NotCallable(name)
            | Self::UndeclaredArgument(name) => Some(name),
            Self::MissingDependency(e) => Some(&e.requested),
            Self::CircularDependency(e) => e.trail.last(),
            Self::TypeMismatch { name, .. } => Some(name),
            Self::EmptyName
            | Self::ArgumentOutOfRange { .. }
            | Self::Reentrant { .. }
            | Self::Factory(_) => None,
        }
    }
}

/// Error when a dependency has no producer.
///
/// Includes the dependent that asked for it and close spellings
/// of registered names.
#[derive(Debug)]
pub struct MissingDependencyError {
    /// The dependency that was requested
    pub requested: DependencyName,
    /// What required this dependency (if known)
    pub required_by: Option<DependencyName>,
    /// Registered names that look similar
    pub suggestions: Vec<String>,
}

impl fmt::Display for MissingDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency is missing: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when a circular dependency is detected.
///
/// `trail` holds every name on the active resolution path followed by
/// the name that closed the cycle, e.g. `a -> b -> c -> d -> b`.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub trail: Vec<DependencyName>,
}

impl CircularDependencyError {
    /// Names forming the loop itself, from the first repeated name onward.
    pub fn cycle(&self) -> &[DependencyName] {
        let Some(last) = self.trail.last() else {
            return &[];
        };
        let start = self.trail.iter().position(|n| n == last).unwrap_or(0);
        &self.trail[start..]
    }
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependencies: {}", render_chain(&self.trail))
    }
}

/// Error when trying to register a name that already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub name: DependencyName,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency already exists: {}", self.name)?;
        write!(
            f,
            "\n  Hint: Use .replace() to swap the producer before it is first resolved"
        )
    }
}

/// Convenient Result type for lazywire operations.
pub type Result<T> = std::result::Result<T, WiringError>;
