//! Core container implementation for lazywire.

pub mod container;
pub mod error;
mod graph;
pub mod inspect;
pub mod name;
pub mod producer;
pub mod provider;
pub mod registry;
mod resolution;

pub use container::{Container, ContainerBuilder, ContainerSettings, prelude};
pub use error::{Result, WiringError};
pub use inspect::{Injectable, singleton_factory};
pub use name::DependencyName;
pub use producer::{AnyValue, Callable, Factory, Overrides, Producer};
