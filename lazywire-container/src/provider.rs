//! Provider trait: a module of related registrations.
//!
//! Providers group the names one part of an application contributes, so
//! they can be registered (and tested) as a unit.
//!
//! # Examples
//! ```rust
//! use lazywire_container::prelude::*;
//!
//! struct MailProvider;
//!
//! impl Provider for MailProvider {
//!     fn register(&self, registry: &mut dyn ProviderRegistry) {
//!         registry.register_producer("smtp_host".into(), Producer::value(String::from("localhost")));
//!         registry.register_producer(
//!             "mailer".into(),
//!             Factory::new(["smtp_host"], |args| {
//!                 Ok(format!("mailer via {}", args.get::<String>("smtp_host")?))
//!             })
//!             .into(),
//!         );
//!     }
//! }
//!
//! let container = Container::builder().add_provider(&MailProvider).build().unwrap();
//! let mailer = container.get::<String>("mailer").unwrap();
//! assert_eq!(mailer.as_str(), "mailer via localhost");
//! ```

use crate::name::DependencyName;
use crate::producer::Producer;

/// A module that registers related dependencies.
pub trait Provider: Send + Sync {
    /// Register dependencies. Called once, when the provider is added.
    fn register(&self, registry: &mut dyn ProviderRegistry);

    /// Optional: human-readable name for logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Interface that providers register through.
///
/// Registration errors are collected by the implementor (the
/// [`ContainerBuilder`](crate::container::ContainerBuilder) reports the
/// first one from `build()`), so providers stay infallible.
pub trait ProviderRegistry {
    fn register_producer(&mut self, name: DependencyName, producer: Producer);
}
