//! # lazywire: lazy, name-keyed dependency container
//!
//! Register names with values or factories; each name is produced on first
//! access, memoized, and injected into every factory that declares it as a
//! parameter.

pub use lazywire_container::*;
pub use lazywire_support::*;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    struct D3 {
        d1: i32,
        d2: i32,
    }

    impl D3 {
        fn sum(&self) -> i32 {
            self.d1 + self.d2
        }
    }

    impl Injectable for D3 {
        const DEPENDENCIES: &'static [&'static str] = &["d1", "d2"];

        fn construct(args: &mut Args<'_>) -> Result<Self> {
            Ok(D3 {
                d1: *args.get::<i32>("d1")?,
                d2: *args.get::<i32>("d2")?,
            })
        }
    }

    struct D4;

    impl Injectable for D4 {
        fn construct(_: &mut Args<'_>) -> Result<Self> {
            Ok(D4)
        }
    }

    fn passthrough(param: &'static str) -> Factory {
        Factory::raw([param], move |args| args.value(param))
    }

    fn with_d1_d2() -> Container {
        let container = Container::new();
        container.set("d1", 40i32).unwrap();
        container.set("d2", 2i32).unwrap();
        container
    }

    #[test]
    fn set_deps_can_be_read_back() {
        let container = Container::new();
        container.set("d1", 42i32).unwrap();
        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
    }

    #[test]
    fn deps_can_be_factories() {
        let container = Container::new();
        container.set_factory("d1", Factory::lazy(|| Ok(42i32))).unwrap();
        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
    }

    #[test]
    fn deps_can_be_wired_inside_the_factory_body() {
        let container = Container::new();
        container.set("d1", 42i32).unwrap();
        container
            .set_factory("d2", Factory::raw(std::iter::empty::<&str>(), |args| args.resolve_any("d1")))
            .unwrap();

        assert_eq!(*container.get::<i32>("d2").unwrap(), 42);
    }

    #[test]
    fn set_accepts_factories_too() {
        let container = Container::new();
        container.set("d1", Factory::lazy(|| Ok(42i32))).unwrap();
        container.set("d2", passthrough("d1")).unwrap();

        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
        assert_eq!(*container.get::<i32>("d2").unwrap(), 42);

        let built = Container::builder()
            .value("d3", Factory::lazy(|| Ok(String::from("lazy"))))
            .build()
            .unwrap();
        assert!(!built.is_resolved("d3"));
        assert_eq!(built.get::<String>("d3").unwrap().as_str(), "lazy");
    }

    #[test]
    fn factory_calling_back_into_the_container_fails_instead_of_blocking() {
        let container = Arc::new(Container::new());
        container.set("d1", 42i32).unwrap();
        let inner = Arc::downgrade(&container);
        container
            .set_factory(
                "d2",
                Factory::lazy(move || match inner.upgrade() {
                    Some(outer) => outer.get::<i32>("d1").map(|v| *v),
                    None => Err(WiringError::missing("container")),
                }),
            )
            .unwrap();

        match container.get::<i32>("d2") {
            Err(WiringError::Reentrant { operation, active }) => {
                assert_eq!(operation, "resolve");
                assert_eq!(active, "resolve");
            }
            other => panic!("Expected Reentrant, got: {other:?}"),
        }

        // the container is still usable afterwards
        assert!(!container.is_resolved("d2"));
        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
        container.set("d3", 3i32).unwrap();
    }

    #[test]
    fn factory_may_query_the_container_while_running() {
        let container = Arc::new(Container::new());
        container.set("d1", 1i32).unwrap();
        let inner = Arc::downgrade(&container);
        container
            .set_factory(
                "report",
                Factory::lazy(move || {
                    let outer = inner.upgrade().ok_or_else(|| WiringError::missing("container"))?;
                    Ok(format!("{} {} {:?}", outer.has("d1"), outer.len(), outer))
                }),
            )
            .unwrap();

        let report = container.get::<String>("report").unwrap();
        assert!(report.starts_with("true 2 Container"));
    }

    #[test]
    fn fallback_registering_from_inside_is_rejected() {
        let container = Arc::new(Container::new());
        let inner = Arc::downgrade(&container);
        container.set_fallback(move |name| {
            let outer = inner.upgrade().ok_or_else(|| WiringError::missing(name))?;
            outer.set(name, 1i32)?;
            Ok(into_any(1i32))
        });

        assert!(matches!(
            container.resolve("anything"),
            Err(WiringError::Reentrant { operation: "register", .. })
        ));
        assert!(!container.has("anything"));
    }

    #[test]
    fn factory_parameters_are_injected_by_name() {
        let container = Container::new();
        container.set("d1", 42i32).unwrap();
        container.set_factory("d2", passthrough("d1")).unwrap();

        assert_eq!(*container.get::<i32>("d2").unwrap(), 42);
    }

    #[test]
    fn injected_parameters_are_combined() {
        let container = with_d1_d2();
        container
            .set_factory(
                "d3",
                Factory::new(["d1", "d2"], |args| {
                    Ok(*args.get::<i32>("d1")? + *args.get::<i32>("d2")?)
                }),
            )
            .unwrap();

        assert_eq!(*container.get::<i32>("d3").unwrap(), 42);
    }

    #[test]
    fn instantiation_by_hand_inside_a_factory() {
        let container = with_d1_d2();
        container
            .set_factory(
                "d3",
                Factory::lazy_with(|args| {
                    Ok(D3 {
                        d1: *args.resolve::<i32>("d1")?,
                        d2: *args.resolve::<i32>("d2")?,
                    })
                }),
            )
            .unwrap();

        assert_eq!(container.get::<D3>("d3").unwrap().sum(), 42);
    }

    #[test]
    fn constructor_injection_inside_a_factory() {
        let container = with_d1_d2();
        container
            .set_factory("d3", Factory::lazy_with(|args| args.construct::<D3>()))
            .unwrap();

        assert_eq!(container.get::<D3>("d3").unwrap().sum(), 42);
    }

    #[test]
    fn singleton_factory_short_form() {
        let container = with_d1_d2();
        container.set_factory("d3", container.singleton_factory::<D3>()).unwrap();

        assert_eq!(container.get::<D3>("d3").unwrap().sum(), 42);
    }

    #[test]
    fn singleton_factory_resolves_repeatedly_without_cycle() {
        let container = with_d1_d2();
        container.set_factory("d3", singleton_factory::<D3>()).unwrap();

        let first = container.get::<D3>("d3").unwrap();
        let second = container.get::<D3>("d3").unwrap();
        let third = container.get::<D3>("d3").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
    }

    #[test]
    fn construct_type_without_dependencies() {
        let container = Container::new();
        container.set_factory("d4", Factory::lazy_with(|args| args.construct::<D4>())).unwrap();

        assert!(container.get::<D4>("d4").is_ok());
        assert!(container.construct::<D4>().is_ok());
    }

    #[test]
    fn construct_directly_builds_fresh_instances() {
        let container = with_d1_d2();

        let a = container.construct::<D3>().unwrap();
        let b = container.construct::<D3>().unwrap();
        assert_eq!(a.sum(), 42);
        assert_eq!(b.sum(), 42);
        assert!(!container.has("d3"));
    }

    #[test]
    fn construct_reports_missing_constructor_parameter() {
        let container = Container::new();
        container.set("d1", 40i32).unwrap();

        match container.construct::<D3>() {
            Err(WiringError::MissingDependency(err)) => assert_eq!(err.requested, "d2"),
            Err(other) => panic!("Expected MissingDependency, got: {other:?}"),
            Ok(_) => panic!("Expected MissingDependency, got an instance"),
        }
    }

    #[test]
    fn factories_are_called_only_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        container
            .set_factory(
                "d1",
                Factory::lazy({
                    let calls = calls.clone();
                    move || {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(42i32)
                    }
                }),
            )
            .unwrap();

        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factories_are_called_lazily() {
        let called = Arc::new(AtomicBool::new(false));
        let container = Container::new();
        container
            .set_factory(
                "d1",
                Factory::lazy({
                    let called = called.clone();
                    move || {
                        called.store(true, Ordering::SeqCst);
                        Ok(42i32)
                    }
                }),
            )
            .unwrap();

        assert!(!called.load(Ordering::SeqCst));
        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn shared_mutable_state_goes_through_an_explicit_cell() {
        let container = Container::new();
        container.set("counter", parking_lot::Mutex::new(21i32)).unwrap();

        *container.get::<parking_lot::Mutex<i32>>("counter").unwrap().lock() += 21;

        assert_eq!(*container.get::<parking_lot::Mutex<i32>>("counter").unwrap().lock(), 42);
    }

    #[test]
    fn circular_dependencies_are_reported_with_their_path() {
        let container = Container::new();
        container.set_factory("a", passthrough("b")).unwrap();
        container.set_factory("b", passthrough("c")).unwrap();
        container.set_factory("c", passthrough("d")).unwrap();
        container.set_factory("d", passthrough("b")).unwrap();

        let err = container.resolve("a").unwrap_err();
        assert_eq!(err.to_string(), "Circular dependencies: a -> b -> c -> d -> b");
        match err {
            WiringError::CircularDependency(cycle) => {
                let trail: Vec<&str> = cycle.trail.iter().map(DependencyName::as_str).collect();
                assert_eq!(trail, vec!["a", "b", "c", "d", "b"]);
            }
            other => panic!("Expected CircularDependency, got: {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_is_reported() {
        let container = Container::new();

        let err = container.resolve("a").unwrap_err();
        assert!(err.to_string().starts_with("Dependency is missing: a"));
        match err {
            WiringError::MissingDependency(missing) => {
                assert_eq!(missing.requested, "a");
                assert!(missing.required_by.is_none());
            }
            other => panic!("Expected MissingDependency, got: {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let container = Container::new();
        container.set("a", 1i32).unwrap();

        let err = container.set("a", 2i32).unwrap_err();
        assert!(err.to_string().starts_with("Dependency already exists: a"));
        assert!(matches!(err, WiringError::AlreadyRegistered(_)));
        assert_eq!(*container.get::<i32>("a").unwrap(), 1);
    }

    #[test]
    fn inject_prefers_overrides_over_registry() {
        let container = Container::new();
        container.set("d1", 20i32).unwrap();
        container.set("d2", 1000i32).unwrap();

        let sum = Factory::new(["d1", "d2", "d3"], |args| {
            Ok(*args.get::<i32>("d1")? + *args.get::<i32>("d2")? + *args.get::<i32>("d3")?)
        });
        let overrides = Overrides::new().with("d2", 20i32).with("d3", 2i32);

        assert_eq!(*container.inject::<i32>(&sum, &overrides).unwrap(), 42);
        // nothing is registered or memoized for the injected call
        assert!(!container.has("d3"));
        assert!(!container.is_resolved("d2"));
        assert_eq!(*container.get::<i32>("d2").unwrap(), 1000);
    }

    #[test]
    fn inject_runs_the_factory_every_time() {
        let calls = Arc::new(AtomicU32::new(0));
        let container = Container::new();
        let factory = Factory::lazy({
            let calls = calls.clone();
            move || Ok(calls.fetch_add(1, Ordering::SeqCst))
        });

        container.inject::<u32>(&factory, &Overrides::new()).unwrap();
        container.inject::<u32>(&factory, &Overrides::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn replace_before_first_resolve() {
        let container = Container::new();
        container.set("d1", 21i32).unwrap();
        container.replace("d1", Producer::value(42i32)).unwrap();

        assert_eq!(*container.get::<i32>("d1").unwrap(), 42);
    }

    #[test]
    fn replace_after_resolve_is_rejected() {
        let container = Container::new();
        container.set("d1", 21i32).unwrap();
        container.get::<i32>("d1").unwrap();

        let err = container.replace("d1", Producer::value(42i32)).unwrap_err();
        assert!(matches!(err, WiringError::AlreadyResolved(_)));
        assert_eq!(*container.get::<i32>("d1").unwrap(), 21);
    }

    #[test]
    fn replace_unknown_is_rejected() {
        let container = Container::new();
        let err = container.replace("d1", Producer::value(42i32)).unwrap_err();
        assert!(matches!(err, WiringError::NotRegistered(_)));
    }

    #[test]
    fn replace_swaps_a_factory_for_a_test_double() {
        let container = Container::new();
        container
            .set_factory("mailer", Factory::lazy(|| Ok(String::from("smtp"))))
            .unwrap();
        container
            .replace("mailer", Factory::lazy(|| Ok(String::from("in-memory"))))
            .unwrap();

        assert_eq!(container.get::<String>("mailer").unwrap().as_str(), "in-memory");
    }

    #[test]
    fn has_reports_registered_names_only() {
        let container = Container::new();
        container.set("d1", 1i32).unwrap();
        container.set_fallback(|_| Ok(into_any(0i32)));

        assert!(container.has("d1"));
        assert!(!container.has("d2"));
        container.get::<i32>("d2").unwrap();
        assert!(!container.has("d2"));
    }

    #[test]
    fn fallback_resolves_unknown_names() {
        let container = Container::new();
        container.set_fallback(|name| {
            match name.as_str().strip_prefix("env_") {
                Some(rest) => Ok(into_any(rest.to_uppercase())),
                None => Err(WiringError::missing(name)),
            }
        });
        container.set_factory("greeting", passthrough("env_home")).unwrap();

        assert_eq!(container.get::<String>("greeting").unwrap().as_str(), "HOME");
        assert!(matches!(
            container.resolve("other"),
            Err(WiringError::MissingDependency(_))
        ));
    }

    #[test]
    fn last_fallback_wins() {
        let container = Container::new();
        container.set_fallback(|_| Ok(into_any(1i32)));
        container.set_fallback(|_| Ok(into_any(2i32)));

        assert_eq!(*container.get::<i32>("anything").unwrap(), 2);
    }

    #[test]
    fn callable_dependency_invoked_with_caller_arguments() {
        let container = Container::new();
        container.set("factor", 2i32).unwrap();
        container
            .set_factory(
                "d1",
                Factory::new(["factor"], |args| {
                    let factor = *args.get::<i32>("factor")?;
                    Ok(Callable::new(move |call| Ok(*call.get::<i32>(0)? * factor)))
                }),
            )
            .unwrap();

        assert_eq!(*container.call::<i32>("d1", &[arg(21i32)]).unwrap(), 42);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused: {0}")]
    struct ConnectError(&'static str);

    #[test]
    fn factory_errors_reach_the_caller_unchanged() {
        let container = Container::new();
        container
            .set_factory(
                "database",
                Factory::lazy(|| Err::<(), _>(WiringError::factory(ConnectError("db:5432")))),
            )
            .unwrap();
        container.set_factory("repository", passthrough("database")).unwrap();

        match container.resolve("repository") {
            Err(WiringError::Factory(err)) => {
                let inner = err.downcast_ref::<ConnectError>().expect("user error type kept");
                assert_eq!(inner.0, "db:5432");
            }
            other => panic!("Expected Factory error, got: {other:?}"),
        }
        // a failed resolution leaves the name unresolved and the container usable
        assert!(!container.is_resolved("repository"));
        container.set("d1", 1i32).unwrap();
        assert_eq!(*container.get::<i32>("d1").unwrap(), 1);
    }

    #[test]
    fn providers_register_through_the_builder() {
        struct NumbersProvider;

        impl Provider for NumbersProvider {
            fn register(&self, registry: &mut dyn ProviderRegistry) {
                registry.register_producer("d1".into(), Producer::value(40i32));
                registry.register_producer("d2".into(), Producer::value(2i32));
                registry.register_producer("d3".into(), singleton_factory::<D3>().into());
            }
        }

        let container = Container::builder()
            .add_provider(&NumbersProvider)
            .validate_on_build(true)
            .build()
            .unwrap();

        assert_eq!(container.get::<D3>("d3").unwrap().sum(), 42);
    }
}
