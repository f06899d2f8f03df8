use crate::di::{Dependency, Injector, Injectron, Supplier, Value};
use crate::error::{InjectError, Result};
use crate::types::{Instance, Type};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// One argument of an injection site.
#[derive(Clone)]
pub enum Parameter {
    /// A fixed value.
    Constant(Value),
    /// Resolved from the injector.
    Instance(Instance),
    /// Supplied by an external function on every call.
    External { ty: Type, supplier: Arc<dyn Supplier> },
}

impl Parameter {
    pub fn constant<T: Any + Send + Sync>(value: T) -> Self {
        Self::Constant(Arc::new(value))
    }

    pub fn instance(instance: Instance) -> Self {
        Self::Instance(instance)
    }

    /// Any instance of `ty`.
    pub fn of(ty: Type) -> Self {
        Self::Instance(Instance::any_of(ty))
    }

    pub fn external(ty: Type, supplier: impl Supplier + 'static) -> Self {
        Self::External {
            ty,
            supplier: Arc::new(supplier),
        }
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(_) => f.write_str("Constant"),
            Self::Instance(instance) => write!(f, "Instance({instance})"),
            Self::External { ty, .. } => write!(f, "External({ty})"),
        }
    }
}

enum Dynamic {
    Injectron(Arc<Injectron>, Dependency),
    Resolve(Dependency),
    External(Arc<dyn Supplier>, Dependency),
}

/// Precomputed argument plan for one call site.
///
/// Everything that cannot change between calls is resolved once when the site
/// is built; only the dynamic positions are resolved again per call.
pub struct InjectionSite {
    site: Dependency,
    args: Arc<[Value]>,
    dynamics: Box<[(usize, Dynamic)]>,
}

impl InjectionSite {
    pub fn new(site: Dependency, injector: &Injector, parameters: &[Parameter]) -> Result<Self> {
        let mut args: Vec<Value> = Vec::with_capacity(parameters.len());
        let mut dynamics = Vec::new();
        for (i, parameter) in parameters.iter().enumerate() {
            match parameter {
                Parameter::Constant(value) => args.push(Arc::clone(value)),
                Parameter::Instance(instance) => {
                    let dependency = site.instanced(instance.clone());
                    match injector.injectron_for(&dependency) {
                        Some(injectron) if injectron.expiry().is_never() => {
                            args.push(injectron.instance_for(&dependency, injector)?);
                        }
                        Some(injectron) => {
                            args.push(placeholder());
                            dynamics.push((i, Dynamic::Injectron(injectron, dependency)));
                        }
                        None if dependency.ty().is_array() => {
                            args.push(placeholder());
                            dynamics.push((i, Dynamic::Resolve(dependency)));
                        }
                        None => return Err(InjectError::no_candidate(&dependency)),
                    }
                }
                Parameter::External { ty, supplier } => {
                    let dependency = site.instanced(Instance::any_of(ty.clone()));
                    args.push(placeholder());
                    dynamics.push((i, Dynamic::External(Arc::clone(supplier), dependency)));
                }
            }
        }
        tracing::trace!(
            "Injection site {} has {} of {} dynamic arguments",
            site,
            dynamics.len(),
            parameters.len()
        );
        Ok(Self {
            site,
            args: args.into(),
            dynamics: dynamics.into(),
        })
    }

    pub fn site(&self) -> &Dependency {
        &self.site
    }

    pub fn is_static(&self) -> bool {
        self.dynamics.is_empty()
    }

    /// The arguments for one call.
    ///
    /// A site without dynamic positions hands out its shared argument array;
    /// otherwise each call gets a private copy with the dynamic positions
    /// filled in.
    pub fn args(&self, injector: &Injector) -> Result<Arc<[Value]>> {
        if self.dynamics.is_empty() {
            return Ok(Arc::clone(&self.args));
        }
        let mut args = self.args.to_vec();
        for (i, dynamic) in self.dynamics.iter() {
            args[*i] = match dynamic {
                Dynamic::Injectron(injectron, dependency) => {
                    injectron.instance_for(dependency, injector)?
                }
                Dynamic::Resolve(dependency) => injector.resolve(dependency)?,
                Dynamic::External(supplier, dependency) => supplier
                    .supply(dependency, injector)
                    .map_err(|error| InjectError::ConstructionFailure {
                        dependency: dependency.to_string(),
                        origin: format!("external argument {i} of {}", self.site),
                        error,
                    })?,
            };
        }
        Ok(args.into())
    }
}

impl fmt::Debug for InjectionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionSite")
            .field("site", &self.site.to_string())
            .field("arity", &self.args.len())
            .field(
                "dynamics",
                &self.dynamics.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn placeholder() -> Value {
    Arc::new(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::{Bindings, Resource, Scope, constant, value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Config;
    struct Clock;
    struct Service;

    fn injector(ticks: Arc<AtomicUsize>) -> Injector {
        let mut bindings = Bindings::new("site-test");
        bindings
            .bind(
                Resource::of(Type::of::<Config>()),
                Scope::Application,
                constant(value("config")),
            )
            .bind_fn(
                Resource::of(Type::of::<Clock>()),
                Scope::Injection,
                move |_, _| Ok(value(ticks.fetch_add(1, Ordering::SeqCst))),
            );
        bindings.build().unwrap()
    }

    fn site() -> Dependency {
        Dependency::of(Type::of::<Service>())
    }

    #[test]
    fn test_static_site_reuses_argument_array() {
        let injector = injector(Arc::new(AtomicUsize::new(0)));
        let site = InjectionSite::new(
            site(),
            &injector,
            &[
                Parameter::constant(7u8),
                Parameter::instance(Instance::of(Type::of::<Config>())),
            ],
        )
        .unwrap();

        assert!(site.is_static());
        let first = site.args(&injector).unwrap();
        let second = site.args(&injector).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].downcast_ref::<u8>(), Some(&7));
        assert_eq!(first[1].downcast_ref::<&str>(), Some(&"config"));
    }

    #[test]
    fn test_dynamic_positions_are_refreshed_per_call() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let injector = injector(Arc::clone(&ticks));
        let calls = Arc::new(AtomicUsize::new(100));
        let external = {
            let calls = Arc::clone(&calls);
            move |_: &Dependency, _: &Injector| Ok(value(calls.fetch_add(1, Ordering::SeqCst)))
        };
        let site = InjectionSite::new(
            site(),
            &injector,
            &[
                Parameter::instance(Instance::of(Type::of::<Config>())),
                Parameter::instance(Instance::of(Type::of::<Clock>())),
                Parameter::external(Type::of::<usize>(), external),
            ],
        )
        .unwrap();

        assert!(!site.is_static());
        let first = site.args(&injector).unwrap();
        let second = site.args(&injector).unwrap();

        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(first[1].downcast_ref::<usize>(), Some(&0));
        assert_eq!(second[1].downcast_ref::<usize>(), Some(&1));
        assert_eq!(first[2].downcast_ref::<usize>(), Some(&100));
        assert_eq!(second[2].downcast_ref::<usize>(), Some(&101));
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unbound_instance_parameter_fails() {
        let injector = injector(Arc::new(AtomicUsize::new(0)));
        let result = InjectionSite::new(
            site(),
            &injector,
            &[Parameter::instance(Instance::of(Type::of::<Service>()))],
        );
        assert!(matches!(result, Err(InjectError::NoCandidate { .. })));
    }
}
