use crate::di::{Dependency, Injector, Parameter, Value};
use crate::types::Instance;
use std::fmt;
use std::sync::Arc;

/// Produces the value for a matching dependency.
///
/// Suppliers may resolve further dependencies from the injector; the
/// dependency they receive already records the injection in its chain.
pub trait Supplier: Send + Sync {
    fn supply(&self, dependency: &Dependency, injector: &Injector) -> anyhow::Result<Value>;
}

impl<F> Supplier for F
where
    F: Fn(&Dependency, &Injector) -> anyhow::Result<Value> + Send + Sync,
{
    fn supply(&self, dependency: &Dependency, injector: &Injector) -> anyhow::Result<Value> {
        self(dependency, injector)
    }
}

/// Always supplies the same value.
#[derive(Clone)]
pub struct Constant(Value);

pub fn constant(value: Value) -> Constant {
    Constant(value)
}

impl Supplier for Constant {
    fn supply(&self, _dependency: &Dependency, _injector: &Injector) -> anyhow::Result<Value> {
        Ok(Arc::clone(&self.0))
    }
}

/// Supplies whatever `instance` resolves to from within the same chain.
#[derive(Clone, Debug)]
pub struct Forward(Instance);

pub fn forward(instance: Instance) -> Forward {
    Forward(instance)
}

impl Supplier for Forward {
    fn supply(&self, dependency: &Dependency, injector: &Injector) -> anyhow::Result<Value> {
        Ok(injector.resolve(&dependency.instanced(self.0.clone()))?)
    }
}

/// Calls a function with arguments resolved through a cached
/// [`InjectionSite`](crate::di::InjectionSite).
///
/// ```
/// use bindery::di::{Bindings, Factory, Parameter, Resource, Scope, constant, value};
/// use bindery::types::{Instance, Type};
///
/// let mut bindings = Bindings::new("example");
/// bindings
///     .bind(Resource::of(Type::of::<u32>()), Scope::Application, constant(value(20u32)))
///     .bind(
///         Resource::of(Type::of::<u64>()),
///         Scope::Injection,
///         Factory::new(
///             [Parameter::constant(1u32), Parameter::instance(Instance::of(Type::of::<u32>()))],
///             |args| {
///                 let sum: u32 = args.iter().filter_map(|arg| arg.downcast_ref::<u32>()).sum();
///                 Ok(value(u64::from(sum)))
///             },
///         ),
///     );
/// let injector = bindings.build().unwrap();
/// let total = injector.resolve_type_as::<u64>(Type::of::<u64>()).unwrap();
/// assert_eq!(*total, 21);
/// ```
pub struct Factory<F> {
    parameters: Arc<[Parameter]>,
    function: F,
}

impl<F> Factory<F>
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(parameters: impl IntoIterator<Item = Parameter>, function: F) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
            function,
        }
    }
}

impl<F> Supplier for Factory<F>
where
    F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync,
{
    fn supply(&self, dependency: &Dependency, injector: &Injector) -> anyhow::Result<Value> {
        let site = injector.injection_site(dependency, &self.parameters)?;
        let args = site.args(injector)?;
        (self.function)(&args)
    }
}

impl<F> fmt::Debug for Factory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}
