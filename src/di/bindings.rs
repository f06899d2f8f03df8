use crate::di::{
    Binding, DeclarationType, Dependency, Injector, Resource, Scope, Source, Supplier, Value,
    constant, forward,
};
use crate::error::Result;
use crate::types::Instance;
use std::any::Any;
use std::sync::Arc;

/// Collects the bindings of one declaring unit before the injector is built.
///
/// Every binding records its position within the collection as its
/// declaration number.
///
/// ```
/// use bindery::di::{Bindings, Resource};
/// use bindery::types::Type;
///
/// struct Greeting;
///
/// let mut bindings = Bindings::new("greetings");
/// bindings.bind_constant(Resource::of(Type::of::<Greeting>()), "hello");
/// let injector = bindings.build().unwrap();
///
/// let greeting = injector.resolve_type_as::<&str>(Type::of::<Greeting>()).unwrap();
/// assert_eq!(*greeting, "hello");
/// ```
#[derive(Debug)]
pub struct Bindings {
    ident: &'static str,
    bindings: Vec<Binding>,
}

impl Bindings {
    pub fn new(ident: &'static str) -> Self {
        Self {
            ident,
            bindings: Vec::new(),
        }
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn declare(
        &mut self,
        declaration_type: DeclarationType,
        resource: Resource,
        scope: Scope,
        supplier: impl Supplier + 'static,
    ) -> &mut Self {
        let source = Source::new(self.ident, self.bindings.len(), declaration_type);
        self.bindings.push(Binding::new(resource, scope, source, supplier));
        self
    }

    /// Declares the one binding for `resource`.
    pub fn bind(
        &mut self,
        resource: Resource,
        scope: Scope,
        supplier: impl Supplier + 'static,
    ) -> &mut Self {
        self.declare(DeclarationType::Explicit, resource, scope, supplier)
    }

    /// Like [`Bindings::bind`] for a closure.
    pub fn bind_fn<F>(&mut self, resource: Resource, scope: Scope, supplier: F) -> &mut Self
    where
        F: Fn(&Dependency, &Injector) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.bind(resource, scope, supplier)
    }

    /// Declares a fallback that any explicit binding replaces.
    pub fn bind_default(
        &mut self,
        resource: Resource,
        scope: Scope,
        supplier: impl Supplier + 'static,
    ) -> &mut Self {
        self.declare(DeclarationType::Default, resource, scope, supplier)
    }

    /// Contributes one of several bindings for `resource`.
    pub fn multibind(
        &mut self,
        resource: Resource,
        scope: Scope,
        supplier: impl Supplier + 'static,
    ) -> &mut Self {
        self.declare(DeclarationType::Multi, resource, scope, supplier)
    }

    /// Binds `resource` to a fixed value.
    pub fn bind_constant<T: Any + Send + Sync>(
        &mut self,
        resource: Resource,
        value: T,
    ) -> &mut Self {
        self.bind(resource, Scope::Application, constant(Arc::new(value)))
    }

    /// Binds `resource` to whatever `instance` resolves to.
    pub fn bind_forward(
        &mut self,
        resource: Resource,
        scope: Scope,
        instance: Instance,
    ) -> &mut Self {
        self.bind(resource, scope, forward(instance))
    }

    pub fn add(&mut self, binding: Binding) -> &mut Self {
        self.bindings.push(binding);
        self
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn into_vec(self) -> Vec<Binding> {
        self.bindings
    }

    pub fn build(self) -> Result<Injector> {
        Injector::build(self.bindings)
    }
}

impl IntoIterator for Bindings {
    type Item = Binding;
    type IntoIter = std::vec::IntoIter<Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.into_iter()
    }
}
