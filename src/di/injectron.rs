use crate::di::{
    Dependency, Expiry, Injection, Injector, Repository, Resource, Scope, Source, Supplier, Value,
};
use crate::error::{InjectError, Result};
use std::fmt;
use std::sync::Arc;

/// A bound, ready-to-serve binding: resource and producer wired to the
/// repository of its scope.
pub struct Injectron {
    resource: Resource,
    source: Source,
    scope: Scope,
    serial: usize,
    repository: Arc<dyn Repository>,
    supplier: Arc<dyn Supplier>,
}

impl Injectron {
    pub(crate) fn new(
        resource: Resource,
        source: Source,
        scope: Scope,
        serial: usize,
        repository: Arc<dyn Repository>,
        supplier: Arc<dyn Supplier>,
    ) -> Self {
        Self {
            resource,
            source,
            scope,
            serial,
            repository,
            supplier,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Position of this injectron within its injector.
    pub fn serial(&self) -> usize {
        self.serial
    }

    pub fn expiry(&self) -> Expiry {
        self.scope.expiry()
    }

    /// Produces or replays the value for `dependency`.
    pub fn instance_for(&self, dependency: &Dependency, injector: &Injector) -> Result<Value> {
        if let Some(cycle) = dependency.cycle_at(self.serial) {
            return Err(InjectError::DependencyCycle { cycle });
        }
        let expiry = if dependency.ignores_expiry() {
            Expiry::Ignore
        } else {
            self.expiry()
        };
        let key = self.scope.key(self.serial, dependency);
        self.repository.serve(key, expiry, &|| {
            tracing::trace!("Producing {} for {}", self.resource, dependency);
            let injected = dependency.injecting_into(Injection::new(
                dependency.instance().clone(),
                self.resource.instance().clone(),
                self.serial,
            ));
            self.supplier
                .supply(&injected, injector)
                .map_err(|error| construction_failure(dependency, &self.source, error))
        })
    }
}

// a cycle is reported as such, not as the failure of every frame it passes
fn construction_failure(
    dependency: &Dependency,
    source: &Source,
    error: anyhow::Error,
) -> InjectError {
    match error.downcast::<InjectError>() {
        Ok(inner @ InjectError::DependencyCycle { .. }) => inner,
        Ok(inner) => InjectError::ConstructionFailure {
            dependency: dependency.to_string(),
            origin: source.to_string(),
            error: inner.into(),
        },
        Err(error) => InjectError::ConstructionFailure {
            dependency: dependency.to_string(),
            origin: source.to_string(),
            error,
        },
    }
}

impl fmt::Debug for Injectron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injectron")
            .field("resource", &self.resource.to_string())
            .field("source", &self.source.to_string())
            .field("scope", &self.scope)
            .field("serial", &self.serial)
            .finish()
    }
}

impl fmt::Display for Injectron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] from {}", self.resource, self.scope, self.source)
    }
}
