use crate::types::{Instance, Name, Type};
use std::fmt;
use std::sync::Arc;

/// One frame of an ongoing resolution: the instance that was requested and the
/// bound instance being produced for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Injection {
    dependency: Instance,
    target: Instance,
    serial: usize,
}

impl Injection {
    pub(crate) fn new(dependency: Instance, target: Instance, serial: usize) -> Self {
        Self {
            dependency,
            target,
            serial,
        }
    }

    pub fn dependency(&self) -> &Instance {
        &self.dependency
    }

    /// The bound instance under construction.
    pub fn target(&self) -> &Instance {
        &self.target
    }

    /// Serial number of the injectron producing the target.
    pub fn serial(&self) -> usize {
        self.serial
    }
}

impl fmt::Display for Injection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}->{})", self.dependency, self.target)
    }
}

/// A resolution request.
///
/// Dependencies are immutable; every derivation returns a new value sharing the
/// chain of enclosing injections (innermost last).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    instance: Instance,
    chain: Arc<[Injection]>,
    ignore_expiry: bool,
}

impl Dependency {
    /// A root request for `instance`.
    pub fn on(instance: Instance) -> Self {
        Self {
            instance,
            chain: Arc::from([]),
            ignore_expiry: false,
        }
    }

    /// A root request for the default instance of `ty`.
    pub fn of(ty: Type) -> Self {
        Self::on(Instance::of(ty))
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn ty(&self) -> &Type {
        self.instance.ty()
    }

    pub fn name(&self) -> &Name {
        self.instance.name()
    }

    pub fn chain(&self) -> &[Injection] {
        &self.chain
    }

    /// The innermost injection, i.e. what this dependency is injected into.
    pub fn target(&self) -> Option<&Injection> {
        self.chain.last()
    }

    pub fn ignores_expiry(&self) -> bool {
        self.ignore_expiry
    }

    /// The same request for another type, keeping name and chain.
    pub fn typed(&self, ty: Type) -> Self {
        self.instanced(self.instance.typed(ty))
    }

    pub fn named(&self, name: impl Into<Name>) -> Self {
        self.instanced(self.instance.named(name))
    }

    /// A request for `instance` made from within the same chain.
    pub fn instanced(&self, instance: Instance) -> Self {
        Self {
            instance,
            chain: Arc::clone(&self.chain),
            ignore_expiry: false,
        }
    }

    /// The same request flagged to bypass cached values for its next
    /// production. Other callers still see the cache.
    pub fn ignored_expiry(&self) -> Self {
        Self {
            ignore_expiry: true,
            ..self.clone()
        }
    }

    pub(crate) fn injecting_into(&self, injection: Injection) -> Self {
        let chain = self
            .chain
            .iter()
            .cloned()
            .chain(std::iter::once(injection))
            .collect();
        Self {
            instance: self.instance.clone(),
            chain,
            ignore_expiry: false,
        }
    }

    /// Describes the cycle if the injectron `serial` is already producing this
    /// very instance further up the chain.
    pub(crate) fn cycle_at(&self, serial: usize) -> Option<String> {
        let start = self.chain.iter().position(|injection| {
            injection.serial == serial && injection.dependency == self.instance
        })?;
        let mut cycle = self.chain[start..]
            .iter()
            .map(|injection| injection.target.to_string())
            .collect::<Vec<_>>();
        cycle.push(self.instance.to_string());
        Some(cycle.join(" -> "))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instance)?;
        for injection in self.chain.iter().rev() {
            write!(f, " <- {}", injection.target)?;
        }
        Ok(())
    }
}
