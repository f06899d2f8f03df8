use crate::di::Dependency;
use crate::types::{Instance, RawType, Type};
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Module paths a target restriction applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Packages {
    All,
    /// Exactly one module path.
    Package(Arc<str>),
    /// A module path and everything nested below it.
    Subpackages(Arc<str>),
}

impl Packages {
    pub fn package_of(raw: &RawType) -> Self {
        Self::Package(Arc::from(raw.package()))
    }

    pub fn subpackages_of(raw: &RawType) -> Self {
        Self::Subpackages(Arc::from(raw.package()))
    }

    pub fn contains(&self, raw: &RawType) -> bool {
        let package = raw.package();
        match self {
            Self::All => true,
            Self::Package(path) => package == &**path,
            Self::Subpackages(path) => {
                package == &**path
                    || package
                        .strip_prefix(&**path)
                        .is_some_and(|rest| rest.starts_with("::"))
            }
        }
    }

    fn specificity(&self) -> u8 {
        match self {
            Self::Package(_) => 0,
            Self::Subpackages(_) => 1,
            Self::All => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Parent {
    ty: Type,
    direct: bool,
}

/// Restricts where a binding applies, judged by the chain of the request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    instance: Instance,
    packages: Packages,
    parents: Arc<[Parent]>,
}

impl Target {
    /// No restriction.
    pub fn any() -> Self {
        Self {
            instance: Instance::any(),
            packages: Packages::All,
            parents: Arc::from([]),
        }
    }

    /// Only while constructing `instance`.
    pub fn injecting_into(instance: Instance) -> Self {
        Self {
            instance,
            ..Self::any()
        }
    }

    /// Only while constructing something declared in `packages`.
    pub fn in_packages(self, packages: Packages) -> Self {
        Self { packages, ..self }
    }

    /// Only when some enclosing construction (beyond the direct target) is of `ty`.
    pub fn having_parent(self, ty: Type) -> Self {
        self.with_parent(Parent { ty, direct: false })
    }

    /// Only when the construction enclosing the direct target is of `ty`.
    pub fn having_direct_parent(self, ty: Type) -> Self {
        self.with_parent(Parent { ty, direct: true })
    }

    fn with_parent(self, parent: Parent) -> Self {
        let parents = self
            .parents
            .iter()
            .cloned()
            .chain(std::iter::once(parent))
            .collect();
        Self { parents, ..self }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn packages(&self) -> &Packages {
        &self.packages
    }

    pub fn is_any(&self) -> bool {
        self.instance.is_any() && self.packages == Packages::All && self.parents.is_empty()
    }

    pub fn is_accessible_for(&self, dependency: &Dependency) -> bool {
        if self.is_any() {
            return true;
        }
        let Some((innermost, outer)) = dependency.chain().split_last() else {
            return false;
        };
        let target = innermost.target();
        if !self.instance.is_any()
            && !(self.instance.name().is_applicable_for(target.name())
                && target.ty().is_assignable_to(self.instance.ty()))
        {
            return false;
        }
        if !self.packages.contains(target.ty().raw_type()) {
            return false;
        }
        self.parents.iter().all(|parent| {
            let is_parent = |injection: &crate::di::Injection| {
                injection.target().ty().is_assignable_to(&parent.ty)
            };
            if parent.direct {
                outer.last().is_some_and(is_parent)
            } else {
                outer.iter().any(is_parent)
            }
        })
    }

    fn specificity(&self) -> (u8, u8, Reverse<usize>) {
        (
            u8::from(self.instance.is_any()),
            self.packages.specificity(),
            Reverse(self.parents.len()),
        )
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::any()
    }
}

/// Ordering key of resources sharing a raw type; smaller is more specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    name: (u8, Reverse<usize>),
    target: (u8, u8, Reverse<usize>),
    ty: u8,
}

/// The identity a binding is addressed by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resource {
    instance: Instance,
    target: Target,
}

impl Resource {
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            target: Target::any(),
        }
    }

    pub fn of(ty: Type) -> Self {
        Self::new(Instance::of(ty))
    }

    pub fn targeted(self, target: Target) -> Self {
        Self { target, ..self }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn ty(&self) -> &Type {
        self.instance.ty()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// The requested type must be assignable to the declared type, the name
    /// must match and the target must accept the request's chain.
    pub fn is_applicable_for(&self, dependency: &Dependency) -> bool {
        dependency.ty().is_assignable_to(self.instance.ty())
            && self.instance.name().is_applicable_for(dependency.name())
            && self.target.is_accessible_for(dependency)
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            name: self.instance.name().specificity(),
            target: self.target.specificity(),
            ty: self.instance.ty().precision(),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instance)?;
        if !self.target.is_any() {
            write!(f, " @ {}", self.target.instance)?;
        }
        Ok(())
    }
}
