use crate::di::Dependency;
use crate::di::repository::{
    ApplicationRepository, InjectionRepository, KeyedRepository, Repository,
};
use crate::types::{Instance, Type};
use std::sync::Arc;
use std::thread::ThreadId;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// How long a produced value may be replayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Cached forever once produced.
    Never,
    /// Cached per thread.
    Thread,
    /// Produced anew for every call.
    Call,
    /// Bypass any cached value for one call without evicting it.
    Ignore,
}

impl Expiry {
    pub fn is_never(self) -> bool {
        self == Self::Never
    }
}

/// Caching granularity of a binding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
pub enum Scope {
    /// One value per binding, constructed exactly once.
    Application,
    /// One value per requested instance (type and name).
    DependencyInstance,
    /// One value per requested type.
    DependencyType,
    /// One value per instance being injected into, keyed by the innermost
    /// entry of the request's chain.
    TargetInstance,
    /// One value per thread. Values are kept for the life of the injector,
    /// including those of threads that have since exited.
    Thread,
    /// A new value for every request.
    Injection,
}

impl Scope {
    pub fn expiry(self) -> Expiry {
        match self {
            Self::Application
            | Self::DependencyInstance
            | Self::DependencyType
            | Self::TargetInstance => Expiry::Never,
            Self::Thread => Expiry::Thread,
            Self::Injection => Expiry::Call,
        }
    }

    /// Cache key of the injectron `serial` serving `dependency`.
    pub(crate) fn key(self, serial: usize, dependency: &Dependency) -> Key {
        let part = match self {
            Self::Application | Self::Injection => Part::Unit,
            Self::DependencyInstance => Part::Instance(dependency.instance().clone()),
            Self::DependencyType => Part::Type(dependency.ty().clone()),
            Self::TargetInstance => Part::Instance(
                dependency
                    .target()
                    .map_or_else(Instance::any, |injection| injection.target().clone()),
            ),
            Self::Thread => Part::Thread(std::thread::current().id()),
        };
        Key { serial, part }
    }

    /// The repository backing this scope for an injector with `capacity` injectrons.
    pub(crate) fn repository(self, capacity: usize) -> Arc<dyn Repository> {
        match self {
            Self::Application => Arc::new(ApplicationRepository::new(capacity)),
            Self::Injection => Arc::new(InjectionRepository),
            Self::DependencyInstance
            | Self::DependencyType
            | Self::TargetInstance
            | Self::Thread => Arc::new(KeyedRepository::default()),
        }
    }
}

/// Identifies one cached value within a repository.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    serial: usize,
    part: Part,
}

impl Key {
    pub fn serial(&self) -> usize {
        self.serial
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Part {
    Unit,
    Instance(Instance),
    Type(Type),
    Thread(ThreadId),
}
