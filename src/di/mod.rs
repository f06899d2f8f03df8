//! The resolution core: bindings, scopes and the injector.
//!
//! Values flow as [`Value`]s (`Arc<dyn Any + Send + Sync>`). Arrays synthesized
//! by the injector are `Vec<Value>` wrapped the same way.

mod binding;
mod bindings;
mod dependency;
mod injector;
mod injectron;
mod repository;
mod resource;
mod scope;
mod site;
mod supply;

use std::any::Any;
use std::sync::Arc;

pub use binding::{Binding, DeclarationType, Source};
pub use bindings::Bindings;
pub use dependency::{Dependency, Injection};
pub use injector::Injector;
pub use injectron::Injectron;
pub use repository::Repository;
pub use resource::{Packages, Resource, Specificity, Target};
pub use scope::{Expiry, Key, Scope};
pub use site::{InjectionSite, Parameter};
pub use supply::{Constant, Factory, Forward, Supplier, constant, forward};

/// A produced instance.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wraps `value` as a [`Value`].
pub fn value<T: Any + Send + Sync>(value: T) -> Value {
    Arc::new(value)
}
