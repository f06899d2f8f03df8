//! # Bindery
//!
//! A runtime dependency-resolution engine.
//!
//! Bindings map a typed, optionally named [`Resource`](di::Resource) to a
//! supplier and a [`Scope`](di::Scope). Once built, the [`Injector`](di::Injector)
//! answers requests for "an instance of `T` named `n`", caching values per
//! scope, synthesizing arrays of every candidate for `T[]` requests and
//! reporting cycles and missing candidates as errors.
//!
//! ## Features
//!
//! - **Reified types**: [`Type`](types::Type) carries type arguments, arrays and
//!   lower bounds so bindings can be matched by assignability
//! - **Specificity**: exact names beat patterns, patterns beat wildcards and
//!   targeted bindings beat untargeted ones
//! - **Scopes**: application, per dependency instance or type, per target, per
//!   thread and per injection
//! - **Injection sites**: argument plans that resolve stable values once
//! - **Bundles**: idempotent composition of modules with permanent uninstall
//!
//! ## Quick Start
//!
//! ```rust
//! use bindery::prelude::*;
//!
//! struct Greeting;
//! struct Greeter;
//!
//! struct GreetingModule;
//!
//! impl Module for GreetingModule {
//!     fn declare(&self, bindings: &mut Bindings, presets: &Presets) -> anyhow::Result<()> {
//!         let greeting = presets.get("greeting").unwrap_or_else(|| "hello".to_string());
//!         bindings
//!             .bind_constant(Resource::of(Type::of::<Greeting>()), greeting)
//!             .bind(
//!                 Resource::of(Type::of::<Greeter>()),
//!                 Scope::Application,
//!                 Factory::new([Parameter::of(Type::of::<Greeting>())], |args| {
//!                     let greeting = args[0].downcast_ref::<String>().cloned();
//!                     let greeting = greeting.unwrap_or_default();
//!                     Ok(value(format!("{greeting}, world")))
//!                 }),
//!             );
//!         Ok(())
//!     }
//! }
//!
//! struct App;
//!
//! impl Bundle for App {
//!     fn bootstrap(bootstrapper: &mut Bootstrapper) -> anyhow::Result<()> {
//!         bootstrapper.install_module(GreetingModule);
//!         Ok(())
//!     }
//! }
//!
//! let injector = Bootstrap::injector::<App>().unwrap();
//! let greeter = injector.resolve_type_as::<String>(Type::of::<Greeter>()).unwrap();
//! assert_eq!(greeter.as_str(), "hello, world");
//! ```

pub mod aspect;
pub mod config;
pub mod di;
pub mod error;
pub mod module;
pub mod service;
pub mod types;

// Re-export core types
pub use di::{Bindings, Dependency, Injector, Resource, Scope, Value};
pub use error::{InjectError, Result};
pub use module::{Bootstrap, Bootstrapper, Bundle, ModularBundle, Module};
pub use types::{Instance, Name, RawType, Type};

/// Prelude module for convenient imports
///
/// ```
/// use bindery::prelude::*;
/// ```
pub mod prelude {
    pub use crate::aspect::{InvocationState, ServiceInvocation};
    pub use crate::config::{Globals, Options, Presets};
    pub use crate::di::{
        Bindings, DeclarationType, Dependency, Factory, Injector, Packages, Parameter, Resource,
        Scope, Supplier, Target, Value, constant, forward, value,
    };
    pub use crate::error::{InjectError, Result};
    pub use crate::module::{Bootstrap, Bootstrapper, Bundle, ModularBundle, Module};
    pub use crate::service::{ServiceMethod, ServiceProvider};
    pub use crate::types::{Instance, Name, RawType, Type};
    pub use std::sync::Arc;
}
