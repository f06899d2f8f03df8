//! Declaration units and their composition.
//!
//! A [`Module`] declares bindings. A [`Bundle`] installs modules and other
//! bundles; a [`ModularBundle`] is an enum whose variants are installed
//! independently. The [`Bootstrapper`] runs the composition and hands the
//! collected bindings to the injector.

mod bootstrap;

pub use bootstrap::{Bootstrap, Bootstrapper};

use crate::config::Presets;
use crate::di::Bindings;
use std::any::type_name;
use std::hash::Hash;
use strum::IntoEnumIterator;

/// Declares bindings.
///
/// # Example
/// ```
/// use bindery::config::Presets;
/// use bindery::di::{Bindings, Resource};
/// use bindery::module::Module;
/// use bindery::types::Type;
///
/// struct Port;
/// struct ServerModule;
///
/// impl Module for ServerModule {
///     fn declare(&self, bindings: &mut Bindings, presets: &Presets) -> anyhow::Result<()> {
///         let port = presets.value::<u16>("port")?.unwrap_or(8080);
///         bindings.bind_constant(Resource::of(Type::of::<Port>()), port);
///         Ok(())
///     }
/// }
/// ```
pub trait Module: Send + Sync {
    fn declare(&self, bindings: &mut Bindings, presets: &Presets) -> anyhow::Result<()>;

    /// Identifies the module in binding sources and errors.
    fn ident(&self) -> &'static str {
        type_name::<Self>()
    }
}

impl<F> Module for F
where
    F: Fn(&mut Bindings, &Presets) -> anyhow::Result<()> + Send + Sync,
{
    fn declare(&self, bindings: &mut Bindings, presets: &Presets) -> anyhow::Result<()> {
        self(bindings, presets)
    }
}

/// Installs modules and other bundles. Installed at most once per bootstrap.
pub trait Bundle: 'static {
    fn bootstrap(bootstrapper: &mut Bootstrapper) -> anyhow::Result<()>;
}

/// A closed set of independently installable options.
///
/// Derive `EnumIter` and `IntoStaticStr` from `strum_macros`; the static
/// string is the name an option is chosen by.
pub trait ModularBundle:
    Copy + Eq + Hash + Into<&'static str> + IntoEnumIterator + Send + Sync + 'static
{
    fn bootstrap(self, bootstrapper: &mut Bootstrapper) -> anyhow::Result<()>;

    fn name(self) -> &'static str {
        self.into()
    }
}
