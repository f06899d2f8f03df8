use crate::config::{Globals, Presets};
use crate::di::{Binding, Bindings, Injector};
use crate::error::{InjectError, Result};
use crate::module::{Bundle, ModularBundle, Module};
use std::any::{TypeId, type_name};
use std::collections::{HashMap, HashSet};
use strum::IntoEnumIterator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum Node {
    Root,
    Bundle(TypeId),
    Modular(TypeId, &'static str),
}

enum Content {
    Bundle(Node),
    Module(Box<dyn Module>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BundleState {
    Installed,
    Uninstalled,
}

/// Runs bundles and records what they install.
///
/// Installing is idempotent and uninstalling is permanent: a bundle that was
/// uninstalled ignores every later install, and whatever it installed before
/// is left out unless some other installed bundle installed it as well.
pub struct Bootstrapper {
    globals: Globals,
    states: HashMap<Node, BundleState>,
    contents: HashMap<Node, Vec<Content>>,
    stack: Vec<Node>,
}

impl Bootstrapper {
    pub fn new(globals: Globals) -> Self {
        Self {
            globals,
            states: HashMap::new(),
            contents: HashMap::new(),
            stack: vec![Node::Root],
        }
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn presets(&self) -> &Presets {
        &self.globals.presets
    }

    pub fn install<B: Bundle>(&mut self) -> Result<()> {
        self.enter(Node::Bundle(TypeId::of::<B>()), type_name::<B>(), B::bootstrap)
    }

    pub fn uninstall<B: Bundle>(&mut self) {
        self.leave(Node::Bundle(TypeId::of::<B>()), type_name::<B>());
    }

    /// Adds `module` to the bundle currently being installed.
    pub fn install_module(&mut self, module: impl Module + 'static) {
        let current = self.current();
        tracing::trace!("Installing module {} in {:?}", module.ident(), current);
        self.contents
            .entry(current)
            .or_default()
            .push(Content::Module(Box::new(module)));
    }

    /// Installs each of `options`; every distinct option is bootstrapped once.
    pub fn install_options<M: ModularBundle>(&mut self, options: &[M]) -> Result<()> {
        for &option in options {
            let bundle = format!("{}::{}", type_name::<M>(), option.name());
            self.enter(Node::Modular(TypeId::of::<M>(), option.name()), &bundle, |bootstrapper| {
                option.bootstrap(bootstrapper)
            })?;
        }
        Ok(())
    }

    pub fn uninstall_options<M: ModularBundle>(&mut self, options: &[M]) {
        for &option in options {
            let bundle = format!("{}::{}", type_name::<M>(), option.name());
            self.leave(Node::Modular(TypeId::of::<M>(), option.name()), &bundle);
        }
    }

    pub fn install_all<M: ModularBundle>(&mut self) -> Result<()> {
        self.install_options(&M::iter().collect::<Vec<M>>())
    }

    /// Installs the options of `M` chosen in the [`Options`](crate::config::Options).
    pub fn install_chosen<M: ModularBundle>(&mut self) -> Result<()> {
        let options = self
            .globals
            .options
            .chosen::<M>()
            .into_iter()
            .map(|name| {
                M::iter()
                    .find(|option| option.name() == name)
                    .ok_or_else(|| InjectError::BootstrapFailure {
                        bundle: type_name::<M>().to_string(),
                        error: anyhow::anyhow!("unknown option {name:?}"),
                    })
            })
            .collect::<Result<Vec<M>>>()?;
        self.install_options(&options)
    }

    fn current(&self) -> Node {
        self.stack.last().copied().unwrap_or(Node::Root)
    }

    fn enter(
        &mut self,
        node: Node,
        bundle: &str,
        bootstrap: impl FnOnce(&mut Self) -> anyhow::Result<()>,
    ) -> Result<()> {
        if self.states.get(&node) == Some(&BundleState::Uninstalled) {
            tracing::debug!("Skipping uninstalled {}", bundle);
            return Ok(());
        }
        let parent = self.current();
        let siblings = self.contents.entry(parent).or_default();
        let known = siblings
            .iter()
            .any(|content| matches!(content, Content::Bundle(sibling) if *sibling == node));
        if !known {
            siblings.push(Content::Bundle(node));
        }
        if self.states.contains_key(&node) {
            return Ok(());
        }
        tracing::debug!("Installing {}", bundle);
        self.states.insert(node, BundleState::Installed);
        self.stack.push(node);
        let result = bootstrap(self);
        self.stack.pop();
        result.map_err(|error| bootstrap_failure(bundle, error))
    }

    fn leave(&mut self, node: Node, bundle: &str) {
        tracing::debug!("Uninstalling {}", bundle);
        self.states.insert(node, BundleState::Uninstalled);
    }

    /// The modules of every installed bundle reachable from the root, in
    /// installation order.
    pub fn into_modules(mut self) -> Vec<Box<dyn Module>> {
        let mut modules = Vec::new();
        self.collect(Node::Root, &mut HashSet::new(), &mut modules);
        modules
    }

    fn collect(
        &mut self,
        node: Node,
        visited: &mut HashSet<Node>,
        modules: &mut Vec<Box<dyn Module>>,
    ) {
        if !visited.insert(node) || self.states.get(&node) == Some(&BundleState::Uninstalled) {
            return;
        }
        for content in self.contents.remove(&node).unwrap_or_default() {
            match content {
                Content::Module(module) => modules.push(module),
                Content::Bundle(child) => self.collect(child, visited, modules),
            }
        }
    }

    /// Lets every installed module declare its bindings.
    pub fn into_bindings(self) -> Result<Vec<Binding>> {
        let presets = self.globals.presets.clone();
        let mut all = Vec::new();
        for module in self.into_modules() {
            let mut bindings = Bindings::new(module.ident());
            module
                .declare(&mut bindings, &presets)
                .map_err(|error| bootstrap_failure(module.ident(), error))?;
            tracing::debug!("{} declared {} bindings", module.ident(), bindings.len());
            all.extend(bindings);
        }
        Ok(all)
    }
}

// keeps the innermost failing bundle when failures nest
fn bootstrap_failure(bundle: &str, error: anyhow::Error) -> InjectError {
    match error.downcast::<InjectError>() {
        Ok(failure @ InjectError::BootstrapFailure { .. }) => failure,
        Ok(other) => InjectError::BootstrapFailure {
            bundle: bundle.to_string(),
            error: other.into(),
        },
        Err(error) => InjectError::BootstrapFailure {
            bundle: bundle.to_string(),
            error,
        },
    }
}

/// Entry points from a root bundle to an injector.
pub struct Bootstrap;

impl Bootstrap {
    pub fn injector<B: Bundle>() -> Result<Injector> {
        Self::injector_with::<B>(Globals::default())
    }

    pub fn injector_with<B: Bundle>(globals: Globals) -> Result<Injector> {
        Injector::build(Self::bindings_of::<B>(globals)?)
    }

    pub fn bindings_of<B: Bundle>(globals: Globals) -> Result<Vec<Binding>> {
        let mut bootstrapper = Bootstrapper::new(globals);
        bootstrapper.install::<B>()?;
        bootstrapper.into_bindings()
    }

    /// Runs the bundles without letting any module declare bindings.
    pub fn modules_of<B: Bundle>(globals: Globals) -> Result<Vec<Box<dyn Module>>> {
        let mut bootstrapper = Bootstrapper::new(globals);
        bootstrapper.install::<B>()?;
        Ok(bootstrapper.into_modules())
    }
}
