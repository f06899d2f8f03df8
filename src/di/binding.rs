use crate::di::{Resource, Scope, Supplier};
use crate::error::{InjectError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;

/// How firmly a binding was declared; decides which of two bindings for the
/// same resource survives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum DeclarationType {
    /// Declared as a side effect; yields to anything.
    Implicit,
    /// A fallback; yields to explicit and multi declarations.
    Default,
    /// The one and only binding for its resource.
    Explicit,
    /// One of several bindings contributing to the same resource.
    Multi,
}

impl DeclarationType {
    pub fn is_replaced_by(self, other: DeclarationType) -> bool {
        match self {
            Self::Implicit => true,
            Self::Default => matches!(other, Self::Explicit | Self::Multi),
            Self::Explicit | Self::Multi => false,
        }
    }
}

/// Where a binding was declared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Source {
    ident: &'static str,
    declaration_no: usize,
    declaration_type: DeclarationType,
}

impl Source {
    pub fn new(
        ident: &'static str,
        declaration_no: usize,
        declaration_type: DeclarationType,
    ) -> Self {
        Self {
            ident,
            declaration_no,
            declaration_type,
        }
    }

    pub fn ident(&self) -> &'static str {
        self.ident
    }

    pub fn declaration_no(&self) -> usize {
        self.declaration_no
    }

    pub fn declaration_type(&self) -> DeclarationType {
        self.declaration_type
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} [{}]",
            self.ident, self.declaration_no, self.declaration_type
        )
    }
}

/// A declared binding: resource, scope, provenance and producer.
#[derive(Clone)]
pub struct Binding {
    resource: Resource,
    scope: Scope,
    source: Source,
    supplier: Arc<dyn Supplier>,
}

impl Binding {
    pub fn new(
        resource: Resource,
        scope: Scope,
        source: Source,
        supplier: impl Supplier + 'static,
    ) -> Self {
        Self::shared(resource, scope, source, Arc::new(supplier))
    }

    pub fn shared(
        resource: Resource,
        scope: Scope,
        source: Source,
        supplier: Arc<dyn Supplier>,
    ) -> Self {
        Self {
            resource,
            scope,
            source,
            supplier,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub(crate) fn supplier(&self) -> &Arc<dyn Supplier> {
        &self.supplier
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("resource", &self.resource.to_string())
            .field("scope", &self.scope)
            .field("source", &self.source.to_string())
            .finish()
    }
}

/// Settles bindings declared for the same resource according to their
/// [`DeclarationType`]. Order of the survivors is preserved.
pub(crate) fn disambiguate(bindings: Vec<Binding>) -> Result<Vec<Binding>> {
    let mut kept: Vec<Binding> = Vec::with_capacity(bindings.len());
    let mut latest: HashMap<Resource, usize> = HashMap::new();
    for binding in bindings {
        let Some(&at) = latest.get(&binding.resource) else {
            latest.insert(binding.resource.clone(), kept.len());
            kept.push(binding);
            continue;
        };
        let existing = kept[at].source.declaration_type;
        let declared = binding.source.declaration_type;
        if existing == DeclarationType::Multi && declared == DeclarationType::Multi {
            latest.insert(binding.resource.clone(), kept.len());
            kept.push(binding);
        } else if existing.is_replaced_by(declared) {
            tracing::debug!(
                "{} replaces {} for {}",
                binding.source,
                kept[at].source,
                binding.resource
            );
            kept[at] = binding;
        } else if declared.is_replaced_by(existing) {
            tracing::debug!(
                "Dropping {} for {}, already bound by {}",
                binding.source,
                binding.resource,
                kept[at].source
            );
        } else {
            return Err(InjectError::AmbiguousBinding {
                resource: binding.resource.to_string(),
                first: kept[at].source.to_string(),
                second: binding.source.to_string(),
            });
        }
    }
    Ok(kept)
}
