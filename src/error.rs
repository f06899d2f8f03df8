use thiserror::Error;

pub type Result<T> = std::result::Result<T, InjectError>;

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("No candidate for: {dependency}")]
    NoCandidate { dependency: String },

    #[error("Ambiguous binding for {resource}: declared by {first} and {second}")]
    AmbiguousBinding {
        resource: String,
        first: String,
        second: String,
    },

    #[error("Failed to construct {dependency} (bound by {origin})")]
    ConstructionFailure {
        dependency: String,
        origin: String,
        #[source]
        error: anyhow::Error,
    },

    #[error("Bootstrapping {bundle} failed")]
    BootstrapFailure {
        bundle: String,
        #[source]
        error: anyhow::Error,
    },

    #[error("Circular dependency detected: {cycle}")]
    DependencyCycle { cycle: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },
}

impl InjectError {
    pub(crate) fn no_candidate(dependency: impl ToString) -> Self {
        Self::NoCandidate {
            dependency: dependency.to_string(),
        }
    }

    pub fn is_no_candidate(&self) -> bool {
        matches!(self, Self::NoCandidate { .. })
    }
}
