use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

/// Qualifier distinguishing several instances of the same type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Name {
    /// The unnamed instance.
    #[default]
    Default,
    /// Matches any name (`*`).
    Any,
    /// An exact name, or a prefix pattern when it ends in `*`.
    Named(Arc<str>),
}

impl Name {
    pub fn named(name: impl AsRef<str>) -> Self {
        match name.as_ref() {
            "" => Self::Default,
            "*" => Self::Any,
            name => Self::Named(Arc::from(name)),
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn is_pattern(&self) -> bool {
        self.prefix().is_some()
    }

    fn prefix(&self) -> Option<&str> {
        match self {
            Self::Named(name) => name.strip_suffix('*'),
            _ => None,
        }
    }

    /// Whether a binding qualified by `self` can serve a request for `requested`.
    pub fn is_applicable_for(&self, requested: &Name) -> bool {
        if self.is_any() || requested.is_any() || self == requested {
            return true;
        }
        match (self.prefix(), requested) {
            (Some(prefix), Self::Named(name)) => name.starts_with(prefix),
            _ => false,
        }
    }

    /// Exact names first, then patterns (longer prefix first), then any.
    pub(crate) fn specificity(&self) -> (u8, Reverse<usize>) {
        match (self, self.prefix()) {
            (Self::Any, _) => (2, Reverse(0)),
            (_, Some(prefix)) => (1, Reverse(prefix.len())),
            _ => (0, Reverse(0)),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => Ok(()),
            Self::Any => f.write_str("*"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}
