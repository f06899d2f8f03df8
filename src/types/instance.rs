use super::{Name, Type};
use std::fmt;

/// A qualified type: what a binding provides and what a request asks for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instance {
    name: Name,
    ty: Type,
}

impl Instance {
    pub fn new(name: impl Into<Name>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    /// The default (unnamed) instance of `ty`.
    pub fn of(ty: Type) -> Self {
        Self::new(Name::Default, ty)
    }

    /// Any instance of `ty`, whatever its name.
    pub fn any_of(ty: Type) -> Self {
        Self::new(Name::Any, ty)
    }

    /// Any instance of any type.
    pub fn any() -> Self {
        Self::any_of(Type::wildcard())
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn typed(&self, ty: Type) -> Self {
        Self {
            name: self.name.clone(),
            ty,
        }
    }

    pub fn named(&self, name: impl Into<Name>) -> Self {
        Self {
            name: name.into(),
            ty: self.ty.clone(),
        }
    }

    pub fn is_any(&self) -> bool {
        self.name.is_any() && self.ty.is_wildcard()
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Name::Default => write!(f, "{}", self.ty),
            name => write!(f, "{} \"{}\"", self.ty, name),
        }
    }
}
