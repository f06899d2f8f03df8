//! Reified type descriptions.
//!
//! Rust erases nothing at runtime, but it also offers no way to ask "is `A<B>`
//! assignable to `A<? extends C>`" about arbitrary values. Bindings and requests
//! therefore carry an explicit [`Type`]: a [`RawType`] identity plus ordered type
//! arguments, an array marker and a lower-bound (wildcard) marker.
//!
//! ```
//! use bindery::types::{RawType, Type};
//!
//! struct Number;
//! struct Integer;
//!
//! let number = RawType::of::<Number>();
//! let integer = Type::raw(RawType::of::<Integer>().extending([number.clone()]));
//!
//! assert!(integer.is_assignable_to(&Type::raw(number).lower_bound()));
//! ```

mod instance;
mod name;
mod raw;

pub use instance::Instance;
pub use name::Name;
pub use raw::RawType;

use std::fmt;
use std::sync::Arc;

/// A fully described type: raw identity plus type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Type {
    raw: RawType,
    parameters: Arc<[Type]>,
    lower_bound: bool,
}

impl Type {
    /// The type of `T` without any type arguments.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::raw(RawType::of::<T>())
    }

    pub fn raw(raw: RawType) -> Self {
        Self {
            raw,
            parameters: Arc::from([]),
            lower_bound: false,
        }
    }

    /// `?`, the wildcard every type is assignable to.
    pub fn wildcard() -> Self {
        Self::raw(RawType::object()).lower_bound()
    }

    /// An array (sequence) whose elements are of type `element`.
    pub fn array_of(element: Type) -> Self {
        Self {
            raw: RawType::array(),
            parameters: Arc::from([element]),
            lower_bound: false,
        }
    }

    /// The same type with the given type arguments.
    pub fn parameterized(self, parameters: impl IntoIterator<Item = Type>) -> Self {
        Self {
            parameters: parameters.into_iter().collect(),
            ..self
        }
    }

    /// `? extends self`
    pub fn lower_bound(self) -> Self {
        Self {
            lower_bound: true,
            ..self
        }
    }

    /// The same type without the lower-bound marker.
    pub fn exact(self) -> Self {
        Self {
            lower_bound: false,
            ..self
        }
    }

    pub fn raw_type(&self) -> &RawType {
        &self.raw
    }

    pub fn parameters(&self) -> &[Type] {
        &self.parameters
    }

    pub fn parameter(&self, index: usize) -> Option<&Type> {
        self.parameters.get(index)
    }

    pub fn is_parameterized(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn is_lower_bound(&self) -> bool {
        self.lower_bound
    }

    pub fn is_wildcard(&self) -> bool {
        self.lower_bound && self.raw.is_object()
    }

    pub fn is_array(&self) -> bool {
        self.raw.is_array()
    }

    pub fn is_unidimensional_array(&self) -> bool {
        self.element_type().is_some_and(|element| !element.is_array())
    }

    /// The element type; `None` unless this is an array type.
    pub fn element_type(&self) -> Option<&Type> {
        if self.is_array() {
            self.parameters.first()
        } else {
            None
        }
    }

    /// Whether a value of this type can be used where `other` is expected.
    ///
    /// Raw identities must be in a subtype relation and arrays are covariant
    /// in their element. Arguments must be equal unless the expected argument
    /// is a lower bound; a type without arguments is unchecked and matches any
    /// parameterization. A lower bound stands for some unknown type within
    /// the bound, so it is met by any type inside it.
    pub fn is_assignable_to(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        if other.is_array() {
            return match (self.element_type(), other.element_type()) {
                (Some(element), Some(other_element)) => element.is_assignable_to(other_element),
                _ => false,
            };
        }
        if self.lower_bound && !other.lower_bound {
            return other.raw.is_subtype_of(&self.raw) && other.arguments_assignable_to(self);
        }
        self.raw.is_subtype_of(&other.raw) && self.arguments_assignable_to(other)
    }

    fn arguments_assignable_to(&self, other: &Type) -> bool {
        if !self.is_parameterized() || !other.is_parameterized() {
            return true;
        }
        self.raw == other.raw
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(other.parameters.iter())
                .all(|(parameter, other_parameter)| parameter.is_argument_for(other_parameter))
    }

    // arguments are invariant unless a bound is involved
    fn is_argument_for(&self, other: &Type) -> bool {
        if self.lower_bound || other.lower_bound {
            self.is_assignable_to(other)
        } else {
            self.raw == other.raw && self.arguments_assignable_to(other)
        }
    }

    /// Lower ranks are more precise: exact arguments, then wildcard arguments,
    /// then raw, then lower bound.
    pub(crate) fn precision(&self) -> u8 {
        if self.lower_bound {
            3
        } else if !self.is_parameterized() {
            2
        } else if self.parameters.iter().all(Type::is_exact) {
            0
        } else {
            1
        }
    }

    fn is_exact(&self) -> bool {
        !self.lower_bound && self.parameters.iter().all(Type::is_exact)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = self.element_type() {
            return write!(f, "{element}[]");
        }
        if self.is_wildcard() {
            return f.write_str("?");
        }
        if self.lower_bound {
            f.write_str("? extends ")?;
        }
        f.write_str(self.raw.name())?;
        if self.is_parameterized() {
            f.write_str("<")?;
            for (i, parameter) in self.parameters.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{parameter}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}
