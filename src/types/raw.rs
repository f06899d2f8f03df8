use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Top of the raw type hierarchy.
struct Object;

/// Raw identity shared by all array types.
struct Array;

/// Stable identity of a type, independent of type arguments.
///
/// Identity is the [`TypeId`] of the Rust type the raw type was created from;
/// the declared supertypes only feed [`RawType::is_subtype_of`].
#[derive(Clone)]
pub struct RawType {
    id: TypeId,
    path: &'static str,
    supertypes: Arc<[RawType]>,
}

impl RawType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
            supertypes: Arc::from([]),
        }
    }

    pub fn object() -> Self {
        Self::of::<Object>()
    }

    pub fn array() -> Self {
        Self::of::<Array>()
    }

    /// Declares additional supertypes of this raw type.
    pub fn extending(self, supertypes: impl IntoIterator<Item = RawType>) -> Self {
        let supertypes = self
            .supertypes
            .iter()
            .cloned()
            .chain(supertypes)
            .collect();
        Self { supertypes, ..self }
    }

    pub fn is_object(&self) -> bool {
        self.id == TypeId::of::<Object>()
    }

    pub fn is_array(&self) -> bool {
        self.id == TypeId::of::<Array>()
    }

    /// Reflexive and transitive over the declared supertypes; everything is a
    /// subtype of [`RawType::object`].
    pub fn is_subtype_of(&self, other: &RawType) -> bool {
        other.is_object()
            || self == other
            || self
                .supertypes
                .iter()
                .any(|supertype| supertype.is_subtype_of(other))
    }

    pub fn supertypes(&self) -> &[RawType] {
        &self.supertypes
    }

    /// The full path, e.g. `my_app::service::Mailer`.
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// The last path segment, e.g. `Mailer`.
    pub fn name(&self) -> &'static str {
        let path = self.unparameterized_path();
        path.rsplit_once("::").map_or(path, |(_, name)| name)
    }

    /// The module path the type is declared in, e.g. `my_app::service`.
    pub fn package(&self) -> &'static str {
        self.unparameterized_path()
            .rsplit_once("::")
            .map_or("", |(package, _)| package)
    }

    fn unparameterized_path(&self) -> &'static str {
        let path = self.path.strip_prefix("dyn ").unwrap_or(self.path);
        path.split_once('<').map_or(path, |(path, _)| path)
    }
}

impl PartialEq for RawType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RawType {}

impl Hash for RawType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl fmt::Display for RawType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
