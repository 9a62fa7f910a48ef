//! Runtime type identity and declared member types.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::MemberValue;

/// Identity of a concrete Rust type, used to look up its contract.
///
/// Equality and hashing use only the [`TypeId`]; the name is kept for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Returns the key for `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The full Rust type path.
    #[must_use]
    pub fn type_path(&self) -> &'static str {
        self.name
    }

    /// The last path segment, e.g. `Person` for `my_app::model::Person`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// The static type of a member.
///
/// Selects the default converter and drives default encoding rules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum DeclaredType {
    /// Any value; objects need a `$type` discriminator to be decoded.
    #[default]
    Any,
    /// A boolean.
    Bool,
    /// A signed 64-bit integer.
    Integer,
    /// A 64-bit float.
    Float,
    /// A string.
    String,
    /// A homogeneous list.
    List(Box<DeclaredType>),
    /// A nested object with a registered contract.
    Object(TypeKey),
}

impl DeclaredType {
    /// Shorthand for `List(Box::new(item))`.
    #[must_use]
    pub fn list_of(item: Self) -> Self {
        Self::List(Box::new(item))
    }

    /// Shorthand for `Object(TypeKey::of::<T>())`.
    #[must_use]
    pub fn object<T: Any>() -> Self {
        Self::Object(TypeKey::of::<T>())
    }

    /// Container-like types are reused in place under `ObjectCreationHandling::Auto`.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// The value a member of this type holds when nothing was assigned.
    #[must_use]
    pub fn implicit_default(&self) -> MemberValue {
        match self {
            Self::Bool => MemberValue::Bool(false),
            Self::Integer => MemberValue::Int(0),
            Self::Float => MemberValue::Float(0.0),
            Self::Any | Self::String | Self::List(_) | Self::Object(_) => MemberValue::Null,
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::Integer => write!(f, "integer"),
            Self::Float => write!(f, "float"),
            Self::String => write!(f, "string"),
            Self::List(item) => write!(f, "list<{item}>"),
            Self::Object(key) => write!(f, "{key}"),
        }
    }
}
