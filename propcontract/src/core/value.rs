//! In-memory member values and shared object handles.

use parking_lot::{MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::TypeKey;

/// A container instance as seen by accessors and predicates.
pub type Instance = dyn Any + Send + Sync;

/// Shared, lockable handle to an object instance.
///
/// Cloning the handle shares the instance; equality is identity. This is
/// what makes reference loops and reference preservation observable.
#[derive(Clone)]
pub struct ObjectRef {
    type_key: TypeKey,
    cell: Arc<RwLock<Box<Instance>>>,
}

impl ObjectRef {
    /// Wraps a value in a new shared handle.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            cell: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// Wraps an already boxed instance; `type_key` must describe its concrete type.
    #[must_use]
    pub fn from_boxed(type_key: TypeKey, instance: Box<Instance>) -> Self {
        Self {
            type_key,
            cell: Arc::new(RwLock::new(instance)),
        }
    }

    /// Runtime type of the instance.
    #[must_use]
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Stable identity of the shared instance.
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.cell).cast::<()>() as usize
    }

    /// True when both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// Locks the instance for reading.
    pub fn read(&self) -> MappedRwLockReadGuard<'_, Instance> {
        RwLockReadGuard::map(self.cell.read(), |boxed| &**boxed)
    }

    /// Locks the instance for writing.
    pub fn write(&self) -> MappedRwLockWriteGuard<'_, Instance> {
        RwLockWriteGuard::map(self.cell.write(), |boxed| &mut **boxed)
    }

    /// Runs `f` against the instance if it is a `T`.
    pub fn with<T: Any, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        guard.downcast_ref::<T>().map(f)
    }

    /// Runs `f` against the instance mutably if it is a `T`.
    pub fn with_mut<T: Any, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        guard.downcast_mut::<T>().map(f)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{:#x})", self.type_key, self.addr())
    }
}

/// A member's value in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MemberValue {
    /// Absent or null.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    String(String),
    /// A list of values.
    List(Vec<MemberValue>),
    /// A shared object.
    Object(ObjectRef),
}

impl MemberValue {
    /// True for [`MemberValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The object handle, if this is an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Object(_) => "object",
        }
    }
}

impl From<bool> for MemberValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MemberValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for MemberValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for MemberValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MemberValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MemberValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<ObjectRef> for MemberValue {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

/// Plain Rust field types that map onto [`MemberValue`].
pub trait MemberType: Sized {
    /// Converts the field value into a member value.
    fn into_member(self) -> MemberValue;

    /// Converts a member value back, describing the mismatch on failure.
    fn from_member(value: MemberValue) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &MemberValue) -> String {
    format!("expected {expected}, found {}", value.kind())
}

impl MemberType for MemberValue {
    fn into_member(self) -> MemberValue {
        self
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        Ok(value)
    }
}

impl MemberType for bool {
    fn into_member(self) -> MemberValue {
        MemberValue::Bool(self)
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl MemberType for i64 {
    fn into_member(self) -> MemberValue {
        MemberValue::Int(self)
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::Int(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl MemberType for i32 {
    fn into_member(self) -> MemberValue {
        MemberValue::Int(i64::from(self))
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        let wide = i64::from_member(value)?;
        Self::try_from(wide).map_err(|_| format!("{wide} does not fit in i32"))
    }
}

impl MemberType for u32 {
    fn into_member(self) -> MemberValue {
        MemberValue::Int(i64::from(self))
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        let wide = i64::from_member(value)?;
        Self::try_from(wide).map_err(|_| format!("{wide} does not fit in u32"))
    }
}

impl MemberType for f64 {
    fn into_member(self) -> MemberValue {
        MemberValue::Float(self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::Float(f) => Ok(f),
            MemberValue::Int(i) => Ok(i as Self),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl MemberType for String {
    fn into_member(self) -> MemberValue {
        MemberValue::String(self)
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl MemberType for ObjectRef {
    fn into_member(self) -> MemberValue {
        MemberValue::Object(self)
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::Object(o) => Ok(o),
            other => Err(mismatch("object", &other)),
        }
    }
}

impl<T: MemberType> MemberType for Option<T> {
    fn into_member(self) -> MemberValue {
        self.map_or(MemberValue::Null, MemberType::into_member)
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::Null => Ok(None),
            other => T::from_member(other).map(Some),
        }
    }
}

impl<T: MemberType> MemberType for Vec<T> {
    fn into_member(self) -> MemberValue {
        MemberValue::List(self.into_iter().map(MemberType::into_member).collect())
    }

    fn from_member(value: MemberValue) -> Result<Self, String> {
        match value {
            MemberValue::List(items) => items.into_iter().map(T::from_member).collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}
