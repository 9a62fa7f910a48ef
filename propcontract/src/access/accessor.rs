//! Value accessors: get and set one member on a container instance.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::core::{Instance, MemberType, MemberValue};
use crate::errors::AccessError;

/// Capability to read and write one member of a container instance.
///
/// An accessor is built against one concrete instance layout. Handing it an
/// instance of another shape fails with [`AccessError`].
pub trait ValueAccessor: Send + Sync {
    /// Reads the member.
    fn get(&self, instance: &Instance) -> Result<MemberValue, AccessError>;

    /// Writes the member.
    fn set(&self, instance: &mut Instance, value: MemberValue) -> Result<(), AccessError>;

    /// False for read-only accessors.
    fn can_set(&self) -> bool {
        true
    }
}

/// Accessors are shared between contracts and passes.
pub type SharedAccessor = Arc<dyn ValueAccessor>;

type Getter<T> = Box<dyn Fn(&T) -> MemberValue + Send + Sync>;
type Setter<T> = Box<dyn Fn(&mut T, MemberValue) -> Result<(), String> + Send + Sync>;

/// Accessor over a typed Rust struct, built from closures.
pub struct FieldAccessor<T> {
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T: Any + Send + Sync> FieldAccessor<T> {
    /// Creates an accessor from a getter and a fallible setter.
    pub fn new<G, S>(getter: G, setter: S) -> Self
    where
        G: Fn(&T) -> MemberValue + Send + Sync + 'static,
        S: Fn(&mut T, MemberValue) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            getter: Box::new(getter),
            setter: Some(Box::new(setter)),
        }
    }

    /// Creates an accessor with no setter.
    pub fn read_only<G>(getter: G) -> Self
    where
        G: Fn(&T) -> MemberValue + Send + Sync + 'static,
    {
        Self {
            getter: Box::new(getter),
            setter: None,
        }
    }

    /// Creates an accessor for a plain field through its [`MemberType`] mapping.
    pub fn field<F, R, W>(read: R, write: W) -> Self
    where
        F: MemberType + Clone + 'static,
        R: Fn(&T) -> &F + Send + Sync + 'static,
        W: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        Self::new(
            move |instance: &T| read(instance).clone().into_member(),
            move |instance: &mut T, value| {
                *write(instance) = F::from_member(value)?;
                Ok(())
            },
        )
    }

    /// Wraps the accessor for sharing.
    #[must_use]
    pub fn shared(self) -> SharedAccessor {
        Arc::new(self)
    }

    fn downcast<'a>(&self, instance: &'a Instance) -> Result<&'a T, AccessError> {
        instance
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::shape_mismatch(std::any::type_name::<T>()))
    }
}

impl<T: Any + Send + Sync> ValueAccessor for FieldAccessor<T> {
    fn get(&self, instance: &Instance) -> Result<MemberValue, AccessError> {
        let typed = self.downcast(instance)?;
        Ok((self.getter)(typed))
    }

    fn set(&self, instance: &mut Instance, value: MemberValue) -> Result<(), AccessError> {
        let setter = self.setter.as_ref().ok_or_else(AccessError::read_only)?;
        let typed = instance
            .downcast_mut::<T>()
            .ok_or_else(|| AccessError::shape_mismatch(std::any::type_name::<T>()))?;
        setter(typed, value).map_err(AccessError::invalid_value)
    }

    fn can_set(&self) -> bool {
        self.setter.is_some()
    }
}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("type", &std::any::type_name::<T>())
            .field("read_only", &self.setter.is_none())
            .finish()
    }
}

/// A schemaless record: member name to value.
pub type DynamicObject = BTreeMap<String, MemberValue>;

/// Accessor over a [`DynamicObject`] entry.
///
/// A missing entry reads as null.
#[derive(Debug, Clone)]
pub struct KeyedAccessor {
    key: String,
}

impl KeyedAccessor {
    /// Creates an accessor for `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Wraps the accessor for sharing.
    #[must_use]
    pub fn shared(self) -> SharedAccessor {
        Arc::new(self)
    }
}

impl ValueAccessor for KeyedAccessor {
    fn get(&self, instance: &Instance) -> Result<MemberValue, AccessError> {
        let record = instance
            .downcast_ref::<DynamicObject>()
            .ok_or_else(|| AccessError::shape_mismatch("DynamicObject"))?;
        Ok(record.get(&self.key).cloned().unwrap_or_default())
    }

    fn set(&self, instance: &mut Instance, value: MemberValue) -> Result<(), AccessError> {
        let record = instance
            .downcast_mut::<DynamicObject>()
            .ok_or_else(|| AccessError::shape_mismatch("DynamicObject"))?;
        record.insert(self.key.clone(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Account {
        owner: String,
        balance: i64,
        nickname: Option<String>,
    }

    #[test]
    fn test_field_accessor_get_set() {
        let accessor = FieldAccessor::field(|a: &Account| &a.balance, |a| &mut a.balance);
        let mut account = Account {
            balance: 10,
            ..Default::default()
        };

        assert_eq!(accessor.get(&account).unwrap(), MemberValue::Int(10));
        accessor.set(&mut account, MemberValue::Int(25)).unwrap();
        assert_eq!(account.balance, 25);
    }

    #[test]
    fn test_field_accessor_optional_field() {
        let accessor = FieldAccessor::field(|a: &Account| &a.nickname, |a| &mut a.nickname);
        let mut account = Account::default();

        assert_eq!(accessor.get(&account).unwrap(), MemberValue::Null);
        accessor.set(&mut account, "bob".into()).unwrap();
        assert_eq!(account.nickname.as_deref(), Some("bob"));
    }

    #[test]
    fn test_field_accessor_shape_mismatch() {
        let accessor = FieldAccessor::field(|a: &Account| &a.owner, |a| &mut a.owner);
        let wrong = String::from("not an account");

        let err = accessor.get(&wrong).unwrap_err();
        assert!(err.message.contains("Account"));
    }

    #[test]
    fn test_field_accessor_invalid_value() {
        let accessor = FieldAccessor::field(|a: &Account| &a.balance, |a| &mut a.balance);
        let mut account = Account::default();

        let err = accessor
            .set(&mut account, MemberValue::String("lots".into()))
            .unwrap_err();
        assert!(err.message.contains("expected integer"));
    }

    #[test]
    fn test_read_only_accessor() {
        let accessor =
            FieldAccessor::read_only(|a: &Account| MemberValue::Int(a.balance * 2));
        let mut account = Account {
            balance: 4,
            ..Default::default()
        };

        assert!(!accessor.can_set());
        assert_eq!(accessor.get(&account).unwrap(), MemberValue::Int(8));
        assert!(accessor.set(&mut account, MemberValue::Int(1)).is_err());
    }

    #[test]
    fn test_keyed_accessor() {
        let accessor = KeyedAccessor::new("color");
        let mut record = DynamicObject::new();

        assert_eq!(accessor.get(&record).unwrap(), MemberValue::Null);
        accessor.set(&mut record, "red".into()).unwrap();
        assert_eq!(record.get("color"), Some(&MemberValue::from("red")));
        assert!(accessor.get(&Account::default()).is_err());
    }
}
