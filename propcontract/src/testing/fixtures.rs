//! Fixture types and their contracts.

use crate::access::FieldAccessor;
use crate::contract::{PropertyContract, TypeContract};
use crate::core::{DeclaredType, ObjectRef, Required};
use crate::ser::Serializer;
use crate::settings::SerializerSettings;

/// A flat record with a required name and an optional email.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Person {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: i64,
    /// Contact address.
    pub email: Option<String>,
}

impl Person {
    /// Creates a person without an email.
    #[must_use]
    pub fn new(name: impl Into<String>, age: i64) -> Self {
        Self {
            name: name.into(),
            age,
            email: None,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Contract for [`Person`]: `name` (required), `age`, `email`.
#[must_use]
pub fn person_contract() -> TypeContract {
    TypeContract::new::<Person>()
        .with_factory(Person::default)
        .with_property(
            PropertyContract::new("name", DeclaredType::String)
                .with_accessor(FieldAccessor::field(|p: &Person| &p.name, |p| &mut p.name).shared())
                .with_required(Required::Always),
        )
        .with_property(
            PropertyContract::new("age", DeclaredType::Integer)
                .with_accessor(FieldAccessor::field(|p: &Person| &p.age, |p| &mut p.age).shared()),
        )
        .with_property(
            PropertyContract::new("email", DeclaredType::String).with_accessor(
                FieldAccessor::field(|p: &Person| &p.email, |p| &mut p.email).shared(),
            ),
        )
}

/// A linked node; `next` may point back into the chain.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Node label.
    pub name: String,
    /// Following node.
    pub next: Option<ObjectRef>,
}

impl Node {
    /// Creates an unlinked node.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            next: None,
        }
    }
}

/// Contract for [`Node`]: `name`, `next`.
#[must_use]
pub fn node_contract() -> TypeContract {
    TypeContract::new::<Node>()
        .with_factory(Node::default)
        .with_property(
            PropertyContract::new("name", DeclaredType::String)
                .with_accessor(FieldAccessor::field(|n: &Node| &n.name, |n| &mut n.name).shared()),
        )
        .with_property(
            PropertyContract::new("next", DeclaredType::object::<Node>())
                .with_accessor(FieldAccessor::field(|n: &Node| &n.next, |n| &mut n.next).shared()),
        )
}

/// Two nodes pointing at each other: `a.next = b`, `b.next = a`.
#[must_use]
pub fn linked_pair(a: &str, b: &str) -> (ObjectRef, ObjectRef) {
    let first = ObjectRef::new(Node::new(a));
    let second = ObjectRef::new(Node {
        name: b.to_string(),
        next: Some(first.clone()),
    });
    first.with_mut(|node: &mut Node| node.next = Some(second.clone()));
    (first, second)
}

/// A serializer with the fixture contracts registered.
///
/// # Panics
///
/// Panics if the fixture contracts fail validation.
#[must_use]
pub fn serializer_with_fixtures(settings: SerializerSettings) -> Serializer {
    let serializer = Serializer::new(settings);
    for contract in [person_contract(), node_contract()] {
        if let Err(err) = serializer.register(contract) {
            panic!("fixture contract is invalid: {err}");
        }
    }
    serializer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_contracts_validate() {
        assert!(person_contract().validate().is_ok());
        assert!(node_contract().validate().is_ok());
    }

    #[test]
    fn test_linked_pair() {
        let (a, b) = linked_pair("a", "b");
        let next_of_a = a.with(|n: &Node| n.next.clone()).flatten().unwrap();
        let next_of_b = b.with(|n: &Node| n.next.clone()).flatten().unwrap();
        assert!(next_of_a.ptr_eq(&b));
        assert!(next_of_b.ptr_eq(&a));
    }
}
