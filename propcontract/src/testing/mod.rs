//! Testing utilities for contracts and serialization passes.
//!
//! This module provides:
//! - Fixture types with ready-made contracts
//! - Assertions over serialized JSON objects

mod assertions;
mod fixtures;

pub use assertions::{assert_field_absent, assert_field_eq, assert_fields};
pub use fixtures::{
    linked_pair, node_contract, person_contract, serializer_with_fixtures, Node, Person,
};
