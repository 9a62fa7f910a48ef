//! Per-pass bookkeeping: the ancestor chain for loop detection and the
//! identifier table for reference preservation.

use std::collections::HashMap;

use crate::core::ObjectRef;

#[derive(Debug)]
struct Frame {
    object: ObjectRef,
    type_name: String,
    via: String,
}

/// Objects currently being written, outermost first.
#[derive(Debug, Default)]
pub(crate) struct AncestorChain {
    frames: Vec<Frame>,
}

impl AncestorChain {
    pub(crate) fn push(&mut self, object: &ObjectRef, type_name: &str, via: &str) {
        self.frames.push(Frame {
            object: object.clone(),
            type_name: type_name.to_string(),
            via: via.to_string(),
        });
    }

    pub(crate) fn pop(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn contains(&self, object: &ObjectRef) -> bool {
        self.frames.iter().any(|frame| frame.object.ptr_eq(object))
    }

    /// Path from the first occurrence of `object` back to itself, closed
    /// by `property`, e.g. `["A.b", "B.a", "A"]`.
    pub(crate) fn cycle_path(&self, object: &ObjectRef, property: &str) -> Vec<String> {
        let Some(start) = self
            .frames
            .iter()
            .position(|frame| frame.object.ptr_eq(object))
        else {
            return vec![property.to_string()];
        };

        let cycle = &self.frames[start..];
        let mut path: Vec<String> = cycle
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let outgoing = cycle.get(i + 1).map_or(property, |next| next.via.as_str());
                format!("{}.{outgoing}", frame.type_name)
            })
            .collect();
        path.push(cycle[0].type_name.clone());
        path
    }

    /// Property names from the root down, for depth diagnostics.
    pub(crate) fn path(&self) -> Vec<String> {
        self.frames.iter().map(|frame| frame.via.clone()).collect()
    }
}

/// `$id` assignments made during one serialization pass.
///
/// Holds a handle to every identified object so an address can never be
/// reused by a different instance within the pass.
#[derive(Debug, Default)]
pub(crate) struct ReferenceIds {
    ids: HashMap<usize, (String, ObjectRef)>,
    next: u64,
}

impl ReferenceIds {
    /// Existing id for `object`, if it has been written before.
    pub(crate) fn get(&self, object: &ObjectRef) -> Option<&str> {
        self.ids.get(&object.addr()).map(|(id, _)| id.as_str())
    }

    /// Assigns the next id to `object`.
    pub(crate) fn assign(&mut self, object: &ObjectRef) -> String {
        self.next += 1;
        let id = self.next.to_string();
        self.ids.insert(object.addr(), (id.clone(), object.clone()));
        id
    }
}
