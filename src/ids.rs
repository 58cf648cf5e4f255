//! Identity Assignment - stable small integers for model nodes
//!
//! Ids are keyed by structural position (declaration indices), not by where
//! a node happens to live in memory, so two parses of the same source agree.

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::Model;

/// Position of a node inside the [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NodeKey {
    Class(usize),
    /// `(class index, member index)`
    Member(usize, usize),
    Function(usize),
}

/// First id handed out.
pub const ID_BASE: usize = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    ids: IndexMap<NodeKey, usize>,
}

impl IdentityMap {
    /// Assigns ids in declaration order: each class followed by its members,
    /// then the free functions.
    pub fn populate(model: &Model) -> Self {
        let mut map = Self::default();
        for (ci, class) in model.classes.iter().enumerate() {
            map.assign(NodeKey::Class(ci));
            for mi in 0..class.members.len() {
                map.assign(NodeKey::Member(ci, mi));
            }
        }
        for fi in 0..model.functions.len() {
            map.assign(NodeKey::Function(fi));
        }
        map
    }

    fn assign(&mut self, key: NodeKey) -> usize {
        let next = ID_BASE + self.ids.len();
        *self.ids.entry(key).or_insert(next)
    }

    pub fn id(&self, key: NodeKey) -> Option<usize> {
        self.ids.get(&key).copied()
    }

    pub fn class_id(&self, class: usize) -> Option<usize> {
        self.id(NodeKey::Class(class))
    }

    pub fn member_id(&self, class: usize, member: usize) -> Option<usize> {
        self.id(NodeKey::Member(class, member))
    }

    pub fn function_id(&self, function: usize) -> Option<usize> {
        self.id(NodeKey::Function(function))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keys with their ids, in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, usize)> + '_ {
        self.ids.iter().map(|(k, v)| (*k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Class, Function, Member, PerPlatform};

    fn function(name: &str) -> Function {
        Function {
            name: name.to_string(),
            return_type: "void".to_string(),
            args: vec![],
            is_static: false,
            is_virtual: false,
            bindings: PerPlatform::default(),
        }
    }

    fn sample_model() -> Model {
        let class = |name: &str, members: Vec<Member>| Class {
            name: name.to_string(),
            superclasses: vec![],
            attributes: Default::default(),
            members,
        };
        Model {
            classes: vec![
                class("A", vec![
                    Member::Function(function("a1")),
                    Member::Field { name: "m_x".into(), ty: "int".into() },
                ]),
                class("B", vec![Member::Function(function("b1"))]),
            ],
            functions: vec![function("free")],
        }
    }

    #[test]
    fn test_declaration_order() {
        let ids = IdentityMap::populate(&sample_model());
        assert_eq!(ids.class_id(0), Some(0));
        assert_eq!(ids.member_id(0, 0), Some(1));
        assert_eq!(ids.member_id(0, 1), Some(2));
        assert_eq!(ids.class_id(1), Some(3));
        assert_eq!(ids.member_id(1, 0), Some(4));
        assert_eq!(ids.function_id(0), Some(5));
        assert_eq!(ids.member_id(1, 1), None);
    }

    #[test]
    fn test_ids_contiguous_and_unique() {
        let ids = IdentityMap::populate(&sample_model());
        let mut values: Vec<_> = ids.iter().map(|(_, id)| id).collect();
        values.sort_unstable();
        let expected: Vec<_> = (ID_BASE..ID_BASE + ids.len()).collect();
        assert_eq!(values, expected);
    }

    #[test]
    fn test_populate_is_idempotent() {
        let model = sample_model();
        assert_eq!(IdentityMap::populate(&model), IdentityMap::populate(&model));
    }

    #[test]
    fn test_reassign_keeps_first_id() {
        let mut ids = IdentityMap::populate(&sample_model());
        let before = ids.len();
        assert_eq!(ids.assign(NodeKey::Class(1)), 3);
        assert_eq!(ids.len(), before);
    }
}
