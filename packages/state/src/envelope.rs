//! The Envelope type - one node of a component state tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StateError};
use crate::schema::Schema;
use crate::value::StateMap;

/// Format tag written into every envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Conventional path of a tree's root node.
pub const ROOT_PATH: &str = "root";

/// A serializable state tree node.
///
/// Identifies the component type that owns the node, its address in the tree,
/// its current state payload and its children keyed by child path.
///
/// # Sharing
///
/// Children are held behind `Arc`. Cloning an envelope is shallow: the clone
/// shares every child subtree with the original. Mutation goes through
/// [`Envelope::child_mut`], which copies a shared child before handing out
/// `&mut`, so an envelope held elsewhere never observes the change.
///
/// # Wire format
///
/// ```json
/// {"v":1,"root":"Counter","path":"root","data":{"count":0},"children":{}}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "v", default = "default_version")]
    pub schema_version: u32,

    #[serde(rename = "root")]
    pub component_id: String,

    pub path: String,

    #[serde(default)]
    pub data: StateMap,

    #[serde(default)]
    pub children: BTreeMap<String, Arc<Envelope>>,
}

fn default_version() -> u32 {
    SCHEMA_VERSION
}

impl Envelope {
    /// Build the envelope of a freshly rendered component instance.
    pub fn initial(component_id: impl Into<String>, schema: &Schema, path: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            component_id: component_id.into(),
            path: path.into(),
            data: schema.defaults(),
            children: BTreeMap::new(),
        }
    }

    /// Address of a child under `parent`.
    pub fn child_path(parent: &str, segment: &str) -> String {
        format!("{}/{}", parent, segment)
    }

    /// Attach a child, keyed by its own path.
    #[must_use]
    pub fn with_child(mut self, child: Envelope) -> Self {
        self.insert_child(child);
        self
    }

    /// Attach or replace a child, keyed by its own path.
    pub fn insert_child(&mut self, child: Envelope) {
        self.children.insert(child.path.clone(), Arc::new(child));
    }

    /// The child key to descend into when looking for `target` below this node.
    ///
    /// An exact key wins. Otherwise the child whose path is an ancestor of
    /// `target` (`target` starts with `"{key}/"`) is chosen, which lets
    /// lookups reach nodes more than one level down.
    pub fn next_hop(&self, target: &str) -> Option<&str> {
        if let Some((key, _)) = self.children.get_key_value(target) {
            return Some(key.as_str());
        }
        self.children
            .keys()
            .find(|key| {
                target
                    .strip_prefix(key.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            })
            .map(String::as_str)
    }

    /// Find the node addressed by `target`.
    pub fn find(&self, target: &str) -> Option<&Envelope> {
        if self.path == target {
            return Some(self);
        }
        let key = self.next_hop(target)?;
        self.children.get(key)?.find(target)
    }

    /// Mutable access to a child, unsharing it first if needed.
    pub fn child_mut(&mut self, key: &str) -> Option<&mut Envelope> {
        self.children.get_mut(key).map(Arc::make_mut)
    }

    /// Total number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .values()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    pub fn is_supported_version(&self) -> bool {
        self.schema_version == SCHEMA_VERSION
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| StateError::encode(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StateError::decode(e.to_string()))
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| StateError::encode(e.to_string()))
    }

    pub fn from_json_value(json: serde_json::Value) -> Result<Self> {
        serde_json::from_value(json).map_err(|e| StateError::decode(e.to_string()))
    }
}
