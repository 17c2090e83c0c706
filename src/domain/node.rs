// Copyright (c) 2025 - Cowboy AI, Inc.
//! JumpServer tree nodes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::path::{PathCodec, PathSet, RemotePath};

/// A node owned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: Uuid,
    pub full_value: RemotePath,
    /// Short name (last segment)
    pub value: String,
}

/// Reference to a node as attached to hosts and grants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub id: Uuid,
    pub name: String,
}

impl From<&RemoteNode> for NodeRef {
    fn from(node: &RemoteNode) -> Self {
        Self {
            id: node.id,
            name: node.value.clone(),
        }
    }
}

/// Node inventory keyed by full path
#[derive(Debug, Clone, Default)]
pub struct NodeIndex {
    by_path: HashMap<RemotePath, RemoteNode>,
}

impl NodeIndex {
    pub fn new(nodes: impl IntoIterator<Item = RemoteNode>) -> Self {
        Self {
            by_path: nodes
                .into_iter()
                .map(|node| (node.full_value.clone(), node))
                .collect(),
        }
    }

    pub fn get(&self, path: &RemotePath) -> Option<&RemoteNode> {
        self.by_path.get(path)
    }

    pub fn contains(&self, path: &RemotePath) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn insert(&mut self, node: RemoteNode) {
        self.by_path.insert(node.full_value.clone(), node);
    }

    pub fn remove(&mut self, path: &RemotePath) -> Option<RemoteNode> {
        self.by_path.remove(path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RemoteNode> {
        self.by_path.values()
    }

    /// Node references for every department that already exists remotely.
    ///
    /// Departments with no matching node are dropped silently.
    pub fn resolve(&self, codec: &PathCodec, departments: &PathSet) -> Vec<NodeRef> {
        departments
            .iter()
            .filter_map(|path| self.get(&codec.to_remote(path)))
            .map(NodeRef::from)
            .collect()
    }
}
