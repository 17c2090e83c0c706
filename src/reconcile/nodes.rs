// Copyright (c) 2025 - Cowboy AI, Inc.
//! Node Reconciler
//!
//! Mirrors the CMDB department tree under the managed root.
//!
//! ```text
//! departments ──minimal_cover──> cover ──full_expansion──> expected
//!
//! creates = expected - remote      (shortest first)
//! deletes = remote(managed) - expected   (deepest first)
//! ```
//!
//! Planning is pure; [`NodeReconciler::apply`] performs the calls.

use std::collections::BTreeSet;
use tracing::{error, info, warn};

use crate::domain::{DottedPath, NodeIndex, PathCodec, PathSet, RemoteNode};
use crate::store::{RemoteStore, StoreResult};

/// Node operations for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePlan {
    /// Missing nodes, parents before children
    pub creates: Vec<DottedPath>,
    /// Orphaned managed nodes, children before parents
    pub deletes: Vec<RemoteNode>,
}

impl NodePlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.deletes.is_empty()
    }
}

/// Outcome of a node pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeReport {
    pub created: usize,
    pub deleted: usize,
    /// Failed creates (including skipped descendants) and failed deletes
    pub failed: usize,
}

/// Compute the node operations that make the managed subtree equal to the
/// ancestor closure of the minimal cover of `departments`.
pub fn plan_nodes(codec: &PathCodec, departments: &PathSet, index: &NodeIndex) -> NodePlan {
    let expected = departments.minimal_cover().full_expansion();

    let creates = expected
        .shortest_first()
        .into_iter()
        .filter(|path| !index.contains(&codec.to_remote(path)))
        .cloned()
        .collect();

    let mut deletes: Vec<(usize, RemoteNode)> = index
        .iter()
        .filter_map(|node| {
            let dotted = codec.to_dotted(&node.full_value).ok()?;
            (!expected.contains(&dotted)).then(|| (dotted.depth(), node.clone()))
        })
        .collect();
    deletes.sort_by(|(da, a), (db, b)| db.cmp(da).then_with(|| a.full_value.cmp(&b.full_value)));

    NodePlan {
        creates,
        deletes: deletes.into_iter().map(|(_, node)| node).collect(),
    }
}

/// Applies node plans against a [`RemoteStore`]
pub struct NodeReconciler<'a, S: RemoteStore + ?Sized> {
    store: &'a S,
    codec: &'a PathCodec,
}

impl<'a, S: RemoteStore + ?Sized> NodeReconciler<'a, S> {
    pub fn new(store: &'a S, codec: &'a PathCodec) -> Self {
        Self { store, codec }
    }

    /// Read the current node inventory
    pub async fn load_index(&self) -> StoreResult<NodeIndex> {
        Ok(NodeIndex::new(self.store.list_nodes().await?))
    }

    /// Read the inventory, then plan and apply.
    ///
    /// Empty `departments` skips the pass: an empty CMDB tree never
    /// empties the remote one. Only the inventory read can fail the call.
    pub async fn reconcile(&self, departments: &PathSet) -> StoreResult<(NodeReport, NodeIndex)> {
        let index = self.load_index().await?;
        if departments.is_empty() {
            warn!("No departments from CMDB, skipping node sync");
            return Ok((NodeReport::default(), index));
        }

        let plan = plan_nodes(self.codec, departments, &index);
        Ok(self.apply(plan, index).await)
    }

    /// Apply a plan, returning the report and the updated index
    pub async fn apply(&self, plan: NodePlan, mut index: NodeIndex) -> (NodeReport, NodeIndex) {
        let mut report = NodeReport::default();
        let mut failed: BTreeSet<DottedPath> = BTreeSet::new();

        for path in &plan.creates {
            if let Some(parent) = failed.iter().find(|f| f.is_strict_prefix_of(path)) {
                warn!(node = %path, parent = %parent, "Parent node missing, not creating");
                failed.insert(path.clone());
                report.failed += 1;
                continue;
            }

            let full_path = self.codec.to_remote(path);
            match self.store.create_node(path.name(), &full_path).await {
                Ok(node) => {
                    info!("Created node: {}", full_path);
                    index.insert(node);
                    report.created += 1;
                }
                Err(e) => {
                    error!("Failed to create node {}: {}", full_path, e);
                    failed.insert(path.clone());
                    report.failed += 1;
                }
            }
        }

        for node in &plan.deletes {
            match self.store.delete_node(node.id).await {
                Ok(()) => {
                    info!("Deleted node: {}", node.full_value);
                    index.remove(&node.full_value);
                    report.deleted += 1;
                }
                Err(e) => {
                    error!("Failed to delete node {}: {}", node.full_value, e);
                    report.failed += 1;
                }
            }
        }

        info!(
            "Node sync result: Created {}, Deleted {}, Failed {}",
            report.created, report.deleted, report.failed
        );
        (report, index)
    }
}
