//! Usage collection - counts how often each node is reached from a root.

use std::collections::HashMap;

use crate::error::ResolveError;
use crate::graph::SchemaGraph;
use crate::node::NodeId;

/// Reference counts per node identity, computed over a whole graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageMap {
    counts: HashMap<NodeId, usize>,
}

impl UsageMap {
    /// How many times `node` was encountered; 0 if unreachable.
    pub fn count(&self, node: NodeId) -> usize {
        self.counts.get(&node).copied().unwrap_or(0)
    }

    /// Number of distinct reachable nodes.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }
}

/// Count every encounter of every node reachable from `root`.
///
/// A node's children are walked only on its first encounter, so a node
/// reached along two paths, or through a self reference, ends with a count
/// above one while the walk still terminates.
///
/// # Errors
///
/// Returns `ResolveError` if a reachable handle is foreign to the graph or
/// was reserved and never defined.
pub fn collect(graph: &SchemaGraph, root: NodeId) -> Result<UsageMap, ResolveError> {
    let mut usage = UsageMap::default();
    visit(graph, root, &mut usage.counts)?;
    tracing::trace!(root = %root, nodes = usage.len(), "collected node usage");
    Ok(usage)
}

fn visit(
    graph: &SchemaGraph,
    id: NodeId,
    counts: &mut HashMap<NodeId, usize>,
) -> Result<(), ResolveError> {
    let count = counts.entry(id).or_insert(0);
    *count += 1;
    if *count > 1 {
        return Ok(());
    }

    let node = lookup(graph, id)?;
    for child in node.children() {
        visit(graph, child, counts)?;
    }
    Ok(())
}

pub(crate) fn lookup(graph: &SchemaGraph, id: NodeId) -> Result<&crate::node::Node, ResolveError> {
    if !graph.contains(id) {
        return Err(ResolveError::UnknownNode { node: id });
    }
    graph
        .get(id)
        .ok_or(ResolveError::UndefinedNode { node: id })
}
