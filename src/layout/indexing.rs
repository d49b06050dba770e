use std::collections::HashMap;

use crate::config::NodeIdentity;
use crate::ir::{LinkSpec, NodeRef, NodeSpec};

use super::{SankeyError, SankeyGraph, SankeyLink, SankeyNode, SankeyResult};

/// Builds the node/link arenas, resolving endpoints and filling each node's
/// `source_links` and `target_links` in link order.
pub(super) fn compute_node_links(
    nodes: Vec<NodeSpec>,
    links: Vec<LinkSpec>,
    identity: &NodeIdentity,
) -> SankeyResult<SankeyGraph> {
    let mut graph_nodes: Vec<SankeyNode> = nodes
        .iter()
        .enumerate()
        .map(|(idx, spec)| SankeyNode::new(identity.key(spec, idx), spec.name.clone(), idx))
        .collect();

    let graph_links = {
        let mut node_by_id: HashMap<&str, usize> = HashMap::with_capacity(graph_nodes.len());
        for node in &graph_nodes {
            if let Some(id) = node.id.as_deref() {
                node_by_id.insert(id, node.index);
            }
        }

        let mut resolved = Vec::with_capacity(links.len());
        for (idx, spec) in links.into_iter().enumerate() {
            let source = resolve(&node_by_id, &spec.source, graph_nodes.len())?;
            let target = resolve(&node_by_id, &spec.target, graph_nodes.len())?;
            resolved.push(SankeyLink::new(source, target, spec.value, idx));
        }
        resolved
    };

    for link in &graph_links {
        graph_nodes[link.source].source_links.push(link.index);
        graph_nodes[link.target].target_links.push(link.index);
    }

    Ok(SankeyGraph {
        nodes: graph_nodes,
        links: graph_links,
    })
}

fn resolve(node_by_id: &HashMap<&str, usize>, endpoint: &NodeRef, len: usize) -> SankeyResult<usize> {
    match endpoint {
        NodeRef::Index(index) if *index < len => Ok(*index),
        NodeRef::Index(index) => Err(SankeyError::NodeIndexOutOfRange { index: *index, len }),
        NodeRef::Id(id) => node_by_id
            .get(id.as_str())
            .copied()
            .ok_or_else(|| SankeyError::UnresolvedReference { id: id.clone() }),
    }
}
