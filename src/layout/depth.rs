use crate::config::{Extent, NodeAlign};

use super::{SankeyGraph, SankeyNode};

/// Assigns `depth` and `height` by breadth-first frontiers over the
/// non-circular links, then places every node in a column. Returns the number
/// of columns.
pub(super) fn compute_node_depths(
    graph: &mut SankeyGraph,
    align: &NodeAlign,
    extent: &Extent,
    node_width: f64,
) -> usize {
    for node in &mut graph.nodes {
        node.depth = 0;
        node.height = 0;
    }

    let columns = sweep(graph, Sweep::Depth);
    sweep(graph, Sweep::Height);

    if columns == 0 {
        return 0;
    }
    let kx = if columns > 1 {
        (extent.width() - node_width) / (columns - 1) as f64
    } else {
        0.0
    };
    let last = (columns - 1) as f64;
    let placed: Vec<f64> = graph
        .nodes
        .iter()
        .map(|node| {
            let column = align_column(align, node, graph, columns).floor();
            if column.is_nan() { 0.0 } else { column.clamp(0.0, last) }
        })
        .collect();
    for (node, column) in graph.nodes.iter_mut().zip(placed) {
        node.x0 = extent.x0 + column * kx;
        node.x1 = node.x0 + node_width;
    }
    columns
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Sweep {
    /// Forward along outgoing links; only keyed nodes take part.
    Depth,
    /// Backward along incoming links.
    Height,
}

fn sweep(graph: &mut SankeyGraph, direction: Sweep) -> usize {
    let SankeyGraph { nodes, links } = graph;
    let mut frontier: Vec<usize> = (0..nodes.len()).collect();
    let mut queued = vec![false; nodes.len()];
    let mut x = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        queued.fill(false);
        for &idx in &frontier {
            let node = &mut nodes[idx];
            let adjacent = match direction {
                Sweep::Depth => {
                    if node.id.is_none() {
                        continue;
                    }
                    node.depth = x;
                    &node.source_links
                }
                Sweep::Height => {
                    node.height = x;
                    &node.target_links
                }
            };
            for &link_idx in adjacent {
                let link = &links[link_idx];
                if link.circular {
                    continue;
                }
                let neighbor = match direction {
                    Sweep::Depth => link.target,
                    Sweep::Height => link.source,
                };
                if !queued[neighbor] {
                    queued[neighbor] = true;
                    next.push(neighbor);
                }
            }
        }
        frontier = next;
        x += 1;
    }
    x
}

/// Unclamped column for `node` under `align`.
pub fn align_column(align: &NodeAlign, node: &SankeyNode, graph: &SankeyGraph, columns: usize) -> f64 {
    let last = columns as f64 - 1.0;
    match align {
        NodeAlign::Left => node.depth as f64,
        NodeAlign::Right => last - node.height as f64,
        NodeAlign::Justify => {
            if node.source_links.is_empty() {
                last
            } else {
                node.depth as f64
            }
        }
        NodeAlign::Center => {
            if !node.target_links.is_empty() {
                node.depth as f64
            } else if !node.source_links.is_empty() {
                let nearest = node
                    .source_links
                    .iter()
                    .map(|&idx| graph.target_of(graph.link(idx)).depth)
                    .min()
                    .unwrap_or(0);
                nearest as f64 - 1.0
            } else {
                0.0
            }
        }
        NodeAlign::Column(column) => *column,
        NodeAlign::Custom(column_of) => column_of(node, columns),
    }
}
