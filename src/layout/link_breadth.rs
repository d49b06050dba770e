use std::cmp::Ordering;

use super::{SankeyGraph, ascending_breadth};

/// Orders links at every node and assigns their vertical slots.
///
/// Acyclic links fill the node from `y0` downward; circular links fill it
/// from `y1` upward so loop-backs keep their own band. Only node extents are
/// read, so running it twice on the same positions gives the same result.
pub(super) fn compute_link_breadths(graph: &mut SankeyGraph) {
    for idx in 0..graph.nodes.len() {
        let mut outgoing = std::mem::take(&mut graph.nodes[idx].source_links);
        let mut incoming = std::mem::take(&mut graph.nodes[idx].target_links);
        let view = &*graph;
        outgoing.sort_by(|&a, &b| by_endpoint_breadth(view, a, b, |link| link.target));
        incoming.sort_by(|&a, &b| by_endpoint_breadth(view, a, b, |link| link.source));
        graph.nodes[idx].source_links = outgoing;
        graph.nodes[idx].target_links = incoming;
    }

    let SankeyGraph { nodes, links } = graph;
    for node in nodes.iter() {
        let mut y = node.y0;
        let mut y_cycle = node.y1;
        for &idx in &node.source_links {
            let link = &mut links[idx];
            if link.circular {
                link.y0 = y_cycle - link.width / 2.0;
                y_cycle -= link.width;
            } else {
                link.y0 = y + link.width / 2.0;
                y += link.width;
            }
        }

        let mut y = node.y0;
        let mut y_cycle = node.y1;
        for &idx in &node.target_links {
            let link = &mut links[idx];
            if link.circular {
                link.y1 = y_cycle - link.width / 2.0;
                y_cycle -= link.width;
            } else {
                link.y1 = y + link.width / 2.0;
                y += link.width;
            }
        }
    }
}

fn by_endpoint_breadth(
    graph: &SankeyGraph,
    a: usize,
    b: usize,
    endpoint: impl Fn(&super::SankeyLink) -> usize,
) -> Ordering {
    let link_a = &graph.links[a];
    let link_b = &graph.links[b];
    ascending_breadth(&graph.nodes[endpoint(link_a)], &graph.nodes[endpoint(link_b)])
        .then_with(|| link_a.index.cmp(&link_b.index))
}
