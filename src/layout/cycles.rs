use super::{CircularLinkType, SankeyGraph};

/// Marks links that would close a cycle, in link order.
///
/// A link is checked against the links accepted so far; only links that do
/// not close a cycle join the accepted set, so the accepted set stays acyclic.
/// The result therefore depends on link order. Circular links are numbered in
/// detection order. Returns the number of circular links.
pub(super) fn identify_circular_links(graph: &mut SankeyGraph) -> usize {
    let node_count = graph.nodes.len();
    let mut accepted_out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut search = Reachability::new(node_count);
    let mut circular_link_id = 0;

    for link in &mut graph.links {
        link.circular_link_type = None;
        if search.reaches(&accepted_out, link.target, link.source) {
            link.circular = true;
            link.circular_link_id = Some(circular_link_id);
            circular_link_id += 1;
        } else {
            link.circular = false;
            link.circular_link_id = None;
            accepted_out[link.source].push(link.target);
        }
    }

    circular_link_id
}

/// Gives every circular link a lane and copies it onto the nodes sharing an
/// id with either endpoint.
///
/// A link reuses its source's lane, else its target's; with neither set the
/// lane alternates by circular link id.
pub(super) fn assign_circular_lanes(graph: &mut SankeyGraph) {
    for node in &mut graph.nodes {
        node.circular_link_type = None;
    }

    for link_idx in 0..graph.links.len() {
        let link = &graph.links[link_idx];
        let Some(circular_link_id) = link.circular_link_id else {
            continue;
        };
        let source = &graph.nodes[link.source];
        let target = &graph.nodes[link.target];
        let lane = source
            .circular_link_type
            .or(target.circular_link_type)
            .unwrap_or_else(|| CircularLinkType::alternating(circular_link_id));
        let source_id = source.id.clone();
        let target_id = target.id.clone();

        graph.links[link_idx].circular_link_type = Some(lane);
        // Matching is by id over the whole node set, not by adjacency.
        for node in &mut graph.nodes {
            if node.id == source_id || node.id == target_id {
                node.circular_link_type = Some(lane);
            }
        }
    }
}

/// Iterative depth-first reachability over the accepted links.
struct Reachability {
    stack: Vec<usize>,
    seen: Vec<u32>,
    stamp: u32,
}

impl Reachability {
    fn new(node_count: usize) -> Self {
        Self {
            stack: Vec::new(),
            seen: vec![0; node_count],
            stamp: 0,
        }
    }

    fn reaches(&mut self, out: &[Vec<usize>], start: usize, goal: usize) -> bool {
        if start == goal {
            return true;
        }
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.seen.fill(0);
            self.stamp = 1;
        }
        self.stack.clear();
        self.stack.push(start);
        self.seen[start] = self.stamp;

        while let Some(node) = self.stack.pop() {
            for &next in &out[node] {
                if next == goal {
                    return true;
                }
                if self.seen[next] != self.stamp {
                    self.seen[next] = self.stamp;
                    self.stack.push(next);
                }
            }
        }
        false
    }
}
