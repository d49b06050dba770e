use super::SankeyGraph;

/// Node value is the larger of its outgoing and incoming totals. A node
/// touching any circular link is part of a cycle and takes the lane of the
/// last such link, scanning outgoing links before incoming ones.
pub(super) fn compute_node_values(graph: &mut SankeyGraph) {
    let SankeyGraph { nodes, links } = graph;
    for node in nodes.iter_mut() {
        let outgoing: f64 = node.source_links.iter().map(|&idx| links[idx].value).sum();
        let incoming: f64 = node.target_links.iter().map(|&idx| links[idx].value).sum();
        node.value = outgoing.max(incoming);
        node.part_of_cycle = false;

        for &idx in node.source_links.iter().chain(node.target_links.iter()) {
            let link = &links[idx];
            if link.circular {
                node.part_of_cycle = true;
                node.circular_link_type = link.circular_link_type;
            }
        }
    }
}
