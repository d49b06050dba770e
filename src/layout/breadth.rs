use crate::config::Extent;

use super::{CircularLinkType, SankeyGraph, SankeyNode, ascending_breadth};

/// Vertical placement of every node. Nodes are grouped into columns by `x0`,
/// stacked proportionally to their value, then relaxed toward the weighted
/// centre of their neighbours for `iterations` rounds. Returns the shared
/// value-to-pixel scale `ky`.
pub(super) fn compute_node_breadths(
    graph: &mut SankeyGraph,
    extent: &Extent,
    padding: f64,
    iterations: usize,
) -> f64 {
    let mut columns = group_columns(&graph.nodes);
    let ky = initialize_node_breadths(graph, &columns, extent, padding);
    resolve_collisions(&mut graph.nodes, &mut columns, extent, padding);

    let mut alpha = 1.0;
    for iteration in 0..iterations {
        alpha *= 0.99;
        tracing::trace!(iteration, alpha, "relaxing node breadths");
        relax_right_to_left(graph, &columns, alpha);
        resolve_collisions(&mut graph.nodes, &mut columns, extent, padding);
        relax_left_to_right(graph, &columns, alpha);
        resolve_collisions(&mut graph.nodes, &mut columns, extent, padding);
    }
    ky
}

/// Node indices grouped by equal `x0`, columns ascending, node order kept.
pub(super) fn group_columns(nodes: &[SankeyNode]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by(|&a, &b| nodes[a].x0.total_cmp(&nodes[b].x0));

    let mut columns: Vec<Vec<usize>> = Vec::new();
    let mut current_x = None;
    for idx in order {
        let x0 = nodes[idx].x0;
        if current_x == Some(x0) {
            if let Some(column) = columns.last_mut() {
                column.push(idx);
                continue;
            }
        }
        columns.push(vec![idx]);
        current_x = Some(x0);
    }
    columns
}

fn initialize_node_breadths(
    graph: &mut SankeyGraph,
    columns: &[Vec<usize>],
    extent: &Extent,
    padding: f64,
) -> f64 {
    let tightest = columns
        .iter()
        .filter_map(|column| {
            let total: f64 = column.iter().map(|&idx| graph.nodes[idx].value).sum();
            if total > 0.0 {
                Some((extent.height() - (column.len() - 1) as f64 * padding) / total)
            } else {
                None
            }
        })
        .fold(f64::INFINITY, f64::min);
    let ky = if tightest.is_finite() {
        tightest.max(0.0)
    } else {
        if !graph.nodes.is_empty() {
            tracing::warn!("no column carries any value; node heights collapse to zero");
        }
        0.0
    };

    for column in columns {
        let (cyclic, acyclic): (Vec<usize>, Vec<usize>) = column
            .iter()
            .copied()
            .partition(|&idx| graph.nodes[idx].part_of_cycle);

        let mut top = extent.y0;
        let mut bottom = extent.y1;
        for idx in cyclic {
            let node = &mut graph.nodes[idx];
            let size = node.value * ky;
            if node.circular_link_type == Some(CircularLinkType::Top) {
                node.y0 = top;
                node.y1 = top + size;
                top = node.y1 + padding;
            } else {
                node.y1 = bottom;
                node.y0 = bottom - size;
                bottom = node.y0 - padding;
            }
        }

        let stacked: f64 = acyclic
            .iter()
            .map(|&idx| graph.nodes[idx].value * ky)
            .sum::<f64>()
            + acyclic.len().saturating_sub(1) as f64 * padding;
        let mut y = (extent.y0 + extent.y1) / 2.0 - stacked / 2.0;
        for idx in acyclic {
            let node = &mut graph.nodes[idx];
            node.y0 = y;
            node.y1 = y + node.value * ky;
            y = node.y1 + padding;
        }
    }

    for link in &mut graph.links {
        link.width = link.value * ky;
    }
    ky
}

/// Pulls each node with outgoing links toward the value-weighted centre of
/// its targets, visiting columns right to left.
fn relax_right_to_left(graph: &mut SankeyGraph, columns: &[Vec<usize>], alpha: f64) {
    for column in columns.iter().rev() {
        for &idx in column {
            let node = &graph.nodes[idx];
            if node.source_links.is_empty() || (node.part_of_cycle && column.len() > 1) {
                continue;
            }
            let Some(center) = weighted_center(graph, &node.source_links, |link| link.target) else {
                continue;
            };
            let dy = (center - node.center()) * alpha;
            graph.nodes[idx].shift(dy);
        }
    }
}

/// Pulls each node with incoming links toward the value-weighted centre of
/// its sources, visiting columns left to right.
fn relax_left_to_right(graph: &mut SankeyGraph, columns: &[Vec<usize>], alpha: f64) {
    for column in columns {
        for &idx in column {
            let node = &graph.nodes[idx];
            if node.target_links.is_empty() || (node.part_of_cycle && column.len() > 1) {
                continue;
            }
            let Some(center) = weighted_center(graph, &node.target_links, |link| link.source) else {
                continue;
            };
            let dy = (center - node.center()) * alpha;
            graph.nodes[idx].shift(dy);
        }
    }
}

/// Value-weighted mean centre of the far endpoints of `links`; `None` when
/// the links carry no value.
fn weighted_center(
    graph: &SankeyGraph,
    links: &[usize],
    far_end: impl Fn(&super::SankeyLink) -> usize,
) -> Option<f64> {
    let mut weighted = 0.0;
    let mut total = 0.0;
    for &link_idx in links {
        let link = &graph.links[link_idx];
        weighted += graph.nodes[far_end(link)].center() * link.value;
        total += link.value;
    }
    (total != 0.0).then(|| weighted / total)
}

/// Sorts each column by breadth, pushes overlapping nodes down, then pushes
/// the column back up if it overflows the bottom edge.
fn resolve_collisions(
    nodes: &mut [SankeyNode],
    columns: &mut [Vec<usize>],
    extent: &Extent,
    padding: f64,
) {
    for column in columns.iter_mut() {
        column.sort_by(|&a, &b| ascending_breadth(&nodes[a], &nodes[b]));

        let mut y = extent.y0;
        for &idx in column.iter() {
            let node = &mut nodes[idx];
            let dy = y - node.y0;
            if dy > 0.0 {
                node.shift(dy);
            }
            y = node.y1 + padding;
        }

        let overflow = y - padding - extent.y1;
        let Some((&last, rest)) = column.split_last() else {
            continue;
        };
        if overflow > 0.0 {
            nodes[last].shift(-overflow);
            let mut y = nodes[last].y0;
            for &idx in rest.iter().rev() {
                let node = &mut nodes[idx];
                let dy = node.y1 + padding - y;
                if dy > 0.0 {
                    node.shift(-dy);
                }
                y = node.y0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NodeAlign, NodeIdentity};
    use crate::ir::{LinkSpec, NodeSpec};
    use crate::layout::cycles::{assign_circular_lanes, identify_circular_links};
    use crate::layout::depth::compute_node_depths;
    use crate::layout::indexing::compute_node_links;
    use crate::layout::values::compute_node_values;

    const EPS: f64 = 1e-9;

    fn positioned(nodes: usize, links: &[(usize, usize, f64)], extent: &Extent) -> SankeyGraph {
        let mut graph = compute_node_links(
            (0..nodes).map(|i| NodeSpec::named(format!("n{i}"))).collect(),
            links
                .iter()
                .map(|(s, t, v)| LinkSpec::new(*s, *t, *v))
                .collect(),
            &NodeIdentity::Index,
        )
        .unwrap();
        identify_circular_links(&mut graph);
        assign_circular_lanes(&mut graph);
        compute_node_values(&mut graph);
        compute_node_depths(&mut graph, &NodeAlign::Justify, extent, 10.0);
        graph
    }

    #[test]
    fn groups_columns_by_x0() {
        let extent = Extent::from_size(110.0, 100.0);
        let graph = positioned(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0)], &extent);
        let columns = group_columns(&graph.nodes);
        assert_eq!(columns, vec![vec![0], vec![1], vec![2, 3]]);
    }

    #[test]
    fn tightest_column_sets_scale() {
        let extent = Extent::from_size(110.0, 100.0);
        let mut graph = positioned(3, &[(0, 2, 10.0), (1, 2, 10.0)], &extent);
        let ky = compute_node_breadths(&mut graph, &extent, 10.0, 0);
        // Column 0 holds two nodes of 10 with one gap: (100 - 10) / 20.
        assert!((ky - 4.5).abs() < EPS);
        assert!((graph.links[0].width - 45.0).abs() < EPS);
        assert!((graph.nodes[0].y0 - 0.0).abs() < EPS);
        assert!((graph.nodes[1].y1 - 100.0).abs() < EPS);
        assert!((graph.nodes[2].y0 - 5.0).abs() < EPS);
        assert!((graph.nodes[2].y1 - 95.0).abs() < EPS);
    }

    #[test]
    fn columns_stay_in_bounds_without_overlap() {
        let extent = Extent::from_size(200.0, 300.0);
        let links = [
            (0, 3, 5.0),
            (0, 4, 3.0),
            (1, 3, 2.0),
            (1, 5, 7.0),
            (2, 4, 4.0),
            (3, 6, 6.0),
            (4, 6, 7.0),
            (5, 6, 7.0),
        ];
        let mut graph = positioned(7, &links, &extent);
        compute_node_breadths(&mut graph, &extent, 8.0, 32);
        for column in group_columns(&graph.nodes) {
            let mut spans: Vec<(f64, f64)> = column
                .iter()
                .map(|&idx| (graph.nodes[idx].y0, graph.nodes[idx].y1))
                .collect();
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));
            for (y0, y1) in &spans {
                assert!(*y0 >= extent.y0 - EPS && *y1 <= extent.y1 + EPS);
            }
            for pair in spans.windows(2) {
                assert!(pair[1].0 - pair[0].1 >= 8.0 - 1e-6);
            }
        }
    }

    #[test]
    fn cyclic_nodes_stack_from_their_lane_edge() {
        let extent = Extent::from_size(110.0, 100.0);
        // 0 -> 1 -> 2 with a back link 2 -> 1 (bottom lane), plus 3 -> 2.
        let mut graph = positioned(
            4,
            &[(0, 1, 2.0), (1, 2, 2.0), (2, 1, 1.0), (3, 2, 1.0)],
            &extent,
        );
        assert!(graph.links[2].circular);
        let columns = group_columns(&graph.nodes);
        initialize_node_breadths(&mut graph, &columns, &extent, 5.0);
        let cyclic_bottom = &graph.nodes[1];
        assert_eq!(cyclic_bottom.circular_link_type, Some(CircularLinkType::Bottom));
        assert!((cyclic_bottom.y1 - extent.y1).abs() < EPS);
    }

    #[test]
    fn zero_value_graph_collapses_without_nan() {
        let extent = Extent::from_size(110.0, 100.0);
        let mut graph = positioned(2, &[(0, 1, 0.0)], &extent);
        let ky = compute_node_breadths(&mut graph, &extent, 8.0, 4);
        assert_eq!(ky, 0.0);
        for node in &graph.nodes {
            assert!(node.y0.is_finite() && node.y1.is_finite());
            assert_eq!(node.y1 - node.y0, 0.0);
        }
    }

    #[test]
    fn overflowing_column_is_pushed_back_up() {
        let extent = Extent::from_size(100.0, 50.0);
        let mut nodes: Vec<SankeyNode> = (0..2)
            .map(|i| {
                let mut node = SankeyNode::new(Some(i.to_string()), None, i);
                node.y0 = 30.0;
                node.y1 = 50.0;
                node
            })
            .collect();
        let mut columns = vec![vec![0, 1]];
        resolve_collisions(&mut nodes, &mut columns, &extent, 10.0);
        assert!((nodes[1].y1 - 50.0).abs() < EPS);
        assert!((nodes[1].y0 - 30.0).abs() < EPS);
        assert!((nodes[0].y1 - 20.0).abs() < EPS);
        assert!((nodes[0].y0 - 0.0).abs() < EPS);
    }

    #[test]
    fn top_lane_cyclic_nodes_start_at_the_top_edge() {
        let extent = Extent::from_size(110.0, 100.0);
        // Two independent loops: 0 <-> 1 takes the bottom lane, 2 <-> 3 the top.
        let mut graph = positioned(
            4,
            &[(0, 1, 1.0), (1, 0, 1.0), (2, 3, 1.0), (3, 2, 1.0)],
            &extent,
        );
        let columns = group_columns(&graph.nodes);
        assert_eq!(columns[0], vec![0, 2]);
        initialize_node_breadths(&mut graph, &columns, &extent, 5.0);

        let top = &graph.nodes[2];
        assert_eq!(top.circular_link_type, Some(CircularLinkType::Top));
        assert!((top.y0 - extent.y0).abs() < EPS);
        let bottom = &graph.nodes[0];
        assert_eq!(bottom.circular_link_type, Some(CircularLinkType::Bottom));
        assert!((bottom.y1 - extent.y1).abs() < EPS);
    }

    // 0 -> 1 (3), 0 -> 2, 1 -> 3 and the loop 3 -> 1: nodes 2 and 3 share the
    // last column and 3 is cyclic.
    const SHARED_COLUMN: [(usize, usize, f64); 4] =
        [(0, 1, 3.0), (0, 2, 1.0), (1, 3, 1.0), (3, 1, 1.0)];

    #[test]
    fn cyclic_node_in_shared_column_keeps_its_lane_edge_through_relaxation() {
        let extent = Extent::from_size(200.0, 120.0);
        let mut settled = positioned(4, &SHARED_COLUMN, &extent);
        compute_node_breadths(&mut settled, &extent, 8.0, 0);
        let mut relaxed = positioned(4, &SHARED_COLUMN, &extent);
        compute_node_breadths(&mut relaxed, &extent, 8.0, 32);

        let columns = group_columns(&relaxed.nodes);
        let last = columns.last().unwrap();
        assert!(last.contains(&3) && last.len() > 1);
        assert!(relaxed.nodes[3].part_of_cycle);
        assert!((settled.nodes[3].y1 - extent.y1).abs() < EPS);
        assert!((relaxed.nodes[3].y0 - settled.nodes[3].y0).abs() < 1e-6);
    }

    #[test]
    fn relaxation_skips_cyclic_nodes_in_shared_columns() {
        let extent = Extent::from_size(200.0, 120.0);
        let mut graph = positioned(4, &SHARED_COLUMN, &extent);
        compute_node_breadths(&mut graph, &extent, 8.0, 0);
        let columns = group_columns(&graph.nodes);

        // Pull node 2 far from its source; node 3 sits far from node 1 already.
        graph.nodes[2].y0 = 0.0;
        graph.nodes[2].y1 = 30.0;
        let pinned = (graph.nodes[3].y0, graph.nodes[3].y1);
        assert!((graph.nodes[3].center() - graph.nodes[1].center()).abs() > 1.0);

        relax_left_to_right(&mut graph, &columns, 1.0);
        assert!((graph.nodes[2].center() - graph.nodes[0].center()).abs() < EPS);
        assert_eq!((graph.nodes[3].y0, graph.nodes[3].y1), pinned);

        relax_right_to_left(&mut graph, &columns, 1.0);
        assert_eq!((graph.nodes[3].y0, graph.nodes[3].y1), pinned);
    }
}

