mod breadth;
mod cycles;
mod depth;
mod error;
mod indexing;
mod link_breadth;
mod path;
pub(crate) mod types;
mod values;
pub use depth::align_column;
pub use error::*;
use link_breadth::compute_link_breadths;
pub use path::{
    circular_link_bounds, circular_link_path, horizontal_link_path, lane_offset, lane_y,
};
pub use types::*;

use crate::config::SankeyConfig;
use crate::ir::SankeySource;

/// Lays out a whole graph from scratch.
///
/// Stages run in order: indexing, cycle detection, lane assignment, node
/// values, columns, node breadths and finally link breadths. Every derived
/// field is recomputed; nothing carries over between runs.
pub fn compute_layout<S: SankeySource + ?Sized>(
    source: &S,
    config: &SankeyConfig,
) -> SankeyResult<SankeyGraph> {
    validate(config)?;
    let nodes = source.nodes();
    let links = source.links();
    let _span = tracing::debug_span!("sankey_layout", nodes = nodes.len(), links = links.len())
        .entered();

    let mut graph = indexing::compute_node_links(nodes, links, &config.node_id)?;
    let circular = cycles::identify_circular_links(&mut graph);
    cycles::assign_circular_lanes(&mut graph);
    tracing::debug!(circular, "classified circular links");

    values::compute_node_values(&mut graph);
    let columns = depth::compute_node_depths(
        &mut graph,
        &config.node_align,
        &config.extent,
        config.node_width,
    );
    tracing::debug!(columns, "assigned node columns");

    let ky = breadth::compute_node_breadths(
        &mut graph,
        &config.extent,
        config.node_padding,
        config.iterations,
    );
    tracing::debug!(ky, iterations = config.iterations, "relaxed node breadths");

    compute_link_breadths(&mut graph);
    Ok(graph)
}

/// Recomputes link slots only, for graphs whose nodes were moved after
/// layout.
pub fn update_link_breadths(graph: &mut SankeyGraph) -> &mut SankeyGraph {
    compute_link_breadths(graph);
    graph
}

/// SVG path for `link` using the lane geometry in `config`.
pub fn link_path(graph: &SankeyGraph, link: &SankeyLink, config: &SankeyConfig) -> String {
    path::link_path(graph, link, &config.extent, &config.cycle)
}

fn validate(config: &SankeyConfig) -> SankeyResult<()> {
    let e = &config.extent;
    let finite = [e.x0, e.y0, e.x1, e.y1].iter().all(|v| v.is_finite());
    if !finite || e.x1 < e.x0 || e.y1 < e.y0 {
        return Err(SankeyError::InvalidExtent {
            x0: e.x0,
            y0: e.y0,
            x1: e.x1,
            y1: e.y1,
        });
    }
    if !config.node_width.is_finite() || config.node_width < 0.0 {
        return Err(SankeyError::InvalidNodeWidth {
            width: config.node_width,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Extent;
    use crate::ir::SankeyInput;

    fn input(names: &[&str], links: &[(usize, usize, f64)]) -> SankeyInput {
        let mut input = SankeyInput::new();
        for name in names {
            input.ensure_node(name);
        }
        for (s, t, v) in links {
            input.push_link(*s, *t, *v);
        }
        input
    }

    fn config() -> SankeyConfig {
        SankeyConfig {
            extent: Extent::from_size(600.0, 400.0),
            ..Default::default()
        }
    }

    #[test]
    fn layout_places_a_chain_left_to_right() {
        let graph = compute_layout(
            &input(&["a", "b", "c"], &[(0, 1, 4.0), (1, 2, 4.0)]),
            &config(),
        )
        .unwrap();
        let a = graph.find_node("a").unwrap();
        let b = graph.find_node("b").unwrap();
        let c = graph.find_node("c").unwrap();
        assert!(a.x0 < b.x0 && b.x0 < c.x0);
        assert_eq!(c.x1, 600.0);
        assert!(graph.links.iter().all(|link| !link.circular));
    }

    #[test]
    fn layout_rejects_unknown_ids() {
        let mut source = input(&["a"], &[]);
        source.push_link("0", "7", 1.0);
        let err = compute_layout(&source, &config()).unwrap_err();
        assert_eq!(err, SankeyError::UnresolvedReference { id: "7".to_string() });
    }

    #[test]
    fn layout_rejects_inverted_extent() {
        let mut config = config();
        config.extent = Extent::new(10.0, 0.0, 0.0, 10.0);
        let err = compute_layout(&input(&["a"], &[]), &config).unwrap_err();
        assert!(matches!(err, SankeyError::InvalidExtent { .. }));
    }

    #[test]
    fn empty_graph_lays_out_to_nothing() {
        let graph = compute_layout(&SankeyInput::new(), &config()).unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }

    #[test]
    fn rerunning_layout_discards_previous_results() {
        let source = input(&["a", "b", "c"], &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0)]);
        let first = compute_layout(&source, &config()).unwrap();
        let second = compute_layout(&source, &config()).unwrap();
        let ids: Vec<Option<usize>> = second.links.iter().map(|l| l.circular_link_id).collect();
        assert_eq!(ids, vec![None, None, Some(0)]);
        for (a, b) in first.nodes.iter().zip(&second.nodes) {
            assert_eq!((a.y0, a.y1), (b.y0, b.y1));
        }
    }

    #[test]
    fn update_link_breadths_follows_moved_nodes() {
        let mut graph = compute_layout(
            &input(&["a", "b"], &[(0, 1, 2.0)]),
            &config(),
        )
        .unwrap();
        let before = graph.links[0].y1;
        graph.nodes[1].y0 += 25.0;
        graph.nodes[1].y1 += 25.0;
        update_link_breadths(&mut graph);
        assert!((graph.links[0].y1 - (before + 25.0)).abs() < 1e-9);
    }

    #[test]
    fn link_path_dispatches_on_circularity() {
        let graph = compute_layout(
            &input(&["a", "b"], &[(0, 1, 1.0), (1, 0, 1.0)]),
            &config(),
        )
        .unwrap();
        let forward = link_path(&graph, &graph.links[0], &config());
        let back = link_path(&graph, &graph.links[1], &config());
        assert_eq!(forward.matches('C').count(), 1);
        assert!(back.contains('H') && back.contains('V'));
    }

    #[test]
    fn update_link_breadths_reproduces_layout_slots() {
        let laid_out = compute_layout(
            &input(&["a", "b", "c"], &[(0, 1, 2.0), (0, 2, 1.0), (2, 0, 1.0)]),
            &config(),
        )
        .unwrap();
        let mut graph = laid_out.clone();
        for link in &mut graph.links {
            link.y0 = 0.0;
            link.y1 = 0.0;
        }
        let slots = |g: &SankeyGraph| -> Vec<(f64, f64)> {
            g.links.iter().map(|l| (l.y0, l.y1)).collect()
        };
        assert_eq!(slots(update_link_breadths(&mut graph)), slots(&laid_out));
    }
}

