use std::fmt::Write;

use crate::config::{CycleLaneConfig, Extent};

use super::{CircularLinkType, SankeyGraph, SankeyLink};

/// Signed distance of a circular link's lane from the forward-flow corridor.
/// Consecutive ids are `lane_width + lane_buffer` apart.
pub fn lane_offset(circular_link_id: usize, cycle: &CycleLaneConfig) -> f64 {
    cycle.lane_dist_from_fwd_paths
        - circular_link_id as f64 * (cycle.lane_width + cycle.lane_buffer)
}

/// Vertical position of the outer edge of a circular link's lane: above the
/// extent for the top lane, mirrored below it for the bottom lane.
pub fn lane_y(link: &SankeyLink, extent: &Extent, cycle: &CycleLaneConfig) -> f64 {
    let offset = lane_offset(link.circular_link_id.unwrap_or(0), cycle);
    match link.circular_link_type {
        Some(CircularLinkType::Bottom) => extent.y1 - offset,
        _ => extent.y0 + offset,
    }
}

/// SVG path for any link: a loop through its lane for circular links, a
/// horizontal cubic curve otherwise.
pub fn link_path(
    graph: &SankeyGraph,
    link: &SankeyLink,
    extent: &Extent,
    cycle: &CycleLaneConfig,
) -> String {
    if link.circular {
        circular_link_path(graph, link, extent, cycle)
    } else {
        horizontal_link_path(graph, link)
    }
}

/// Centre line from the source's right edge to the target's left edge; the
/// caller strokes it at `link.width`.
pub fn horizontal_link_path(graph: &SankeyGraph, link: &SankeyLink) -> String {
    let sx = graph.source_of(link).x1;
    let tx = graph.target_of(link).x0;
    let mx = (sx + tx) / 2.0;
    format!(
        "M{sx},{sy}C{mx},{sy} {mx},{ty} {tx},{ty}",
        sy = link.y0,
        ty = link.y1
    )
}

/// Closed ribbon for a circular link.
///
/// The outer edge leaves the source's right side, runs `dist_from_node`
/// outward, arcs into the lane, crosses to `dist_from_node` before the target,
/// arcs back and enters the target's left side. The inner edge returns along
/// a lane `lane_width` narrower.
///
/// ```text
///  (nw) /-----lane-----\ (ne)
///       |              |
///       \-t         s--/
/// ```
pub fn circular_link_path(
    graph: &SankeyGraph,
    link: &SankeyLink,
    extent: &Extent,
    cycle: &CycleLaneConfig,
) -> String {
    let source = graph.source_of(link);
    let target = graph.target_of(link);
    let half = link.width / 2.0;
    let small = cycle.lane_width;
    let cp = cycle.control_point_dist;

    // +1 routes above the corridor, -1 below.
    let up = match link.circular_link_type {
        Some(CircularLinkType::Bottom) => -1.0,
        _ => 1.0,
    };
    let s_x = source.x1;
    let t_x = target.x0;
    let outer_s = link.y0 + up * half;
    let inner_s = link.y0 - up * half;
    let outer_t = link.y1 + up * half;
    let inner_t = link.y1 - up * half;
    let target_edge = if up > 0.0 { target.y0 } else { target.y1 };
    let lane_outer = lane_y(link, extent, cycle);
    let lane_inner = lane_outer + up * small;

    let se_x = s_x + cycle.dist_from_node;
    let ne_x = se_x;
    let nw_x = t_x - cycle.dist_from_node;
    let sw_x = nw_x;

    let mut d = String::new();
    let _ = write!(d, "M{s_x},{outer_s}");
    let _ = write!(d, "L{se_x},{outer_s}");
    let _ = write!(
        d,
        "C{},{outer_s} {},{lane_outer} {ne_x},{lane_outer}",
        se_x + cp,
        ne_x + cp
    );
    let _ = write!(d, "H{nw_x}");
    let _ = write!(
        d,
        "C{},{lane_outer} {},{outer_t} {sw_x},{outer_t}",
        nw_x - cp,
        sw_x - cp
    );
    let _ = write!(d, "H{t_x}");
    let _ = write!(d, "V{inner_t}");
    let _ = write!(d, "H{sw_x}");
    let _ = write!(
        d,
        "C{},{target_edge} {},{lane_inner} {nw_x},{lane_inner}",
        sw_x - cp / 2.0 + small,
        nw_x - cp / 2.0 + small
    );
    let _ = write!(d, "H{}", ne_x - small);
    let _ = write!(
        d,
        "C{},{lane_inner} {},{inner_s} {se_x},{inner_s}",
        ne_x + cp / 2.0 - small,
        se_x + cp / 2.0 - small
    );
    let _ = write!(d, "L{s_x},{inner_s}");
    d
}

/// Bounding box `(min_x, min_y, max_x, max_y)` of a circular link's ribbon,
/// control points included.
pub fn circular_link_bounds(
    graph: &SankeyGraph,
    link: &SankeyLink,
    extent: &Extent,
    cycle: &CycleLaneConfig,
) -> (f64, f64, f64, f64) {
    let source = graph.source_of(link);
    let target = graph.target_of(link);
    let lane = lane_y(link, extent, cycle);
    let min_x = (target.x0 - cycle.dist_from_node - cycle.control_point_dist).min(source.x1);
    let max_x = (source.x1 + cycle.dist_from_node + cycle.control_point_dist).max(target.x0);
    let half = link.width / 2.0;
    let min_y = lane.min(link.y0 - half).min(link.y1 - half);
    let max_y = lane.max(link.y0 + half).max(link.y1 + half);
    (min_x, min_y, max_x, max_y)
}
