use crate::config::{Config, RenderConfig};
use crate::layout::{SankeyGraph, circular_link_bounds, link_path};
use anyhow::Result;
use std::fmt::Write;
use std::path::Path;

/// Margin kept around the drawing for labels that overhang the extent.
const MARGIN: f64 = 8.0;

pub fn render_svg(graph: &SankeyGraph, config: &Config) -> String {
    let theme = &config.theme;
    let extent = &config.sankey.extent;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (extent.x0, extent.y0, extent.x1, extent.y1);
    for link in graph.circular_links() {
        let (x0, y0, x1, y1) = circular_link_bounds(graph, link, extent, &config.sankey.cycle);
        min_x = min_x.min(x0);
        min_y = min_y.min(y0);
        max_x = max_x.max(x1);
        max_y = max_y.max(y1);
    }
    min_x -= MARGIN;
    min_y -= MARGIN;
    let width = (max_x - min_x + MARGIN).max(1.0);
    let height = (max_y - min_y + MARGIN).max(1.0);

    let mut svg = String::new();
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    );
    let _ = write!(
        svg,
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" fill=\"{}\"/>",
        config.render.background
    );

    svg.push_str("<g class=\"links\">");
    for link in &graph.links {
        let d = link_path(graph, link, &config.sankey);
        let color = theme.node_color(link.source);
        if link.circular {
            let _ = write!(
                svg,
                "<path class=\"circular\" d=\"{d}\" fill=\"{color}\" fill-opacity=\"{}\" stroke=\"none\"/>",
                theme.circular_link_opacity
            );
        } else {
            let _ = write!(
                svg,
                "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-opacity=\"{}\" stroke-width=\"{:.2}\"/>",
                theme.link_opacity,
                link.width.max(1.0)
            );
        }
    }
    svg.push_str("</g>");

    svg.push_str("<g class=\"nodes\">");
    for node in &graph.nodes {
        let _ = write!(
            svg,
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\" stroke=\"{}\"/>",
            node.x0,
            node.y0,
            node.x1 - node.x0,
            node.y1 - node.y0,
            theme.node_color(node.index),
            theme.node_stroke
        );
    }
    svg.push_str("</g>");

    let mid_x = (extent.x0 + extent.x1) / 2.0;
    let gap = config.render.label_gap;
    let _ = write!(
        svg,
        "<g class=\"labels\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">",
        escape_xml(&theme.font_family),
        theme.font_size,
        theme.text_color
    );
    for node in &graph.nodes {
        let (x, anchor) = if node.x0 < mid_x {
            (node.x1 + gap, "start")
        } else {
            (node.x0 - gap, "end")
        };
        let _ = write!(
            svg,
            "<text x=\"{x:.2}\" y=\"{:.2}\" dy=\"0.35em\" text-anchor=\"{anchor}\">{}</text>",
            node.center(),
            escape_xml(&node.label())
        );
    }
    svg.push_str("</g>");

    svg.push_str("</svg>");
    svg
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width as f32, render_cfg.height as f32)
        .unwrap_or(usvg::Size::from_wh(800.0, 600.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
