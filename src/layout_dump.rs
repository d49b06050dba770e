use crate::config::SankeyConfig;
use crate::layout::{CircularLinkType, SankeyGraph, link_path};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub extent: [[f64; 2]; 2],
    pub columns: usize,
    pub nodes: Vec<NodeDump>,
    pub links: Vec<LinkDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub index: usize,
    pub id: Option<String>,
    pub label: String,
    pub value: f64,
    pub depth: usize,
    pub height: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    pub part_of_cycle: bool,
    pub circular_link_type: Option<CircularLinkType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDump {
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
    pub circular: bool,
    #[serde(rename = "circularLinkID")]
    pub circular_link_id: Option<usize>,
    pub circular_link_type: Option<CircularLinkType>,
    pub path: String,
}

impl LayoutDump {
    pub fn from_graph(graph: &SankeyGraph, config: &SankeyConfig) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| NodeDump {
                index: node.index,
                id: node.id.clone(),
                label: node.label(),
                value: node.value,
                depth: node.depth,
                height: node.height,
                x0: node.x0,
                x1: node.x1,
                y0: node.y0,
                y1: node.y1,
                part_of_cycle: node.part_of_cycle,
                circular_link_type: node.circular_link_type,
            })
            .collect();

        let links = graph
            .links
            .iter()
            .map(|link| LinkDump {
                index: link.index,
                source: link.source,
                target: link.target,
                value: link.value,
                width: link.width,
                y0: link.y0,
                y1: link.y1,
                circular: link.circular,
                circular_link_id: link.circular_link_id,
                circular_link_type: link.circular_link_type,
                path: link_path(graph, link, config),
            })
            .collect();

        let e = &config.extent;
        LayoutDump {
            extent: [[e.x0, e.y0], [e.x1, e.y1]],
            columns: graph.column_count(),
            nodes,
            links,
        }
    }
}

pub fn write_layout_dump(path: &Path, graph: &SankeyGraph, config: &SankeyConfig) -> anyhow::Result<()> {
    let dump = LayoutDump::from_graph(graph, config);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

pub fn layout_dump_string(graph: &SankeyGraph, config: &SankeyConfig) -> anyhow::Result<String> {
    let dump = LayoutDump::from_graph(graph, config);
    Ok(serde_json::to_string_pretty(&dump)?)
}
