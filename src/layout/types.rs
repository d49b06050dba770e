use serde::Serialize;
use std::cmp::Ordering;

/// Which lane a circular link loops through, relative to the forward-flow
/// corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircularLinkType {
    Top,
    Bottom,
}

impl CircularLinkType {
    /// Lane used when neither endpoint has one yet: even ids go below, odd
    /// ids above.
    pub fn alternating(circular_link_id: usize) -> Self {
        if circular_link_id % 2 == 0 {
            Self::Bottom
        } else {
            Self::Top
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyNode {
    /// Identifying key from the configured node identity.
    pub id: Option<String>,
    pub name: Option<String>,
    pub index: usize,
    pub source_links: Vec<usize>,
    pub target_links: Vec<usize>,
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

impl SankeyNode {
    pub(crate) fn new(id: Option<String>, name: Option<String>, index: usize) -> Self {
        Self {
            id,
            name,
            index,
            source_links: Vec::new(),
            target_links: Vec::new(),
            value: 0.0,
            depth: 0,
            height: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            part_of_cycle: false,
            circular_link_type: None,
        }
    }

    pub fn center(&self) -> f64 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn label(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| self.index.to_string())
    }

    pub(crate) fn shift(&mut self, dy: f64) {
        self.y0 += dy;
        self.y1 += dy;
    }

    /// Stacking band: top-lane cyclic nodes, then acyclic nodes, then
    /// bottom-lane cyclic nodes.
    fn breadth_band(&self) -> u8 {
        if !self.part_of_cycle {
            return 1;
        }
        match self.circular_link_type {
            Some(CircularLinkType::Top) => 0,
            Some(CircularLinkType::Bottom) => 2,
            None => 1,
        }
    }
}

/// Vertical stacking order of two nodes in the same column.
pub fn ascending_breadth(a: &SankeyNode, b: &SankeyNode) -> Ordering {
    a.breadth_band()
        .cmp(&b.breadth_band())
        .then_with(|| a.y0.total_cmp(&b.y0))
}

#[derive(Debug, Clone, Serialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub index: usize,
    pub circular: bool,
    pub circular_link_id: Option<usize>,
    pub circular_link_type: Option<CircularLinkType>,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
}

impl SankeyLink {
    pub(crate) fn new(source: usize, target: usize, value: f64, index: usize) -> Self {
        Self {
            source,
            target,
            value,
            index,
            circular: false,
            circular_link_id: None,
            circular_link_type: None,
            width: 0.0,
            y0: 0.0,
            y1: 0.0,
        }
    }
}

/// Laid-out graph. Nodes and links live in flat arenas; links refer to nodes
/// and nodes to links by index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SankeyGraph {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
}

impl SankeyGraph {
    pub fn node(&self, index: usize) -> &SankeyNode {
        &self.nodes[index]
    }

    pub fn link(&self, index: usize) -> &SankeyLink {
        &self.links[index]
    }

    pub fn source_of(&self, link: &SankeyLink) -> &SankeyNode {
        &self.nodes[link.source]
    }

    pub fn target_of(&self, link: &SankeyLink) -> &SankeyNode {
        &self.nodes[link.target]
    }

    pub fn find_node(&self, label: &str) -> Option<&SankeyNode> {
        self.nodes
            .iter()
            .find(|node| node.name.as_deref() == Some(label) || node.id.as_deref() == Some(label))
    }

    pub fn circular_links(&self) -> impl Iterator<Item = &SankeyLink> {
        self.links.iter().filter(|link| link.circular)
    }

    /// Number of distinct columns (`x0` positions).
    pub fn column_count(&self) -> usize {
        let mut xs: Vec<f64> = self.nodes.iter().map(|node| node.x0).collect();
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        xs.len()
    }
}
