use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reference to a link endpoint as supplied by the caller.
///
/// `Index` points straight at a position in the node list; `Id` goes through
/// the configured node identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Index(usize),
    Id(String),
}

impl From<usize> for NodeRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for NodeRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default)]
    pub name: Option<String>,
}

impl NodeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSpec {
    pub source: NodeRef,
    pub target: NodeRef,
    pub value: f64,
}

impl LinkSpec {
    pub fn new(source: impl Into<NodeRef>, target: impl Into<NodeRef>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// Accessors for a graph description.
///
/// Layout only ever reads nodes and links through this trait, so callers can
/// lay out their own structures without first building a [`SankeyInput`].
pub trait SankeySource {
    fn nodes(&self) -> Vec<NodeSpec>;
    fn links(&self) -> Vec<LinkSpec>;
}

/// Plain `{nodes, links}` graph description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SankeyInput {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    #[serde(skip)]
    names: NameIndex,
}

/// Name lookup for `ensure_node`, filled lazily from `nodes[scanned..]` so
/// nodes pushed directly or deserialized are still found.
#[derive(Debug, Clone, Default)]
struct NameIndex {
    by_name: HashMap<String, usize>,
    scanned: usize,
}

impl NameIndex {
    fn sync(&mut self, nodes: &[NodeSpec]) {
        if self.scanned > nodes.len() {
            *self = Self::default();
        }
        for (idx, node) in nodes.iter().enumerate().skip(self.scanned) {
            if let Some(name) = &node.name {
                self.by_name.entry(name.clone()).or_insert(idx);
            }
        }
        self.scanned = nodes.len();
    }
}

impl PartialEq for SankeyInput {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.links == other.links
    }
}

impl SankeyInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the first node named `name`, appending it if
    /// missing. Renaming or replacing nodes already scanned is not tracked.
    pub fn ensure_node(&mut self, name: &str) -> usize {
        self.names.sync(&self.nodes);
        if let Some(&idx) = self.names.by_name.get(name) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(NodeSpec::named(name));
        self.names.by_name.insert(name.to_string(), idx);
        self.names.scanned = self.nodes.len();
        idx
    }

    pub fn push_link(&mut self, source: impl Into<NodeRef>, target: impl Into<NodeRef>, value: f64) {
        self.links.push(LinkSpec::new(source, target, value));
    }
}

impl SankeySource for SankeyInput {
    fn nodes(&self) -> Vec<NodeSpec> {
        self.nodes.clone()
    }

    fn links(&self) -> Vec<LinkSpec> {
        self.links.clone()
    }
}
