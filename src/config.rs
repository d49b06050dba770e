use crate::ir::NodeSpec;
use crate::layout::SankeyNode;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How a node's identifying key is derived for link resolution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeIdentity {
    /// Decimal position in the node sequence.
    #[default]
    Index,
    /// The node's `name`; unnamed nodes have no key.
    Name,
    #[serde(skip)]
    Custom(fn(&NodeSpec, usize) -> Option<String>),
}

impl NodeIdentity {
    pub fn key(&self, node: &NodeSpec, index: usize) -> Option<String> {
        match self {
            Self::Index => Some(index.to_string()),
            Self::Name => node.name.clone(),
            Self::Custom(extract) => extract(node, index),
        }
    }
}

/// Column alignment policy: either a fixed column or a derivation from the
/// node's depth/height and the column count.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAlign {
    Left,
    Right,
    Center,
    #[default]
    Justify,
    Column(f64),
    #[serde(skip)]
    Custom(fn(&SankeyNode, usize) -> f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Extent {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl Default for Extent {
    fn default() -> Self {
        Self::from_size(1.0, 1.0)
    }
}

/// Geometry of the lanes circular links are routed through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CycleLaneConfig {
    pub lane_width: f64,
    pub lane_dist_from_fwd_paths: f64,
    pub dist_from_node: f64,
    pub control_point_dist: f64,
    pub lane_buffer: f64,
}

impl Default for CycleLaneConfig {
    fn default() -> Self {
        Self {
            lane_width: 4.0,
            lane_dist_from_fwd_paths: -10.0,
            dist_from_node: 30.0,
            control_point_dist: 30.0,
            lane_buffer: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankeyConfig {
    pub node_id: NodeIdentity,
    pub node_align: NodeAlign,
    pub node_width: f64,
    pub node_padding: f64,
    pub extent: Extent,
    pub iterations: usize,
    pub cycle: CycleLaneConfig,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            node_id: NodeIdentity::default(),
            node_align: NodeAlign::default(),
            node_width: 24.0,
            node_padding: 8.0,
            extent: Extent::default(),
            iterations: 32,
            cycle: CycleLaneConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub background: String,
    pub label_gap: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 960.0,
            height: 500.0,
            background: "#FFFFFF".to_string(),
            label_gap: 6.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub sankey: SankeyConfig,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::modern();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        let sankey = SankeyConfig {
            extent: Extent::from_size(render.width, render.height),
            ..Default::default()
        };
        Self {
            theme,
            sankey,
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f64>,
    text_color: Option<String>,
    background: Option<String>,
    link_opacity: Option<f64>,
    palette: Option<Vec<String>>,
}

/// `sankey` section of a config file or init directive.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyConfigFile {
    node_id: Option<NodeIdentity>,
    node_align: Option<NodeAlign>,
    node_width: Option<f64>,
    node_padding: Option<f64>,
    size: Option<[f64; 2]>,
    extent: Option<[[f64; 2]; 2]>,
    iterations: Option<usize>,
    cycle_lane_narrow_width: Option<f64>,
    cycle_lane_dist_from_fwd_paths: Option<f64>,
    cycle_dist_from_node: Option<f64>,
    cycle_control_point_dist: Option<f64>,
    cycle_small_width_buffer: Option<f64>,
}

impl SankeyConfigFile {
    pub fn apply(self, config: &mut SankeyConfig) {
        if let Some(v) = self.node_id {
            config.node_id = v;
        }
        if let Some(v) = self.node_align {
            config.node_align = v;
        }
        if let Some(v) = self.node_width {
            config.node_width = v;
        }
        if let Some(v) = self.node_padding {
            config.node_padding = v;
        }
        if let Some([w, h]) = self.size {
            config.extent = Extent::from_size(w, h);
        }
        if let Some([[x0, y0], [x1, y1]]) = self.extent {
            config.extent = Extent::new(x0, y0, x1, y1);
        }
        if let Some(v) = self.iterations {
            config.iterations = v;
        }
        if let Some(v) = self.cycle_lane_narrow_width {
            config.cycle.lane_width = v;
        }
        if let Some(v) = self.cycle_lane_dist_from_fwd_paths {
            config.cycle.lane_dist_from_fwd_paths = v;
        }
        if let Some(v) = self.cycle_dist_from_node {
            config.cycle.dist_from_node = v;
        }
        if let Some(v) = self.cycle_control_point_dist {
            config.cycle.control_point_dist = v;
        }
        if let Some(v) = self.cycle_small_width_buffer {
            config.cycle.lane_buffer = v;
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f64>,
    height: Option<f64>,
    background: Option<String>,
    label_gap: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    sankey: Option<SankeyConfigFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "modern" {
            config.theme = Theme::modern();
        } else if theme_name == "base" || theme_name == "default" || theme_name == "mermaid" {
            config.theme = Theme::mermaid_default();
        }
        config.render.background = config.theme.background.clone();
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.link_opacity {
            config.theme.link_opacity = v;
        }
        if let Some(v) = vars.palette {
            config.theme.palette = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.background {
            config.render.background = v;
        }
        if let Some(v) = render.label_gap {
            config.render.label_gap = v;
        }
    }
    config.sankey.extent = Extent::from_size(config.render.width, config.render.height);

    if let Some(sankey) = parsed.sankey {
        sankey.apply(&mut config.sankey);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_classic_sankey() {
        let config = SankeyConfig::default();
        assert_eq!(config.node_width, 24.0);
        assert_eq!(config.node_padding, 8.0);
        assert_eq!(config.iterations, 32);
        assert_eq!(config.extent, Extent::new(0.0, 0.0, 1.0, 1.0));
        assert!(matches!(config.node_align, NodeAlign::Justify));
        assert!(matches!(config.node_id, NodeIdentity::Index));
        assert_eq!(config.cycle.lane_width, 4.0);
        assert_eq!(config.cycle.lane_dist_from_fwd_paths, -10.0);
        assert_eq!(config.cycle.dist_from_node, 30.0);
        assert_eq!(config.cycle.control_point_dist, 30.0);
        assert_eq!(config.cycle.lane_buffer, 2.0);
    }

    #[test]
    fn sankey_section_overrides_fields() {
        let file: SankeyConfigFile = serde_json::from_str(
            r#"{"nodeWidth": 10, "nodeAlign": "left", "nodeId": "name", "size": [300, 200], "cycleSmallWidthBuffer": 5}"#,
        )
        .unwrap();
        let mut config = SankeyConfig::default();
        file.apply(&mut config);
        assert_eq!(config.node_width, 10.0);
        assert!(matches!(config.node_align, NodeAlign::Left));
        assert!(matches!(config.node_id, NodeIdentity::Name));
        assert_eq!(config.extent, Extent::from_size(300.0, 200.0));
        assert_eq!(config.cycle.lane_buffer, 5.0);
        assert_eq!(config.node_padding, 8.0);
    }

    #[test]
    fn node_align_accepts_constant_column() {
        let align: NodeAlign = serde_json::from_str(r#"{"column": 2}"#).unwrap();
        assert!(matches!(align, NodeAlign::Column(c) if c == 2.0));
    }

    #[test]
    fn load_config_reads_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("sankey-config-{}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"theme": "default", "render": {{"width": 400, "height": 300}}, "sankey": {{"iterations": 6}}}}"#
        )
        .unwrap();
        drop(file);

        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.sankey.iterations, 6);
        assert_eq!(config.sankey.extent, Extent::from_size(400.0, 300.0));
        assert_eq!(config.theme.palette[0], "#1f77b4");
    }

    #[test]
    fn load_config_without_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.sankey.extent, Extent::from_size(960.0, 500.0));
    }
}
