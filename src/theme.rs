use serde::{Deserialize, Serialize};

const MODERN_PALETTE: [&str; 10] = [
    "#4e79a7", "#f28e2c", "#e15759", "#76b7b2", "#59a14f", "#edc949", "#af7aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

const CATEGORY10_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f64,
    pub text_color: String,
    pub node_stroke: String,
    pub link_opacity: f64,
    pub circular_link_opacity: f64,
    pub background: String,
    pub palette: Vec<String>,
}

impl Theme {
    pub fn mermaid_default() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            text_color: "#333333".to_string(),
            node_stroke: "#000000".to_string(),
            link_opacity: 0.5,
            circular_link_opacity: 0.4,
            background: "#FFFFFF".to_string(),
            palette: CATEGORY10_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 12.0,
            text_color: "#1C2430".to_string(),
            node_stroke: "none".to_string(),
            link_opacity: 0.45,
            circular_link_opacity: 0.35,
            background: "#FFFFFF".to_string(),
            palette: MODERN_PALETTE.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Colour for the node at `index`, cycling through the palette.
    pub fn node_color(&self, index: usize) -> &str {
        if self.palette.is_empty() {
            return "#888888";
        }
        &self.palette[index % self.palette.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_color_cycles_through_palette() {
        let theme = Theme::modern();
        assert_eq!(theme.node_color(0), theme.node_color(theme.palette.len()));
        assert_ne!(theme.node_color(0), theme.node_color(1));
    }

    #[test]
    fn empty_palette_falls_back_to_grey() {
        let mut theme = Theme::mermaid_default();
        theme.palette.clear();
        assert_eq!(theme.node_color(3), "#888888");
    }
}
