#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, Extent, NodeAlign, NodeIdentity, SankeyConfig, load_config};
pub use ir::{LinkSpec, NodeRef, NodeSpec, SankeyInput, SankeySource};
pub use layout::{SankeyError, SankeyGraph, SankeyLink, SankeyNode, compute_layout};
