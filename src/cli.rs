use crate::config::{Config, Extent, NodeAlign, SankeyConfigFile, load_config};
use crate::ir::SankeyInput;
use crate::layout::compute_layout;
use crate::layout_dump::{layout_dump_string, write_layout_dump};
use crate::parser::{is_sankey, parse_json, parse_sankey};
use crate::render::{render_svg, write_output_png, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sankey", version, about = "Sankey layout with circular links")]
pub struct Args {
    /// Input file (.json, .md, or sankey text) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, render, sankey)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f64>,

    /// Relaxation rounds
    #[arg(long = "iterations")]
    pub iterations: Option<usize>,

    /// Column alignment
    #[arg(long = "align", value_enum)]
    pub align: Option<AlignArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlignArg {
    Left,
    Right,
    Center,
    Justify,
}

impl From<AlignArg> for NodeAlign {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => NodeAlign::Left,
            AlignArg::Right => NodeAlign::Right,
            AlignArg::Center => NodeAlign::Center,
            AlignArg::Justify => NodeAlign::Justify,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    Json,
    Markdown,
    Sankey,
}

/// One diagram to lay out, with any init directive it carried.
struct Diagram {
    input: SankeyInput,
    init_config: Option<serde_json::Value>,
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let base_config = apply_args(load_config(args.config.as_deref())?, &args);

    let (content, kind) = read_input(args.input.as_deref())?;
    let diagrams = load_diagrams(&content, kind)?;
    if diagrams.is_empty() {
        return Err(anyhow::anyhow!("No sankey diagrams found in input"));
    }
    tracing::debug!(count = diagrams.len(), "loaded diagrams");

    if diagrams.len() == 1 {
        let diagram = &diagrams[0];
        let config = merge_init_config(base_config, diagram.init_config.as_ref());
        let output = match args.output_format {
            OutputFormat::Png => Some(ensure_output(&args.output, "png")?),
            _ => args.output.clone(),
        };
        return emit(&diagram.input, &config, args.output_format, output.as_deref());
    }

    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, diagrams.len())?;
    for (diagram, output) in diagrams.iter().zip(&outputs) {
        let config = merge_init_config(base_config.clone(), diagram.init_config.as_ref());
        emit(&diagram.input, &config, args.output_format, Some(output))?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("SANKEY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn apply_args(mut config: Config, args: &Args) -> Config {
    if args.width.is_some() || args.height.is_some() {
        if let Some(width) = args.width {
            config.render.width = width;
        }
        if let Some(height) = args.height {
            config.render.height = height;
        }
        config.sankey.extent = Extent::from_size(config.render.width, config.render.height);
    }
    if let Some(iterations) = args.iterations {
        config.sankey.iterations = iterations;
    }
    if let Some(align) = args.align {
        config.sankey.node_align = align.into();
    }
    config
}

fn emit(input: &SankeyInput, config: &Config, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let graph = compute_layout(input, &config.sankey)?;
    match format {
        OutputFormat::Svg => {
            let svg = render_svg(&graph, config);
            write_output_svg(&svg, output)?;
        }
        OutputFormat::Png => {
            let output = output.ok_or_else(|| anyhow::anyhow!("Output path required for png output"))?;
            let svg = render_svg(&graph, config);
            write_output_png(&svg, output, &config.render)?;
        }
        OutputFormat::Json => match output {
            Some(path) => write_layout_dump(path, &graph, &config.sankey)?,
            None => println!("{}", layout_dump_string(&graph, &config.sankey)?),
        },
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<(String, InputKind)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, InputKind::Sankey));
        }
        let content = std::fs::read_to_string(path)?;
        return Ok((content, input_kind(path)));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, InputKind::Sankey))
}

fn input_kind(path: &Path) -> InputKind {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => InputKind::Json,
        Some("md" | "markdown") => InputKind::Markdown,
        _ => InputKind::Sankey,
    }
}

fn load_diagrams(content: &str, kind: InputKind) -> Result<Vec<Diagram>> {
    match kind {
        InputKind::Json => Ok(vec![Diagram {
            input: parse_json(content)?,
            init_config: None,
        }]),
        InputKind::Sankey => {
            let parsed = parse_sankey(content)?;
            Ok(vec![Diagram {
                input: parsed.input,
                init_config: parsed.init_config,
            }])
        }
        InputKind::Markdown => extract_mermaid_blocks(content)
            .iter()
            .filter(|block| is_sankey(block))
            .map(|block| -> Result<Diagram> {
                let parsed = parse_sankey(block)?;
                Ok(Diagram {
                    input: parsed.input,
                    init_config: parsed.init_config,
                })
            })
            .collect(),
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

fn extract_mermaid_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_mermaid_fence(trimmed) {
                in_block = true;
                fence = start_fence;
            }
            continue;
        }
        if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }
        current.push(line.to_string());
    }

    blocks
}

fn detect_mermaid_fence(line: &str) -> Option<String> {
    for marker in ["```", "~~~", ":::"] {
        if let Some(rest) = line.strip_prefix(marker) {
            let first = marker.chars().next().unwrap_or('`');
            if rest.trim_start_matches(first).trim().starts_with("mermaid") {
                return Some(marker.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("sankey-{}.{}", idx + 1, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("sankey");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect())
}

/// Applies an init directive's `themeVariables` and `sankey` sections.
fn merge_init_config(mut config: Config, init: Option<&serde_json::Value>) -> Config {
    let Some(init) = init else {
        return config;
    };
    if let Some(theme_vars) = init.get("themeVariables") {
        if let Some(val) = theme_vars.get("fontFamily").and_then(|v| v.as_str()) {
            config.theme.font_family = val.to_string();
        }
        if let Some(val) = theme_vars.get("fontSize").and_then(|v| v.as_f64()) {
            config.theme.font_size = val;
        }
        if let Some(val) = theme_vars.get("textColor").and_then(|v| v.as_str()) {
            config.theme.text_color = val.to_string();
        }
        if let Some(val) = theme_vars.get("background").and_then(|v| v.as_str()) {
            config.theme.background = val.to_string();
            config.render.background = val.to_string();
        }
    }
    if let Some(section) = init.get("sankey") {
        match serde_json::from_value::<SankeyConfigFile>(section.clone()) {
            Ok(file) => file.apply(&mut config.sankey),
            Err(err) => tracing::warn!(%err, "ignoring invalid sankey init section"),
        }
    }
    config
}
