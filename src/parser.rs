use crate::ir::SankeyInput;
use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;

static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^sankey(-beta)?\s*$").unwrap());

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub input: SankeyInput,
    pub init_config: Option<serde_json::Value>,
}

/// Parses mermaid `sankey` text: an optional header, then one
/// `source,target,value` row per line.
pub fn parse_sankey(input: &str) -> Result<ParseOutput> {
    let (lines, init_config) = preprocess_input(input);
    let mut graph = SankeyInput::new();

    for (line_no, line) in lines {
        if HEADER_RE.is_match(&line) {
            continue;
        }
        let parts = split_args(&line);
        if parts.len() < 3 {
            tracing::debug!(line = line_no, "skipping row with fewer than three fields");
            continue;
        }
        let from = strip_quotes(&parts[0]);
        let to = strip_quotes(&parts[1]);
        if from.is_empty() || to.is_empty() {
            continue;
        }
        let raw_value = strip_quotes(&parts[2]);
        let value: f64 = raw_value
            .parse()
            .with_context(|| format!("line {line_no}: invalid flow value {raw_value:?}"))?;
        if !value.is_finite() {
            bail!("line {line_no}: flow value {raw_value:?} is not finite");
        }
        let source = graph.ensure_node(&from);
        let target = graph.ensure_node(&to);
        graph.push_link(source, target, value);
    }

    Ok(ParseOutput {
        input: graph,
        init_config,
    })
}

/// Parses a `{nodes, links}` JSON document.
pub fn parse_json(input: &str) -> Result<SankeyInput> {
    let graph: SankeyInput = serde_json::from_str(input).context("invalid sankey JSON")?;
    Ok(graph)
}

/// True if the first meaningful line of `input` is a sankey header.
pub fn is_sankey(input: &str) -> bool {
    input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))
        .is_some_and(|line| HEADER_RE.is_match(line))
}

/// Non-empty lines with comments stripped, each with its 1-based line number.
fn preprocess_input(input: &str) -> (Vec<(usize, String)>, Option<serde_json::Value>) {
    let mut init_config: Option<serde_json::Value> = None;
    let mut lines = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let trimmed_line = raw_line.trim();
        if trimmed_line.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed_line) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else if let Ok(value) = json5::from_str::<serde_json::Value>(json_str) {
                    init_config = Some(value);
                } else {
                    tracing::warn!(line = idx + 1, "ignoring unparsable init directive");
                }
            }
            continue;
        }
        if trimmed_line.starts_with("%%") {
            continue;
        }
        let without_comment = strip_trailing_comment(trimmed_line);
        if without_comment.is_empty() {
            continue;
        }
        lines.push((idx + 1, without_comment));
    }

    (lines, init_config)
}

fn strip_trailing_comment(line: &str) -> String {
    let mut quote: Option<char> = None;
    let mut chars = line.chars().peekable();
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            out.push(ch);
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            out.push(ch);
            continue;
        }
        if ch == '%'
            && let Some('%') = chars.peek().copied()
        {
            break;
        }
        out.push(ch);
    }
    out.trim().to_string()
}

/// Splits on commas outside quotes. A doubled quote inside a quoted field is
/// kept as a literal quote.
fn split_args(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            if ch == q {
                if chars.peek() == Some(&q) {
                    chars.next();
                    current.push(q);
                    continue;
                }
                quote = None;
            }
            current.push(ch);
            continue;
        }
        if ch == '"' || ch == '\'' {
            quote = Some(ch);
            current.push(ch);
            continue;
        }
        if ch == ',' {
            args.push(current.trim().to_string());
            current.clear();
            continue;
        }
        current.push(ch);
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() || !args.is_empty() {
        args.push(trimmed.to_string());
    }
    args
}

fn strip_quotes(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}
