use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sankey_cycles::config::{Config, Extent, SankeyConfig};
use sankey_cycles::ir::SankeyInput;
use sankey_cycles::layout::{compute_layout, update_link_breadths};
use sankey_cycles::parser::parse_sankey;
use sankey_cycles::render::render_svg;
use std::hint::black_box;

fn chain(nodes: usize) -> SankeyInput {
    let mut input = SankeyInput::new();
    for i in 0..nodes {
        input.ensure_node(&format!("N{i}"));
    }
    for i in 0..nodes.saturating_sub(1) {
        input.push_link(i, i + 1, 1.0 + (i % 5) as f64);
    }
    input
}

/// `layers` columns of `width` nodes, each node feeding every node of the
/// next column.
fn mesh(layers: usize, width: usize) -> SankeyInput {
    let mut input = SankeyInput::new();
    for layer in 0..layers {
        for row in 0..width {
            input.ensure_node(&format!("L{layer}R{row}"));
        }
    }
    for layer in 0..layers.saturating_sub(1) {
        for from in 0..width {
            for to in 0..width {
                let value = 1.0 + ((from * 7 + to * 3) % 11) as f64;
                input.push_link(layer * width + from, (layer + 1) * width + to, value);
            }
        }
    }
    input
}

/// A mesh with a loop-back from every third node of the last column.
fn cyclic(layers: usize, width: usize) -> SankeyInput {
    let mut input = mesh(layers, width);
    let last = (layers - 1) * width;
    for row in (0..width).step_by(3) {
        input.push_link(last + row, row, 2.0);
    }
    input
}

fn sankey_text(rows: usize) -> String {
    let mut out = String::from("sankey-beta\n");
    for i in 0..rows {
        out.push_str(&format!("Stage {},Stage {},{}\n", i % 40, (i * 7 + 1) % 40, 1 + i % 9));
    }
    out
}

fn config() -> SankeyConfig {
    SankeyConfig {
        extent: Extent::from_size(1200.0, 800.0),
        ..Default::default()
    }
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = config();
    let inputs = [
        ("chain_200", chain(200)),
        ("mesh_8x12", mesh(8, 12)),
        ("cyclic_8x12", cyclic(8, 12)),
        ("cyclic_20x20", cyclic(20, 20)),
    ];
    for (name, input) in &inputs {
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| {
                let graph = compute_layout(black_box(input), &config).expect("layout failed");
                black_box(graph.nodes.len());
            });
        });
    }
    group.finish();
}

fn bench_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_iterations");
    let input = cyclic(10, 10);
    for iterations in [0usize, 8, 32, 128] {
        let config = SankeyConfig {
            iterations,
            ..config()
        };
        group.bench_with_input(BenchmarkId::from_parameter(iterations), &input, |b, input| {
            b.iter(|| {
                let graph = compute_layout(black_box(input), &config).expect("layout failed");
                black_box(graph.links.len());
            });
        });
    }
    group.finish();
}

fn bench_link_breadths(c: &mut Criterion) {
    let mut graph = compute_layout(&cyclic(20, 20), &config()).expect("layout failed");
    c.bench_function("update_link_breadths", |b| {
        b.iter(|| {
            update_link_breadths(black_box(&mut graph));
        });
    });
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    let config = Config::default();
    for rows in [50usize, 400] {
        let text = sankey_text(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &text, |b, text| {
            b.iter(|| {
                let parsed = parse_sankey(black_box(text)).expect("parse failed");
                let graph = compute_layout(&parsed.input, &config.sankey).expect("layout failed");
                let svg = render_svg(&graph, &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_layout, bench_iterations, bench_link_breadths, bench_end_to_end
);
criterion_main!(benches);
