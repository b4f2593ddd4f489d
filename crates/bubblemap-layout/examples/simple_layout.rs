//! Lay out a synthetic wallet tree and compare Barnes-Hut against the
//! exact pairwise repulsion.
//!
//! Run with: cargo run --example simple_layout

use std::time::Instant;

use bubblemap_layout::{phyllotaxis, Edge, ForceLayout, LayoutConfig, Position};

fn wallet_tree(fanout: usize, depth: usize) -> (usize, Vec<Edge>) {
    let mut edges = Vec::new();
    let mut frontier = vec![0usize];
    let mut count = 1;
    for _ in 0..depth {
        let mut next = Vec::new();
        for &parent in &frontier {
            for _ in 0..fanout {
                edges.push(Edge::new(parent, count));
                next.push(count);
                count += 1;
            }
        }
        frontier = next;
    }
    (count, edges)
}

fn settle(config: LayoutConfig, count: usize, edges: &[Edge]) -> (u32, Vec<Position>) {
    let positions = phyllotaxis(count, config.center(), config.initial_radius);
    let mut layout = ForceLayout::new(config);
    layout
        .init(positions, edges.to_vec())
        .expect("Failed to initialize layout");
    let ticks = layout.run(1_000).expect("Layout step failed");
    (ticks, layout.positions())
}

fn main() {
    tracing_subscriber::fmt::init();

    let (count, edges) = wallet_tree(6, 3);
    println!("Wallet tree with {} nodes and {} edges", count, edges.len());

    for use_barnes_hut in [true, false] {
        let config = LayoutConfig {
            use_barnes_hut,
            ..LayoutConfig::default()
        };

        let start = Instant::now();
        let (ticks, positions) = settle(config, count, &edges);
        let elapsed = start.elapsed();

        let (min_x, max_x, min_y, max_y) = positions.iter().fold(
            (f64::MAX, f64::MIN, f64::MAX, f64::MIN),
            |(min_x, max_x, min_y, max_y), p| {
                (min_x.min(p.x), max_x.max(p.x), min_y.min(p.y), max_y.max(p.y))
            },
        );

        println!(
            "\n{}: settled after {} ticks in {:.2?}",
            if use_barnes_hut { "Barnes-Hut" } else { "Exact" },
            ticks,
            elapsed
        );
        println!(
            "  bounds = ({:.1}, {:.1}) to ({:.1}, {:.1})",
            min_x, min_y, max_x, max_y
        );
        println!("  root at ({:.2}, {:.2})", positions[0].x, positions[0].y);
    }
}
