//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `nmrlink_core` linkage without an embedding UI.
//! - Print a deterministic demo splitting tree for quick sanity checks.

use nmrlink_core::{build_multiplet_tree, MultipletInput};

fn main() {
    println!("nmrlink_core ping={}", nmrlink_core::ping());
    println!("nmrlink_core version={}", nmrlink_core::core_version());

    let couplings = [7.0, 2.0];
    let tree = build_multiplet_tree(&MultipletInput {
        code: "dd",
        couplings: &couplings,
        center: 2.5,
        frequency: 400.0,
        range: None,
        viewport: None,
    });
    println!(
        "demo dd nodes={} leaves={} extent_ppm={:.5}",
        tree.nodes.len(),
        tree.leaves().len(),
        tree.width()
    );
    for leaf in tree.leaves() {
        println!("  line x={:.5} ratio={}", leaf.x, leaf.ratio);
    }
}
