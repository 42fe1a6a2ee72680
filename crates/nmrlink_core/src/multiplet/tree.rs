//! J-coupling splitting tree layout.
//!
//! # Responsibility
//! - Expand a multiplicity code and coupling constants into tree nodes.
//! - Emit a range bracket instead of a tree for range-level multiplets.
//! - Report the tree extent and whether it is wide enough to label.
//!
//! # Invariants
//! - Pure and deterministic: equal inputs give equal trees.
//! - Malformed input never fails; it degrades to one non-split root node.
//! - Line intensities follow Pascal's triangle (spin-1/2 coupling partners).

use super::code::{MultiplicityCode, MultiplicityToken};

/// Default share of the visible width a tree must exceed to get a label.
pub const DEFAULT_LABEL_WIDTH_FRACTION: f64 = 0.1;

/// Visible horizontal domain of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Visible domain bounds in ppm (order does not matter).
    pub from: f64,
    pub to: f64,
    /// Chart width in pixels.
    pub width_px: f64,
    pub label_width_fraction: f64,
}

impl Viewport {
    pub fn new(from: f64, to: f64, width_px: f64) -> Self {
        Self {
            from,
            to,
            width_px,
            label_width_fraction: DEFAULT_LABEL_WIDTH_FRACTION,
        }
    }

    /// Pixel width of a ppm extent inside this viewport.
    pub fn to_pixels(&self, extent: f64) -> Option<f64> {
        let span = (self.to - self.from).abs();
        if !span.is_finite() || span == 0.0 || !self.width_px.is_finite() || self.width_px <= 0.0 {
            return None;
        }
        Some(extent.abs() / span * self.width_px)
    }
}

/// Inputs of one tree layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultipletInput<'a> {
    /// Multiplicity code, e.g. `dd`.
    pub code: &'a str,
    /// Coupling constants in Hz, one per splitting token.
    pub couplings: &'a [f64],
    /// Signal center in ppm.
    pub center: f64,
    /// Observed frequency in MHz (Hz per ppm).
    pub frequency: f64,
    /// Picked range bounds for range-level multiplets.
    pub range: Option<(f64, f64)>,
    pub viewport: Option<Viewport>,
}

/// One node of the splitting tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    /// 0 for the root; incremented by every splitting token.
    pub generation: usize,
    pub x: f64,
    pub parent_x: Option<f64>,
    /// Relative intensity (product of Pascal coefficients along the path).
    pub ratio: f64,
}

/// How the multiplet is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TreeLayout {
    /// Regular splitting tree.
    Split,
    /// Range-level multiplet: a bracket over the picked range, no nodes.
    Bracket { from: f64, to: f64 },
    /// Malformed input rendered as a single root node.
    Degraded,
}

/// Result of one layout pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipletTree {
    pub layout: TreeLayout,
    pub nodes: Vec<TreeNode>,
    pub min_x: f64,
    pub max_x: f64,
    pub label_worthy: bool,
}

impl MultipletTree {
    /// Nodes of the last generation (the observed lines).
    pub fn leaves(&self) -> Vec<&TreeNode> {
        let Some(last) = self.nodes.iter().map(|node| node.generation).max() else {
            return Vec::new();
        };
        self.nodes
            .iter()
            .filter(|node| node.generation == last)
            .collect()
    }

    /// Extent in ppm covered by nodes or bracket.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }
}

/// Builds the splitting tree for one multiplet.
pub fn build_multiplet_tree(input: &MultipletInput<'_>) -> MultipletTree {
    let Ok(code) = MultiplicityCode::parse(input.code) else {
        return degraded(input.center);
    };

    if code.is_range_level() {
        return match input.range {
            Some((a, b)) if a.is_finite() && b.is_finite() => {
                let (from, to) = if a <= b { (a, b) } else { (b, a) };
                finish(TreeLayout::Bracket { from, to }, Vec::new(), from, to, input.viewport)
            }
            _ => degraded(input.center),
        };
    }

    let valid_scale = input.frequency.is_finite() && input.frequency > 0.0;
    let valid_couplings = input.couplings.iter().all(|j| j.is_finite() && *j > 0.0);
    if !valid_scale
        || !valid_couplings
        || !input.center.is_finite()
        || code.coupling_count() != input.couplings.len()
    {
        return degraded(input.center);
    }

    let mut nodes = vec![TreeNode {
        generation: 0,
        x: input.center,
        parent_x: None,
        ratio: 1.0,
    }];
    let mut active: Vec<(f64, f64)> = vec![(input.center, 1.0)];
    let mut couplings = input.couplings.iter();
    let mut generation = 0;

    for token in code.tokens() {
        let lines = match token {
            MultiplicityToken::Singlet | MultiplicityToken::Massive => break,
            MultiplicityToken::Split { lines } => usize::from(*lines),
        };
        let Some(j_hz) = couplings.next() else {
            break;
        };
        let j_ppm = j_hz / input.frequency;
        let coefficients = pascal_row(lines);
        generation += 1;

        let mut next = Vec::with_capacity(active.len() * lines);
        for (parent_x, parent_ratio) in &active {
            for (k, coefficient) in coefficients.iter().enumerate() {
                let offset = (k as f64 - (lines - 1) as f64 / 2.0) * j_ppm;
                let x = parent_x + offset;
                let ratio = parent_ratio * coefficient;
                nodes.push(TreeNode {
                    generation,
                    x,
                    parent_x: Some(*parent_x),
                    ratio,
                });
                next.push((x, ratio));
            }
        }
        active = next;
    }

    let (min_x, max_x) = nodes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), node| {
            (lo.min(node.x), hi.max(node.x))
        });
    finish(TreeLayout::Split, nodes, min_x, max_x, input.viewport)
}

/// Row `lines - 1` of Pascal's triangle.
pub fn pascal_row(lines: usize) -> Vec<f64> {
    let mut row = vec![1.0];
    for _ in 1..lines {
        let mut next = Vec::with_capacity(row.len() + 1);
        next.push(1.0);
        for pair in row.windows(2) {
            next.push(pair[0] + pair[1]);
        }
        next.push(1.0);
        row = next;
    }
    row
}

fn degraded(center: f64) -> MultipletTree {
    MultipletTree {
        layout: TreeLayout::Degraded,
        nodes: vec![TreeNode {
            generation: 0,
            x: center,
            parent_x: None,
            ratio: 1.0,
        }],
        min_x: center,
        max_x: center,
        label_worthy: false,
    }
}

fn finish(
    layout: TreeLayout,
    nodes: Vec<TreeNode>,
    min_x: f64,
    max_x: f64,
    viewport: Option<Viewport>,
) -> MultipletTree {
    let label_worthy = viewport.is_some_and(|viewport| {
        viewport
            .to_pixels(max_x - min_x)
            .is_some_and(|px| px > viewport.width_px * viewport.label_width_fraction)
    });
    MultipletTree {
        layout,
        nodes,
        min_x,
        max_x,
        label_worthy,
    }
}

#[cfg(test)]
mod tests {
    use super::pascal_row;

    #[test]
    fn pascal_rows_match_first_generations() {
        assert_eq!(pascal_row(1), vec![1.0]);
        assert_eq!(pascal_row(2), vec![1.0, 1.0]);
        assert_eq!(pascal_row(4), vec![1.0, 3.0, 3.0, 1.0]);
        assert_eq!(pascal_row(7), vec![1.0, 6.0, 15.0, 20.0, 15.0, 6.0, 1.0]);
    }
}
