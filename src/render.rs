//! Text rendering of selected regions.
//!
//! Edges render as `"from,to"` (one string per undirected edge, lower id
//! first) and vertex colors as `"id,#RRGGBB"`. A vertex's color is derived
//! from its distortion normalized into `[0, 1]`:
//!
//! ```text
//! c = (n * (i32::MAX - 100000)) as i32 & 0xFFFFFF
//! ```
//!
//! so the least-changed vertex renders `#000000` and the most-changed
//! `#FE795F`.

use crate::delta::Distortion;
use crate::graph::{GraphPair, VertexId};
use crate::region::Region;
use crate::select::map_to_graph;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const COLOR_SCALE: f64 = (i32::MAX - 100_000) as f64;

/// A region as edge and color strings for both graph versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionRender {
    /// Seed of the rendered region.
    pub seed: VertexId,
    /// Induced edges in the earlier graph.
    pub before: Vec<String>,
    /// Induced edges in the later graph.
    pub after: Vec<String>,
    /// One color per member vertex, ascending id.
    pub colors: Vec<String>,
}

/// Render `region` against both versions of `pair`.
pub fn render_region(region: &Region, pair: &GraphPair, distortion: &Distortion) -> RegionRender {
    RegionRender {
        seed: region.seed,
        before: edge_strings(&map_to_graph(region, &pair.before).edges),
        after: edge_strings(&map_to_graph(region, &pair.after).edges),
        colors: region
            .vertices
            .iter()
            .map(|&id| color_string(distortion, id))
            .collect(),
    }
}

/// `"from,to"` per edge.
pub fn edge_strings(edges: &[(VertexId, VertexId)]) -> Vec<String> {
    edges.iter().map(|(a, b)| format!("{a},{b}")).collect()
}

/// 24-bit color for `id`.
pub fn vertex_color(distortion: &Distortion, id: VertexId) -> u32 {
    let scaled = (distortion.normalized(id) * COLOR_SCALE) as i32;
    (scaled & 0x00FF_FFFF) as u32
}

/// `"id,#RRGGBB"` for `id`.
pub fn color_string(distortion: &Distortion, id: VertexId) -> String {
    format!("{id},#{:06X}", vertex_color(distortion, id))
}

/// Decimal text of `x` cut (not rounded) to at most three fractional
/// digits, trailing zeros dropped.
pub fn format_metric(x: f64) -> String {
    let text = x.to_string();
    match text.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac[..frac.len().min(3)].trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{frac}")
            }
        }
        None => text,
    }
}

/// One `R<i>=<value>` line per entry, 1-based.
pub fn format_column(column: &[f64]) -> String {
    let mut out = String::new();
    for (i, &x) in column.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        // Writing to a String cannot fail.
        let _ = write!(out, "R{}={}", i + 1, format_metric(x));
    }
    out
}
