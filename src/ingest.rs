//! Text ingestion boundary.
//!
//! Two line formats are accepted:
//!
//! - **Triples**: `from,to,weight` per edge. A leading comma is tolerated and
//!   weights written as floats with no fractional part (`3.0`) are accepted.
//! - **Records**: `id,value,[neighbor:weight,neighbor:weight,...]` per vertex.
//!
//! Blank lines and lines starting with `#` are skipped. The first malformed
//! line aborts parsing with [`Error::Parse`].

use crate::error::{Error, Result};
use crate::graph::{VertexId, WeightedGraph};

/// Parse `from,to,weight` lines into triples.
pub fn parse_triples(input: &str) -> Result<Vec<(u32, u32, i64)>> {
    let mut out = Vec::new();
    for (i, raw) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix(',').unwrap_or(line);
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(Error::parse(
                line_no,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        }
        let from = parse_id(fields[0], line_no)?;
        let to = parse_id(fields[1], line_no)?;
        let weight = parse_weight(fields[2], line_no)?;
        out.push((from, to, weight));
    }
    Ok(out)
}

/// Parse a triple file straight into a graph.
pub fn read_triples(input: &str) -> Result<WeightedGraph> {
    Ok(WeightedGraph::from_triples(parse_triples(input)?))
}

/// Parse per-vertex adjacency records into a graph.
///
/// The `value` column is ignored; distortion is always recomputed. Each
/// neighbor entry adds an undirected edge, so records may list an edge from
/// either end (or both).
pub fn read_records(input: &str) -> Result<WeightedGraph> {
    let mut graph = WeightedGraph::new();
    for (i, raw) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (head, tail) = line
            .split_once('[')
            .ok_or_else(|| Error::parse(line_no, "missing '[' before neighbor list"))?;
        let body = tail
            .strip_suffix(']')
            .ok_or_else(|| Error::parse(line_no, "neighbor list is not closed with ']'"))?;
        let id_field = head
            .split(',')
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::parse(line_no, "missing vertex id"))?;
        let id = VertexId(parse_id(id_field, line_no)?);
        graph.add_vertex(id);

        for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (n, w) = entry.split_once(':').ok_or_else(|| {
                Error::parse(line_no, format!("neighbor entry '{entry}' is not id:weight"))
            })?;
            let neighbor = VertexId(parse_id(n.trim(), line_no)?);
            let weight = parse_weight(w.trim(), line_no)?;
            graph.add_edge(id, neighbor, weight);
        }
    }
    Ok(graph)
}

fn parse_id(field: &str, line: usize) -> Result<u32> {
    let id = parse_integral(field)
        .filter(|v| (1..=i64::from(u32::MAX)).contains(v))
        .ok_or_else(|| Error::parse(line, format!("'{field}' is not a positive vertex id")))?;
    Ok(id as u32)
}

fn parse_weight(field: &str, line: usize) -> Result<i64> {
    let weight = parse_integral(field)
        .ok_or_else(|| Error::parse(line, format!("'{field}' is not an integer weight")))?;
    if weight < 1 {
        return Err(Error::parse(line, format!("weight {weight} is not positive")));
    }
    Ok(weight)
}

/// Integers, or floats whose fractional part is zero.
fn parse_integral(field: &str) -> Option<i64> {
    if let Ok(v) = field.parse::<i64>() {
        return Some(v);
    }
    let f = field.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
