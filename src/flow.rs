//! Flow records and the node/link reshaping a Sankey renderer expects.
//!
//! Labels are indexed in first-seen order so the same input always yields the
//! same graph. Selection (inflow/outflow partitioning and top-K truncation) is
//! applied by the caller before `build`, never inside it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{DashboardError, Result};

pub const DEFAULT_TOP_K: usize = 10;

/// One observed transfer of volume from `source` token to `target` token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub source: String,
    pub target: String,
    #[serde(alias = "volume")]
    pub value: f64,
}

impl FlowRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowEdge {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowGraph {
    pub labels: Vec<String>,
    pub edges: Vec<FlowEdge>,
}

impl FlowGraph {
    pub fn label_of(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Reshape records into a label list plus index-based edges.
///
/// Parallel (source, target) pairs stay separate edges.
pub fn build(records: &[FlowRecord]) -> FlowGraph {
    let mut labels: Vec<String> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut edges = Vec::with_capacity(records.len());

    for rec in records {
        let source = intern(&mut index, &mut labels, &rec.source);
        let target = intern(&mut index, &mut labels, &rec.target);
        edges.push(FlowEdge {
            source,
            target,
            value: rec.value,
        });
    }

    FlowGraph { labels, edges }
}

fn intern<'a>(index: &mut HashMap<&'a str, usize>, labels: &mut Vec<String>, token: &'a str) -> usize {
    *index.entry(token).or_insert_with(|| {
        labels.push(token.to_string());
        labels.len() - 1
    })
}

/// Distinct tokens across sources and targets, sorted for the dropdown.
pub fn tokens(records: &[FlowRecord]) -> Vec<String> {
    let set: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| [r.source.as_str(), r.target.as_str()])
        .collect();
    set.into_iter().map(str::to_string).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inflow,
    Outflow,
    Both,
}

impl Direction {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "inflow" | "in" => Ok(Direction::Inflow),
            "outflow" | "out" => Ok(Direction::Outflow),
            "both" => Ok(Direction::Both),
            other => Err(DashboardError::Config(format!(
                "direction must be inflow, outflow or both, got `{}`",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Inflow => "inflow",
            Direction::Outflow => "outflow",
            Direction::Both => "both",
        }
    }
}

/// What the user picked in the dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub token: Option<String>,
    pub direction: Direction,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            token: None,
            direction: Direction::Both,
        }
    }
}

/// Stable descending sort by value, then truncate to `k`.
///
/// Equal values keep input order.
pub fn top_k(records: impl IntoIterator<Item = FlowRecord>, k: usize) -> Vec<FlowRecord> {
    let mut out: Vec<FlowRecord> = records.into_iter().collect();
    out.sort_by(|a, b| b.value.total_cmp(&a.value));
    out.truncate(k);
    out
}

/// Records flowing into `token`, largest first, at most `k`.
pub fn inflows(records: &[FlowRecord], token: &str, k: usize) -> Vec<FlowRecord> {
    top_k(records.iter().filter(|r| r.target == token).cloned(), k)
}

/// Records flowing out of `token`, largest first, at most `k`.
pub fn outflows(records: &[FlowRecord], token: &str, k: usize) -> Vec<FlowRecord> {
    top_k(records.iter().filter(|r| r.source == token).cloned(), k)
}

/// With `Direction::Both` the inflow list is followed by the outflow list, so a
/// self-loop on the selected token appears once in each.
pub fn select(records: &[FlowRecord], selection: &Selection, k: usize) -> Vec<FlowRecord> {
    let token = match selection.token.as_deref() {
        Some(t) => t,
        None => return top_k(records.iter().cloned(), k),
    };
    match selection.direction {
        Direction::Inflow => inflows(records, token, k),
        Direction::Outflow => outflows(records, token, k),
        Direction::Both => {
            let mut out = inflows(records, token, k);
            out.extend(outflows(records, token, k));
            out
        }
    }
}
