use std::collections::BTreeMap;

use evs_core::errors::{ErrorInfo, EvsError};
use serde::{Deserialize, Serialize};

/// Weighted one-dimensional histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin edges (inclusive of the left edge, exclusive of the right edge).
    pub edges: Vec<f64>,
    /// Sum of weights per bin.
    pub sum_w: Vec<f64>,
    /// Sum of squared weights per bin.
    pub sum_w2: Vec<f64>,
    /// Number of fills, including under- and overflow.
    pub entries: u64,
    /// Weight below the first edge.
    pub underflow: f64,
    /// Weight at or above the last edge.
    pub overflow: f64,
}

impl Histogram {
    /// Histogram with `bins` equal-width bins spanning `[start, end)`.
    pub fn uniform(bins: usize, start: f64, end: f64) -> Result<Self, EvsError> {
        let bins = bins.max(1);
        let step = (end - start) / bins as f64;
        let edges = (0..=bins).map(|idx| start + idx as f64 * step).collect();
        Self::from_edges(edges)
    }

    /// Histogram over explicit, strictly increasing edges.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, EvsError> {
        validate_edges(&edges)?;
        let bins = edges.len() - 1;
        Ok(Self {
            edges,
            sum_w: vec![0.0; bins],
            sum_w2: vec![0.0; bins],
            entries: 0,
            underflow: 0.0,
            overflow: 0.0,
        })
    }

    /// Adds `value` with `weight`.
    pub fn fill(&mut self, value: f64, weight: f64) {
        self.entries += 1;
        match bin_index(&self.edges, value) {
            Slot::Under => self.underflow += weight,
            Slot::Over => self.overflow += weight,
            Slot::Bin(idx) => {
                self.sum_w[idx] += weight;
                self.sum_w2[idx] += weight * weight;
            }
        }
    }

    /// Sum of in-range weights.
    pub fn integral(&self) -> f64 {
        self.sum_w.iter().sum()
    }
}

/// Gen-bin × rec-bin response matrix.
///
/// Rows are generator bins, columns reconstructed bins. Values outside the
/// edges are not recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    /// Shared bin edges for both axes.
    pub edges: Vec<f64>,
    /// Summed weights, `cells[gen][rec]`.
    pub cells: Vec<Vec<f64>>,
}

impl Migration {
    /// Empty matrix over the given edges.
    pub fn from_edges(edges: Vec<f64>) -> Result<Self, EvsError> {
        validate_edges(&edges)?;
        let bins = edges.len() - 1;
        Ok(Self {
            edges,
            cells: vec![vec![0.0; bins]; bins],
        })
    }

    /// Records one event; returns false when either value is out of range.
    pub fn fill(&mut self, gen: f64, rec: f64, weight: f64) -> bool {
        match (bin_index(&self.edges, gen), bin_index(&self.edges, rec)) {
            (Slot::Bin(g), Slot::Bin(r)) => {
                self.cells[g][r] += weight;
                true
            }
            _ => false,
        }
    }

    /// Sum of all recorded weights.
    pub fn total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }
}

/// Named plots accumulated by an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlotBook {
    /// Histograms keyed by name.
    pub histograms: BTreeMap<String, Histogram>,
    /// Migration matrices keyed by name.
    pub migrations: BTreeMap<String, Migration>,
}

impl PlotBook {
    /// True when no plot was booked.
    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty() && self.migrations.is_empty()
    }
}

enum Slot {
    Under,
    Over,
    Bin(usize),
}

fn bin_index(edges: &[f64], value: f64) -> Slot {
    let upper = edges.partition_point(|edge| *edge <= value);
    if upper == 0 || value.is_nan() {
        Slot::Under
    } else if upper == edges.len() {
        Slot::Over
    } else {
        Slot::Bin(upper - 1)
    }
}

fn validate_edges(edges: &[f64]) -> Result<(), EvsError> {
    let increasing = edges
        .windows(2)
        .all(|pair| pair[0].is_finite() && pair[1].is_finite() && pair[0] < pair[1]);
    if edges.len() < 2 || !increasing {
        return Err(EvsError::Config(
            ErrorInfo::new("histogram.edges", "edges must be finite and strictly increasing")
                .with_context("count", edges.len().to_string()),
        ));
    }
    Ok(())
}
