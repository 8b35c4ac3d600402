//! Polarity-aware min-max normalization.

use tracing::debug;

use crate::metrics::{Metric, MetricTable, MetricVector, Polarity};

/// Normalized metrics for every node plus the metrics that were constant.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// One row per node in canonical order; every value is in `[0, 1]`.
    pub rows: Vec<MetricVector>,
    /// Metrics whose range collapsed (`max == min`), in [`Metric::ALL`] order.
    pub degenerate: Vec<Metric>,
}

/// Min-max normalization that maps raw metric values to `[0, 1]`.
///
/// Non-finite inputs count as 0. If all values are equal (including a
/// single-element slice), every output is `1.0` and the second element of
/// the result is `true`. [`Polarity::Cost`] values are inverted after
/// scaling.
#[must_use]
pub fn normalize_metric(values: &[f64], polarity: Polarity) -> (Vec<f64>, bool) {
    if values.is_empty() {
        return (Vec::new(), false);
    }

    let finite: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_finite() { v } else { 0.0 })
        .collect();
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if !range.is_finite() || range.abs() <= f64::EPSILON {
        return (vec![1.0; values.len()], true);
    }

    let scaled = finite
        .iter()
        .map(|&value| {
            let unit = ((value - min) / range).clamp(0.0, 1.0);
            match polarity {
                Polarity::Benefit => unit,
                Polarity::Cost => 1.0 - unit,
            }
        })
        .collect();
    (scaled, false)
}

/// Normalize every metric column of a [`MetricTable`].
#[must_use]
pub fn normalize_table(table: &MetricTable) -> NormalizedTable {
    let mut rows = vec![MetricVector::default(); table.nodes.len()];
    let mut degenerate = Vec::new();

    for metric in Metric::ALL {
        let (column, collapsed) = normalize_metric(&table.column(metric), metric.polarity());
        if collapsed {
            degenerate.push(metric);
        }
        for (row, value) in rows.iter_mut().zip(column) {
            row.set(metric, value);
        }
    }

    if !degenerate.is_empty() {
        debug!(?degenerate, "constant metrics normalized to 1.0");
    }
    NormalizedTable { rows, degenerate }
}
