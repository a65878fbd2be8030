//! Turns an [`EvaluationResults`] payload into what the results section shows.
//!
//! Everything here is a pure function of the payload. Cards, datasets and
//! table rows are rebuilt from scratch on every call.

use serde::Serialize;
use tracing::debug;

use crate::charts::{LineChart, LineDataset, MethodColor, RadarChart, RadarDataset};
use crate::model::{EvaluationResults, Metrics, RADAR_DIMENSIONS};

pub const TABLE_COLUMNS: [&str; 3] = ["AVG", "N_IR", "N_R2"];

/// Method with the strictly greatest `AVG`; the first one wins a tie.
pub fn best_method(results: &EvaluationResults) -> Option<&str> {
    let mut best: Option<&str> = None;
    let mut best_score = f64::NEG_INFINITY;
    for (name, method) in &results.methods {
        if method.metrics.avg > best_score {
            best_score = method.metrics.avg;
            best = Some(name.as_str());
        }
    }
    best
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CardKind {
    Method { name: String, is_best: bool },
    TotalSessions,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricCard {
    pub value: String,
    pub kind: CardKind,
}

impl MetricCard {
    pub fn label(&self, sessions_label: &str) -> String {
        match &self.kind {
            CardKind::Method { name, is_best: true } => format!("{name} AVG 🏆"),
            CardKind::Method { name, .. } => format!("{name} AVG"),
            CardKind::TotalSessions => sessions_label.to_string(),
        }
    }

    pub fn is_best(&self) -> bool {
        matches!(self.kind, CardKind::Method { is_best: true, .. })
    }
}

/// One `AVG` card per method followed by the total-sessions card.
pub fn metric_cards(results: &EvaluationResults) -> Vec<MetricCard> {
    let best = best_method(results);
    let mut cards: Vec<MetricCard> = results
        .methods
        .iter()
        .map(|(name, method)| MetricCard {
            value: format_number(method.metrics.avg),
            kind: CardKind::Method {
                name: name.clone(),
                is_best: best == Some(name.as_str()),
            },
        })
        .collect();
    cards.push(MetricCard {
        value: results.total_sessions.to_string(),
        kind: CardKind::TotalSessions,
    });
    cards
}

/// AL(k) curves. The x axis is as long as the longest curve; shorter curves stop early.
pub fn al_curve_chart(results: &EvaluationResults) -> LineChart {
    let max_rounds = results
        .methods
        .values()
        .map(|m| m.al_curve.len())
        .max()
        .unwrap_or(0);
    let labels = (1..=max_rounds).map(|i| format!("Turn {i}")).collect();
    let datasets = results
        .methods
        .iter()
        .map(|(name, method)| LineDataset {
            label: name.clone(),
            data: method.al_curve.clone(),
            color: MethodColor::for_method(name),
        })
        .collect();
    LineChart {
        labels,
        datasets,
        y_min: 0.0,
        y_max: 100.0,
    }
}

/// Radar datasets in [`RADAR_DIMENSIONS`] order; absent values stay `None`.
pub fn radar_chart(results: &EvaluationResults) -> RadarChart {
    let mismatches = results.radar_mismatches();
    if !mismatches.is_empty() {
        debug!(?mismatches, "methods and radar_data disagree on method keys");
    }
    let datasets = results
        .methods
        .keys()
        .map(|name| {
            let axes = results.radar_data.get(name);
            RadarDataset {
                label: name.clone(),
                data: RADAR_DIMENSIONS
                    .iter()
                    .map(|dim| axes.and_then(|a| a.get(*dim)).copied())
                    .collect(),
                color: MethodColor::for_method(name),
            }
        })
        .collect();
    RadarChart {
        labels: RADAR_DIMENSIONS.iter().map(|d| d.to_string()).collect(),
        datasets,
        r_min: 0.0,
        r_max: 100.0,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableCell {
    pub value: f64,
    pub best: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub method: String,
    pub cells: Vec<TableCell>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonTable {
    pub columns: Vec<String>,
    pub rows: Vec<TableRow>,
}

fn column_value(metrics: &Metrics, column: usize) -> f64 {
    match column {
        0 => metrics.avg,
        1 => metrics.n_ir,
        _ => metrics.n_r2,
    }
}

/// Per-method rows; every cell equal to its column maximum is marked best.
pub fn comparison_table(results: &EvaluationResults) -> ComparisonTable {
    let column_max: Vec<f64> = (0..TABLE_COLUMNS.len())
        .map(|col| {
            results
                .methods
                .values()
                .map(|m| column_value(&m.metrics, col))
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect();
    let rows = results
        .methods
        .iter()
        .map(|(name, method)| TableRow {
            method: name.clone(),
            cells: column_max
                .iter()
                .enumerate()
                .map(|(col, max)| {
                    let value = column_value(&method.metrics, col);
                    TableCell {
                        value,
                        best: value == *max,
                    }
                })
                .collect(),
        })
        .collect();
    ComparisonTable {
        columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

/// Everything the results section renders for one payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultsView {
    pub best_method: Option<String>,
    pub cards: Vec<MetricCard>,
    pub al_curve: LineChart,
    pub radar: RadarChart,
    pub table: ComparisonTable,
}

pub fn present(results: &EvaluationResults) -> ResultsView {
    ResultsView {
        best_method: best_method(results).map(str::to_string),
        cards: metric_cards(results),
        al_curve: al_curve_chart(results),
        radar: radar_chart(results),
        table: comparison_table(results),
    }
}

/// Numbers the way the page prints them: `70`, `85.5`, `0.125`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
