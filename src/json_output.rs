//! JSON output format for analysis results.

use serde::{Deserialize, Serialize};

use crate::summary::{DurationStats, MudPercentiles, Summary};
use crate::table::Table;

/// Order statistics over one duration sample, in nanoseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonDurationStats {
    pub max_ns: f64,
    pub p99_ns: f64,
    pub p95_ns: f64,
    pub mean_ns: f64,
    pub std_dev_ns: f64,
}

impl From<&DurationStats> for JsonDurationStats {
    fn from(stats: &DurationStats) -> Self {
        Self {
            max_ns: stats.max,
            p99_ns: stats.p99,
            p95_ns: stats.p95,
            mean_ns: stats.mean,
            std_dev_ns: stats.std_dev,
        }
    }
}

/// Per-phase-kind duration statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonKindStats {
    pub kind: String,
    #[serde(flatten)]
    pub stats: JsonDurationStats,
}

/// Utilization percentiles of the MUD at the summary window size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonUtilization {
    pub window_ns: i64,
    pub min: f64,
    pub p1: f64,
    pub p5: f64,
}

/// Summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub cycles: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pauses: Option<JsonDurationStats>,
    pub pauses_by_kind: Vec<JsonKindStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_mutator_utilization: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutator_utilization: Option<JsonUtilization>,
}

impl From<&Summary> for JsonSummary {
    fn from(summary: &Summary) -> Self {
        Self {
            cycles: summary.cycles,
            pauses: summary.pauses.as_ref().map(JsonDurationStats::from),
            pauses_by_kind: summary
                .pauses_by_kind
                .iter()
                .map(|(kind, stats)| JsonKindStats {
                    kind: kind.name().to_string(),
                    stats: stats.into(),
                })
                .collect(),
            mean_mutator_utilization: summary.mean_utilization,
            mutator_utilization: summary.utilization.as_ref().map(
                |u: &MudPercentiles| JsonUtilization {
                    window_ns: u.window_ns,
                    min: u.min,
                    p1: u.p1,
                    p5: u.p5,
                },
            ),
        }
    }
}

/// One named curve sampled over a shared x axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCurve {
    pub label: String,
    pub ys: Vec<f64>,
}

/// Curve-analysis output: a shared x axis plus one or more series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonCurves {
    pub xlabel: String,
    pub xs: Vec<f64>,
    pub series: Vec<JsonCurve>,
}

impl JsonCurves {
    pub fn from_table(xlabel: &str, table: &Table) -> Self {
        Self {
            xlabel: xlabel.to_string(),
            xs: table.xs().to_vec(),
            series: table
                .series()
                .map(|(label, ys)| JsonCurve {
                    label: label.to_string(),
                    ys: ys.to_vec(),
                })
                .collect(),
        }
    }
}

/// Root JSON output structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOutput {
    /// Format version identifier.
    pub version: String,
    /// Format name.
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<JsonSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curves: Option<JsonCurves>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "mutador-json-v1".to_string(),
            summary: None,
            curves: None,
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}
