//! Human-readable summary report.
//!
//! Aggregates a parsed trace into the default report: pause-time order
//! statistics, per-kind phase duration distributions, mean mutator
//! utilization, and the 10ms-window utilization percentiles.

use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::phase::{GcStats, PhaseKind};

/// Window size for the utilization percentile line of the report.
const SUMMARY_WINDOW_NS: i64 = 10_000_000;

/// Order statistics over one sample of durations, in nanoseconds.
#[derive(Debug, Clone, Copy)]
pub struct DurationStats {
    pub max: f64,
    pub p99: f64,
    pub p95: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl DurationStats {
    /// Compute stats over a sample; `None` for an empty sample.
    pub fn from_sample(xs: Vec<f64>) -> Option<Self> {
        if xs.is_empty() {
            return None;
        }
        let max = Statistics::max(&xs);
        let mean = Statistics::mean(&xs);
        let std_dev = if xs.len() > 1 {
            Statistics::std_dev(&xs)
        } else {
            0.0
        };
        let mut data = Data::new(xs);
        Some(Self {
            max,
            p99: data.percentile(99),
            p95: data.percentile(95),
            mean,
            std_dev,
        })
    }
}

/// Utilization percentiles of the MUD at [`SUMMARY_WINDOW_NS`].
#[derive(Debug, Clone, Copy)]
pub struct MudPercentiles {
    pub window_ns: i64,
    pub min: f64,
    pub p1: f64,
    pub p5: f64,
}

/// Everything the default report shows.
#[derive(Debug, Clone)]
pub struct Summary {
    pub cycles: usize,
    /// Coalesced stop-the-world pause durations.
    pub pauses: Option<DurationStats>,
    /// Phase durations grouped by kind, in stable kind order. Kinds with
    /// no observed durations are absent.
    pub pauses_by_kind: Vec<(PhaseKind, DurationStats)>,
    /// Only present when the trace carries program times.
    pub mean_utilization: Option<f64>,
    pub utilization: Option<MudPercentiles>,
}

impl Summary {
    pub fn compute(stats: &GcStats) -> Summary {
        let pause_durations: Vec<f64> = stats
            .stops()
            .iter()
            .map(|phase| phase.duration as f64)
            .collect();
        let pauses = DurationStats::from_sample(pause_durations);

        let mut pauses_by_kind = Vec::new();
        for kind in PhaseKind::ALL {
            let durations: Vec<f64> = stats
                .phases()
                .iter()
                .filter(|phase| phase.kind == kind && phase.duration >= 0)
                .map(|phase| phase.duration as f64)
                .collect();
            if let Some(kind_stats) = DurationStats::from_sample(durations) {
                if kind_stats.max > 0.0 {
                    pauses_by_kind.push((kind, kind_stats));
                }
            }
        }

        let (mean_utilization, utilization) = if stats.have_prog_times()
            && !stats.phases().is_empty()
        {
            let mud = stats.mutator_utilization_distribution(SUMMARY_WINDOW_NS);
            (
                Some(stats.mean_mutator_utilization()),
                Some(MudPercentiles {
                    window_ns: mud.window_ns(),
                    min: mud.inv_cdf(0.0),
                    p1: mud.inv_cdf(0.01),
                    p5: mud.inv_cdf(0.05),
                }),
            )
        } else {
            (None, None)
        };

        Summary {
            cycles: stats.count(),
            pauses,
            pauses_by_kind,
            mean_utilization,
            utilization,
        }
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        if let Some(p) = &self.pauses {
            println!(
                "STW: max={} 99%ile={} 95%ile={} mean={}",
                format_ns(p.max),
                format_ns(p.p99),
                format_ns(p.p95),
                format_ns(p.mean)
            );
        }

        if !self.pauses_by_kind.is_empty() {
            println!();
            for (kind, p) in &self.pauses_by_kind {
                println!(
                    "{:<11} max={} 99%ile={} 95%ile={} mean={} stddev={}",
                    format!("{kind}:"),
                    format_ns(p.max),
                    format_ns(p.p99),
                    format_ns(p.p95),
                    format_ns(p.mean),
                    format_ns(p.std_dev)
                );
            }
        }

        if let (Some(mean), Some(u)) = (self.mean_utilization, &self.utilization) {
            println!();
            println!("Mean mutator utilization: {}", format_pct(mean));
            println!(
                "{} mutator utilization: min={} 1%ile={} 5%ile={}",
                format_ns(u.window_ns as f64),
                format_pct(u.min),
                format_pct(u.p1),
                format_pct(u.p5)
            );
        }
    }
}

/// Format a nanosecond quantity with an adaptive unit.
pub fn format_ns(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1e9 {
        format!("{:.2}s", v / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}ms", v / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}µs", v / 1e3)
    } else {
        format!("{v:.0}ns")
    }
}

/// Format a utilization ratio as a percentage.
pub fn format_pct(v: f64) -> String {
    format!("{:.1}%", v * 100.0)
}
