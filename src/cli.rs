//! CLI argument parsing for mutador.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Output format for analysis results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text, or tab-separated tables for curve analyses
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "mutador")]
#[command(version)]
#[command(
    about = "Analyze garbage collection traces for mutator utilization",
    long_about = "Analyze garbage collection traces (GODEBUG=gctrace=1 style) and derive \
                  pause-time distributions, MMU curves, and mutator utilization \
                  distributions. Reads the trace from FILE or standard input."
)]
pub struct Cli {
    /// Compute summary statistics (default when no analysis is selected)
    #[arg(short = 's', long = "summary")]
    pub summary: bool,

    /// Compute the MMU curve over log-spaced window sizes
    #[arg(long = "mmu")]
    pub mmu: bool,

    /// Compute mutator utilization topology (percentile curves over window sizes)
    #[arg(long = "mut")]
    pub mut_curves: bool,

    /// Compute the mutator utilization CDF for all windows of this size, in milliseconds
    #[arg(long = "mucdf", value_name = "MS")]
    pub mucdf: Option<f64>,

    /// Compute the complementary mutator utilization CDF for windows of this size, in milliseconds
    #[arg(long = "muccdf", value_name = "MS")]
    pub muccdf: Option<f64>,

    /// Compute the MUD heat map in gnuplot nonuniform-matrix format
    #[arg(long = "mudmap")]
    pub mudmap: bool,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// GC trace file (standard input when omitted)
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl Cli {
    /// Whether any curve or map analysis was selected explicitly.
    pub fn any_analysis(&self) -> bool {
        self.mmu
            || self.mut_curves
            || self.mucdf.is_some()
            || self.muccdf.is_some()
            || self.mudmap
    }
}
