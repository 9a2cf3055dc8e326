//! mutador analyzes garbage collection traces.
//!
//! Collect a trace by running the program under study with
//! `GODEBUG=gctrace=1` and feed the captured output here. Both the legacy
//! per-cycle format and the modern clock/cpu format are recognized;
//! utilization analyses additionally require absolute cycle start times,
//! which the legacy format only carries on patched runtimes.

use std::fs::File;
use std::io;

use anyhow::{Context, Result};
use clap::Parser;

use mutador::cli::{Cli, OutputFormat};
use mutador::json_output::{JsonCurves, JsonOutput, JsonSummary};
use mutador::mud::Mud;
use mutador::parse::parse_gc_log;
use mutador::phase::GcStats;
use mutador::summary::Summary;
use mutador::table::{linspace, logspace, write_mud_map, Table};

/// Sample points for curve analyses.
const SAMPLES: usize = 500;

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing();

    let stats = match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            parse_gc_log(file)?
        }
        None => parse_gc_log(io::stdin().lock())?,
    };
    if stats.phases().is_empty() {
        anyhow::bail!("no GC recorded; did you set GODEBUG=gctrace=1?");
    }

    if args.summary || !args.any_analysis() {
        let summary = Summary::compute(&stats);
        match args.format {
            OutputFormat::Text => summary.print(),
            OutputFormat::Json => {
                let mut output = JsonOutput::new();
                output.summary = Some(JsonSummary::from(&summary));
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
    }

    if args.mmu {
        require_prog_times(&stats)?;
        emit_mmu(&args, &stats)?;
    }
    if args.mut_curves {
        require_prog_times(&stats)?;
        emit_mut(&args, &stats)?;
    }
    if let Some(window_ms) = args.mucdf {
        require_prog_times(&stats)?;
        emit_mucdf(&args, &stats, window_ms, false)?;
    }
    if let Some(window_ms) = args.muccdf {
        require_prog_times(&stats)?;
        emit_mucdf(&args, &stats, window_ms, true)?;
    }
    if args.mudmap {
        require_prog_times(&stats)?;
        emit_mud_map(&stats)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn require_prog_times(stats: &GcStats) -> Result<()> {
    if !stats.have_prog_times() {
        anyhow::bail!(
            "this analysis requires program execution times, which are missing from the GC trace"
        );
    }
    Ok(())
}

/// MMU over log-spaced window sizes from 1ms to 1s.
fn emit_mmu(args: &Cli, stats: &GcStats) -> Result<()> {
    let windows_s = logspace(-3.0, 0.0, SAMPLES, 10.0);
    let mut table = Table::new("granularity", windows_s);
    table.add_series("MMU", |w| stats.mmu((w * 1e9) as i64));
    emit_table(args, "granularity", &table)
}

/// Utilization percentile curves over log-spaced window sizes.
fn emit_mut(args: &Cli, stats: &GcStats) -> Result<()> {
    let windows_s = logspace(-3.0, 0.0, SAMPLES, 10.0);
    let muds: Vec<Mud> = windows_s
        .iter()
        .map(|&w| stats.mutator_utilization_distribution((w * 1e9) as i64))
        .collect();

    let mut table = Table::new("granularity", windows_s);
    for (label, pctile) in [
        ("100%ile", 0.0),
        ("99.9%ile", 0.001),
        ("99%ile", 0.01),
        ("90%ile", 0.1),
    ] {
        let ys = muds.iter().map(|mud| mud.inv_cdf(pctile)).collect();
        table.add_series_values(label, ys);
    }
    emit_table(args, "granularity", &table)
}

/// CDF (or complementary CDF) of utilization at one window size.
fn emit_mucdf(args: &Cli, stats: &GcStats, window_ms: f64, complementary: bool) -> Result<()> {
    let mud = stats.mutator_utilization_distribution((window_ms * 1e6) as i64);
    let utils = linspace(0.0, 1.0, 100);
    let mut table = Table::new("utilization", utils);
    let label = if complementary { "ccdf" } else { "cdf" };
    table.add_series(label, |util| {
        let p = mud.cdf(util);
        if complementary {
            1.0 - p
        } else {
            p
        }
    });
    emit_table(args, "utilization", &table)
}

/// MUD heat map over log-spaced window sizes from 1ms to 1s.
fn emit_mud_map(stats: &GcStats) -> Result<()> {
    let windows_ns: Vec<i64> = logspace(6.0, 9.0, 100, 10.0)
        .into_iter()
        .map(|w| w as i64)
        .collect();
    let muds: Vec<Mud> = windows_ns
        .iter()
        .map(|&w| stats.mutator_utilization_distribution(w))
        .collect();
    let utils = linspace(0.0, 1.0, 100);
    let stdout = io::stdout();
    write_mud_map(&mut stdout.lock(), &windows_ns, &muds, &utils)?;
    Ok(())
}

fn emit_table(args: &Cli, xlabel: &str, table: &Table) -> Result<()> {
    match args.format {
        OutputFormat::Text => {
            let stdout = io::stdout();
            table.write_to(&mut stdout.lock())?;
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::new();
            output.curves = Some(JsonCurves::from_table(xlabel, table));
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
