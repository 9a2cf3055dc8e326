//! GC trace parsing.
//!
//! Two incompatible trace dialects are recognized, discriminated by their
//! leading-line pattern and kept as separate grammars:
//!
//! - The legacy per-cycle line format:
//!   `gc<N>(<P>): <stop>+<sweepTerm>+<markTerm>+<shrink> us, ... [@<T>]`.
//!   The trailing `@<T>` (absolute cycle start in microseconds) is only
//!   present when the runtime was patched to report it; cycles without it
//!   clear program-time tracking for the whole run.
//! - The modern format:
//!   `gc #<N> @<T>s ...: <c0>+..+<c4> ms clock, <u0>+..+<u4> ms cpu, ... <P> P`,
//!   where each cpu segment may be a slash-list of sub-contributions.
//!
//! Lines matching neither dialect are ignored. Within a recognized cycle,
//! malformed or missing pieces are either fatal ([`ParseError`]) or
//! lenient: warned about on the diagnostic stream and the record
//! discarded.

use std::io::{BufRead, BufReader, Read};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::phase::{GcStats, Phase, PhaseKind};

/// Largest backward time jump between cycles treated as a rounding
/// artifact rather than a corrupt trace. Not tunable; part of the
/// contract.
const MAX_BACKWARD_NS: i64 = 5_000_000;

/// Errors for trace parsing. No partial [`GcStats`] is produced on error.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("failed to read GC trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("trace goes backward by {shift_ns}ns between GC cycles {prev} and {next}")]
    TraceGoesBackward { prev: u32, next: u32, shift_ns: i64 },

    #[error("malformed GC trace line: {0:?}")]
    MalformedLine(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;

static LEGACY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^gc\d+\(").unwrap());
static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^gc(\d+)\((\d+)\): (\d+)\+(\d+)\+(\d+)\+(\d+) us(?:.* @(\d+))?").unwrap()
});

static MODERN_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^gc #\d+").unwrap());
static MODERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^gc #(\d+) @([0-9.]+)s [^:]*: .*?([0-9.+/]+) ms clock, ([0-9.+/]+) ms cpu,.*?(\d+) P\b",
    )
    .unwrap()
});

/// Clock segments of a modern cycle line, in emission order. The trailing
/// sweep phase is implicit.
const TIMED_KINDS: [PhaseKind; 5] = [
    PhaseKind::SweepTerm,
    PhaseKind::Scan,
    PhaseKind::InstallWb,
    PhaseKind::Mark,
    PhaseKind::MarkTerm,
];

/// Parse a GC trace into [`GcStats`].
///
/// Reads `input` to EOF. Unrecognized lines are skipped; recoverable
/// problems inside recognized cycles are logged via `tracing` and the
/// offending cycle discarded; structural problems abort with a
/// [`ParseError`].
pub fn parse_gc_log<R: Read>(input: R) -> Result<GcStats> {
    let reader = BufReader::new(input);
    let mut parser = Parser::new();
    for line in reader.lines() {
        parser.line(&line?)?;
    }
    Ok(parser.finish())
}

/// One recognized cycle before it is appended to the log.
struct Cycle {
    n: u32,
    /// Cycle phases; the last is the open tail sweep.
    phases: Vec<Phase>,
    /// Whether `phases[*].begin` carry absolute program times.
    have_time: bool,
}

struct Parser {
    log: Vec<Phase>,
    n: usize,
    prog_times: bool,
}

impl Parser {
    fn new() -> Self {
        Self {
            log: Vec::new(),
            n: 0,
            prog_times: true,
        }
    }

    fn line(&mut self, line: &str) -> Result<()> {
        let cycle = if MODERN_PREFIX.is_match(line) {
            modern_cycle(line)?
        } else if LEGACY_PREFIX.is_match(line) {
            Some(legacy_cycle(line)?)
        } else {
            None
        };
        if let Some(cycle) = cycle {
            self.push_cycle(cycle)?;
        }
        Ok(())
    }

    /// Close the previous cycle's tail sweep against the new cycle's
    /// begin, repairing small rounding-induced overlaps, then append the
    /// new cycle.
    fn push_cycle(&mut self, mut cycle: Cycle) -> Result<()> {
        if !cycle.have_time {
            self.prog_times = false;
        }

        if let Some(last) = self.log.last_mut() {
            if last.duration == Phase::UNKNOWN_DURATION && self.prog_times {
                let mut begin = cycle.phases[0].begin;
                if begin < last.begin {
                    let shift_ns = last.begin - begin;
                    if shift_ns > MAX_BACKWARD_NS {
                        return Err(ParseError::TraceGoesBackward {
                            prev: last.n,
                            next: cycle.n,
                            shift_ns,
                        });
                    }
                    // Rounding artifact: drop the new cycle's claim on
                    // time before the open sweep started.
                    begin = last.begin;
                }
                if begin == last.begin {
                    // Keep the sweep non-empty; phases may move forward
                    // by at most this 1ns.
                    begin = last.begin.saturating_add(1);
                }
                let shift = begin - cycle.phases[0].begin;
                if shift != 0 {
                    for phase in &mut cycle.phases {
                        phase.begin = phase.begin.saturating_add(shift);
                    }
                }
                last.duration = begin - last.begin;
            }
        }

        self.log.append(&mut cycle.phases);
        self.n += 1;
        Ok(())
    }

    fn finish(mut self) -> GcStats {
        // Drop the unterminated trailing phase.
        if matches!(self.log.last(), Some(p) if p.duration == Phase::UNKNOWN_DURATION) {
            self.log.pop();
        }
        GcStats::from_phases(self.log, self.n, self.prog_times)
    }
}

fn int_field<T: std::str::FromStr>(caps: &regex::Captures<'_>, i: usize, line: &str) -> Result<T> {
    caps[i]
        .parse()
        .map_err(|_| ParseError::MalformedLine(line.to_string()))
}

/// Parse a legacy per-cycle line into its three phases.
fn legacy_cycle(line: &str) -> Result<Cycle> {
    let caps = LEGACY_RE
        .captures(line)
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    let n: u32 = int_field(&caps, 1, line)?;
    // Microsecond fields; u32 bounds them to plausible pause times.
    let stop = int_field::<u32>(&caps, 3, line)? as i64;
    let sweep_term = int_field::<u32>(&caps, 4, line)? as i64;
    let mark_term = int_field::<u32>(&caps, 5, line)? as i64;
    let shrink = int_field::<u32>(&caps, 6, line)? as i64;
    let at_us: Option<i64> = match caps.get(7) {
        Some(m) => Some(
            m.as_str()
                .parse()
                .map_err(|_| ParseError::MalformedLine(line.to_string()))?,
        ),
        None => None,
    };

    let have_time = at_us.is_some();
    let mut begin = at_us
        .unwrap_or(0)
        .checked_mul(1000)
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    let phase = |begin: i64, duration: i64, kind: PhaseKind, gc_procs: f64, stw: bool| Phase {
        begin,
        duration,
        kind,
        n,
        gomaxprocs: 1,
        gc_procs,
        stw,
    };

    let mut phases = Vec::with_capacity(3);
    // Stopping the world is accounted to sweep termination.
    let dur = (stop + sweep_term) * 1000;
    phases.push(phase(begin, dur, PhaseKind::SweepTerm, 1.0, true));
    begin = begin.saturating_add(dur);
    let dur = (mark_term + shrink) * 1000;
    phases.push(phase(begin, dur, PhaseKind::MarkTerm, 1.0, true));
    begin = begin.saturating_add(dur);
    phases.push(phase(
        begin,
        Phase::UNKNOWN_DURATION,
        PhaseKind::Sweep,
        0.0,
        false,
    ));

    // Without @T the begins carry no meaning; keep the sentinel.
    if !have_time {
        for phase in &mut phases {
            phase.begin = 0;
        }
    }

    Ok(Cycle {
        n,
        phases,
        have_time,
    })
}

/// Parse a modern cycle line into its six phases. Returns `None` when the
/// cycle is recognizable but unusable (warned about and discarded).
fn modern_cycle(line: &str) -> Result<Option<Cycle>> {
    let caps = MODERN_RE
        .captures(line)
        .ok_or_else(|| ParseError::MalformedLine(line.to_string()))?;

    let n: u32 = int_field(&caps, 1, line)?;
    let ts_s: f64 = caps[2]
        .parse()
        .map_err(|_| ParseError::MalformedLine(line.to_string()))?;
    let gomaxprocs: u32 = int_field(&caps, 5, line)?;

    let clocks: Vec<&str> = caps[3].split('+').collect();
    let cpus: Vec<&str> = caps[4].split('+').collect();

    if clocks.len() < TIMED_KINDS.len() || cpus.len() < TIMED_KINDS.len() {
        warn!(
            cycle = n,
            clock_segments = clocks.len(),
            cpu_segments = cpus.len(),
            "GC cycle has fewer phases than expected; discarding cycle"
        );
        return Ok(None);
    }
    if clocks.len() > TIMED_KINDS.len() || cpus.len() > TIMED_KINDS.len() {
        warn!(
            cycle = n,
            "unknown trailing GC phase segments; ignoring them"
        );
    }

    let mut begin = (ts_s * 1e9).round() as i64;
    let mut phases = Vec::with_capacity(TIMED_KINDS.len() + 1);
    for (i, &kind) in TIMED_KINDS.iter().enumerate() {
        let Ok(clock_ms) = clocks[i].parse::<f64>() else {
            warn!(cycle = n, segment = clocks[i], "bad clock value; discarding cycle");
            return Ok(None);
        };
        // A cpu segment may be a slash-list of sub-contributions to sum.
        let mut cpu_ms = 0.0;
        for part in cpus[i].split('/') {
            match part.parse::<f64>() {
                Ok(v) => cpu_ms += v,
                Err(_) => {
                    warn!(cycle = n, segment = cpus[i], "bad procs value; discarding cycle");
                    return Ok(None);
                }
            }
        }

        let stw = matches!(kind, PhaseKind::SweepTerm | PhaseKind::MarkTerm);
        let gc_procs = if clock_ms > 0.0 {
            // ms rounding can push cpu past clock; keep within the proc
            // budget.
            (cpu_ms / clock_ms).min(gomaxprocs as f64)
        } else if stw {
            gomaxprocs as f64
        } else {
            0.0
        };

        let duration = (clock_ms * 1e6).round() as i64;
        phases.push(Phase {
            begin,
            duration,
            kind,
            n,
            gomaxprocs,
            gc_procs,
            stw,
        });
        begin = begin.saturating_add(duration);
    }

    // Sweep is implicitly the last phase; its end is the next cycle's
    // begin.
    phases.push(Phase {
        begin,
        duration: Phase::UNKNOWN_DURATION,
        kind: PhaseKind::Sweep,
        n,
        gomaxprocs,
        gc_procs: 0.0,
        stw: false,
    });

    Ok(Some(Cycle {
        n,
        phases,
        have_time: true,
    }))
}
