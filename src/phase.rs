//! Phase timeline model for garbage collection traces.
//!
//! A parsed trace is a [`GcStats`]: an ordered log of [`Phase`] records
//! assumed to span every moment of recorded execution. Aggregate views
//! (coalesced stop-the-world pauses, maximum pause) are derived here;
//! utilization analyses live in the `mu` and `mud` modules.

use std::fmt;

/// Kind of a phase within a garbage collection cycle.
///
/// The ordinal order is stable and part of the interface: consumers group
/// pauses by iterating [`PhaseKind::ALL`] in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhaseKind {
    SweepTerm,
    Scan,
    InstallWb,
    Mark,
    MarkTerm,
    Sweep,
    /// Several coalesced stop-the-world phases of differing kinds. Only
    /// produced by [`GcStats::stops`], never by the parser.
    Multiple,
}

impl PhaseKind {
    /// All kinds in stable ordinal order.
    pub const ALL: [PhaseKind; 7] = [
        PhaseKind::SweepTerm,
        PhaseKind::Scan,
        PhaseKind::InstallWb,
        PhaseKind::Mark,
        PhaseKind::MarkTerm,
        PhaseKind::Sweep,
        PhaseKind::Multiple,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PhaseKind::SweepTerm => "sweep term",
            PhaseKind::Scan => "scan",
            PhaseKind::InstallWb => "install wb",
            PhaseKind::Mark => "mark",
            PhaseKind::MarkTerm => "mark term",
            PhaseKind::Sweep => "sweep",
            PhaseKind::Multiple => "multiple",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single phase of a garbage collection cycle.
///
/// Spans nanoseconds `[begin, begin + duration)`. If absolute times are
/// unknown, `begin` is 0 and `duration` may be [`Phase::UNKNOWN_DURATION`]
/// (the phase is still open).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phase {
    pub begin: i64,
    pub duration: i64,
    pub kind: PhaseKind,
    /// GC cycle ordinal (1-based).
    pub n: u32,
    /// Processor count available to the runtime during this phase.
    pub gomaxprocs: u32,
    /// Average number of processors consumed by the collector during this
    /// phase. In `[0, gomaxprocs]`.
    pub gc_procs: f64,
    /// Whether this phase preempts all mutator execution.
    pub stw: bool,
}

impl Phase {
    /// Sentinel duration for a phase whose end has not been observed yet.
    pub const UNKNOWN_DURATION: i64 = -1;

    /// End time of the phase. Panics if the duration is still unknown.
    pub fn end(&self) -> i64 {
        assert!(
            self.duration != Self::UNKNOWN_DURATION,
            "phase has unknown duration"
        );
        self.begin + self.duration
    }
}

/// Parsed statistics for one program run.
#[derive(Debug, Clone)]
pub struct GcStats {
    /// Log of phases in program time order.
    log: Vec<Phase>,
    /// Number of recorded garbage collections.
    n: usize,
    /// Whether `begin` values indicate when phases happened during program
    /// execution. When true, `log[i].begin + log[i].duration ==
    /// log[i+1].begin`.
    prog_times: bool,
}

impl GcStats {
    /// Assemble stats from an explicit phase log.
    ///
    /// The log must be in non-decreasing `begin` order; `prog_times`
    /// declares whether the begin times carry program-relative meaning.
    pub fn from_phases(log: Vec<Phase>, n: usize, prog_times: bool) -> Self {
        Self { log, n, prog_times }
    }

    /// Whether the log has begin times that indicate when phases happened
    /// during program execution.
    ///
    /// Without this information one can still analyze phase durations, but
    /// not properties over program execution time.
    pub fn have_prog_times(&self) -> bool {
        self.prog_times
    }

    /// Number of recorded garbage collections.
    pub fn count(&self) -> usize {
        self.n
    }

    /// The recorded phases, in program time order.
    pub fn phases(&self) -> &[Phase] {
        &self.log
    }

    /// All stop-the-world pauses, with runs of consecutive STW phases
    /// coalesced into single phases.
    ///
    /// A coalesced phase has the summed duration, the duration-weighted
    /// mean of the constituents' `gc_procs`, and kind
    /// [`PhaseKind::Multiple`] when the constituents disagree on kind.
    pub fn stops(&self) -> Vec<Phase> {
        let mut stw: Vec<Phase> = Vec::new();
        let mut join = false;
        for phase in &self.log {
            if !phase.stw {
                join = false;
                continue;
            }
            if join {
                let prev = stw.last_mut().expect("joining without a previous stop");
                let dur1 = prev.duration as f64;
                let dur2 = phase.duration as f64;
                let f = if dur1 + dur2 > 0.0 {
                    dur1 / (dur1 + dur2)
                } else {
                    0.5
                };
                prev.gc_procs = prev.gc_procs * f + phase.gc_procs * (1.0 - f);
                prev.duration += phase.duration;
                if prev.kind != phase.kind {
                    prev.kind = PhaseKind::Multiple;
                }
                continue;
            }
            stw.push(*phase);
            join = true;
        }
        stw
    }

    /// Maximum pause time in nanoseconds.
    pub fn max_pause(&self) -> i64 {
        self.stops()
            .iter()
            .map(|phase| phase.duration)
            .max()
            .unwrap_or(0)
    }
}
