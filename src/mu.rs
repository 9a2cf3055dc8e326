//! Mutator utilization primitives and the MMU engine.
//!
//! Mutator utilization over a window is the fraction of processor time in
//! that window not consumed by the collector. The minimum mutator
//! utilization (MMU) at a window size is the worst such fraction over
//! every window of that size across the execution.

use crate::phase::{GcStats, Phase};

/// Mutator utilization in the half-open window `[begin, end)`, in
/// `[0, 1]`.
///
/// `log` must begin at or before the phase containing `begin`. A
/// zero-width window is treated as `[begin, begin + 1)` (instantaneous
/// utilization). The window must overlap at least one phase.
pub(crate) fn mu_in_window(begin: i64, end: i64, log: &[Phase]) -> f64 {
    let end = if begin == end { end + 1 } else { end };

    let mut total_ns = 0.0;
    let mut gc_ns = 0.0;
    for phase in log {
        if phase.end() < begin {
            continue;
        }
        if phase.begin >= end {
            break;
        }

        // Section of this phase that overlaps the window.
        let pbegin = begin.max(phase.begin);
        let pend = end.min(phase.end());
        let pdur = pend - pbegin;

        // The collector may not use every proc during a stop-the-world
        // phase, but the mutator gets none of them.
        let gc_procs = if phase.stw {
            phase.gomaxprocs as f64
        } else {
            phase.gc_procs
        };
        gc_ns += gc_procs * pdur as f64;
        total_ns += (phase.gomaxprocs as i64 * pdur) as f64;
    }

    (total_ns - gc_ns) / total_ns
}

impl GcStats {
    pub(crate) fn require_prog_times(&self) {
        assert!(
            self.have_prog_times(),
            "mutator utilization analyses require program execution times in the GC trace"
        );
    }

    /// Mean mutator utilization between the first and last logged GC.
    ///
    /// Panics if the trace does not carry program execution times.
    pub fn mean_mutator_utilization(&self) -> f64 {
        self.require_prog_times();
        let mut gc_ns = 0.0;
        let mut total_ns: i64 = 0;
        for phase in self.phases() {
            gc_ns += phase.gc_procs * phase.duration as f64;
            total_ns += phase.gomaxprocs as i64 * phase.duration;
        }
        (total_ns as f64 - gc_ns) / total_ns as f64
    }

    /// Minimum mutator utilization over all windows of `window_ns`
    /// nanoseconds, in `[0, 1]`. Returns 0 when `window_ns <= 0`.
    ///
    /// Equivalent to the 0th percentile of the mutator utilization
    /// distribution, `self.mutator_utilization_distribution(w).inv_cdf(0)`,
    /// but much faster to compute.
    ///
    /// Panics if the trace does not carry program execution times.
    pub fn mmu(&self, window_ns: i64) -> f64 {
        self.require_prog_times();
        if window_ns <= 0 {
            return 0.0;
        }
        let log = self.phases();
        if log.is_empty() {
            return 0.0;
        }

        let mut mmu = 1.0_f64;

        // Utilization as a function of the window's start position is
        // continuous and piecewise linear, so its minimum occurs where an
        // edge of the window aligns with a phase boundary. Probing those
        // alignments covers every local extremum.
        let mut left_idx = 0;
        for (i, phase) in log.iter().enumerate() {
            // The window starting at phase.begin.
            let (begin, end) = (phase.begin, phase.begin + window_ns);
            if end <= log[log.len() - 1].end() {
                mmu = mmu.min(mu_in_window(begin, end, &log[i..]));
            }

            // The window ending at phase.end(). The slice must start at
            // the phase containing begin; begin is monotone over the
            // probes, so the cursor only ever moves forward.
            let (begin, end) = (phase.end() - window_ns, phase.end());
            if begin >= log[0].begin {
                while log[left_idx].end() < begin {
                    left_idx += 1;
                }
                mmu = mmu.min(mu_in_window(begin, end, &log[left_idx..]));
            }
        }
        mmu
    }

    /// Minimum mutator utilization for each window size in `windows_ns`.
    ///
    /// Panics if the trace does not carry program execution times.
    pub fn mmus(&self, windows_ns: &[i64]) -> Vec<f64> {
        windows_ns.iter().map(|&w| self.mmu(w)).collect()
    }
}
