//! Mutator utilization distributions (MUDs).
//!
//! A MUD generalizes minimum mutator utilization: where the MMU is the
//! worst utilization over all windows of a given size, the MUD is the full
//! distribution of utilization across those windows, sampled by window
//! start position. The MMU is its 0th percentile, but as a minimum it is
//! not robust to outliers; higher percentiles are. The 1st-percentile MUD
//! for a 50ms window reads "99% of the time, the program achieved at
//! least this utilization over 50ms".
//!
//! Utilization is a continuous, piecewise-linear function of the window's
//! start position: segment boundaries occur only when a window edge
//! crosses a phase boundary. Each linear segment contributes one scaled
//! uniform distribution, so the whole MUD is an algebraic sum of uniforms
//! collapsed to a step function by the `edge` module. No sampling is
//! involved; CDF and inverse-CDF queries are exact.

use crate::edge::{edges_of_uniform_sum, Edge, Uniform};
use crate::mu::mu_in_window;
use crate::phase::GcStats;

/// Mutator utilization distribution for windows of a fixed size.
///
/// The domain (the x axis) is mutator utilization, from 0 to 1. The value
/// of the distribution at `u` is the fraction of windows of size
/// `window_ns` over the entire execution that have mutator utilization
/// `u`.
#[derive(Debug, Clone)]
pub struct Mud {
    window_ns: i64,
    /// Density as a step function plus point masses, sorted by x.
    edges: Vec<Edge>,
    /// csums[i] is the cumulative mass strictly before edges[i].x, not
    /// including the Dirac at edges[i].
    csums: Vec<f64>,
}

impl GcStats {
    /// The mutator utilization distribution for windows of `window_ns`
    /// nanoseconds.
    ///
    /// Panics if the trace does not carry program execution times.
    pub fn mutator_utilization_distribution(&self, window_ns: i64) -> Mud {
        self.require_prog_times();
        let log = self.phases();
        if log.is_empty() {
            return Mud {
                window_ns,
                edges: vec![Edge {
                    x: 0.0,
                    y: 0.0,
                    dirac: 1.0,
                }],
                csums: vec![0.0],
            };
        }

        let first = log[0].begin;
        let last = log[log.len() - 1].end();

        // Cap the window at the span of the log.
        let window_ns = window_ns.clamp(0, last - first);

        let mut addends: Vec<Uniform> = Vec::new();

        // Slide [begin, end) from begin == first to begin == last_begin.
        let mut begin = first;
        let last_begin = last - window_ns;
        let (mut begin_phase, mut end_phase) = (0usize, 0usize);
        while begin < last_begin {
            let end = begin + window_ns;

            // Phases containing begin and end.
            while log[begin_phase].end() <= begin {
                begin_phase += 1;
            }
            while log[end_phase].end() <= end {
                end_phase += 1;
            }

            // Both window edges stay inside their phases for this long,
            // so the utilization varies linearly until then and the
            // segment contributes one uniform addend.
            let duration =
                (log[begin_phase].end() - begin).min(log[end_phase].end() - end);

            let mut lutil = mu_in_window(begin, end, &log[begin_phase..]);

            // The segment's support is actually half open at this end,
            // but the infinitesimal does not matter for CDFs.
            let mut rutil = mu_in_window(begin + duration, end + duration, &log[begin_phase..]);

            // A zero-width window breaks the continuity assumption; the
            // utilization is simply constant for the duration.
            if window_ns == 0 {
                rutil = lutil;
            }

            if lutil > rutil {
                std::mem::swap(&mut lutil, &mut rutil);
            }

            // The addend's mass is the fraction of the overall sliding
            // interval this segment covers.
            let area = duration as f64 / (last_begin - first) as f64;
            addends.push(Uniform {
                l: lutil,
                r: rutil,
                area,
            });

            begin += duration;
        }

        // With nowhere to slide, the whole log is the only window.
        if first == last_begin {
            let util = mu_in_window(first, last, log);
            addends.push(Uniform {
                l: util,
                r: util,
                area: 1.0,
            });
        }

        let edges = edges_of_uniform_sum(&addends);

        let mut csums = vec![0.0; edges.len()];
        for i in 0..edges.len() - 1 {
            let w = edges[i + 1].x - edges[i].x;
            csums[i + 1] = csums[i] + edges[i].y * w + edges[i].dirac;
        }

        Mud {
            window_ns,
            edges,
            csums,
        }
    }
}

impl Mud {
    /// The window size this distribution was computed for, in
    /// nanoseconds.
    pub fn window_ns(&self) -> i64 {
        self.window_ns
    }

    /// The fraction of windows whose mutator utilization is `<= util`.
    ///
    /// This is the cumulative distribution function of the MUD.
    /// Out-of-domain queries saturate: values below the first edge return
    /// 0, values above the last return the total mass.
    pub fn cdf(&self, util: f64) -> f64 {
        // Last edge with x <= util.
        let righti = self.edges.partition_point(|e| e.x <= util);
        if righti == 0 {
            return 0.0;
        }
        let left = self.edges[righti - 1];
        self.csums[righti - 1] + left.dirac + left.y * (util - left.x)
    }

    /// The `pctile`'th percentile mutator utilization: the utilization
    /// for which a `pctile` fraction of windows have utilization at or
    /// below it.
    ///
    /// `inv_cdf(0.0)` is the minimum mutator utilization, `inv_cdf(1.0)`
    /// the maximum, `inv_cdf(0.5)` the median. Out-of-domain percentiles
    /// saturate to the first and last edges. A percentile landing inside
    /// a CDF discontinuity resolves to the Dirac's position.
    pub fn inv_cdf(&self, pctile: f64) -> f64 {
        if pctile <= 0.0 {
            return self.edges[0].x;
        }
        if pctile >= 1.0 {
            return self.edges[self.edges.len() - 1].x;
        }

        // Last cumulative sum <= pctile.
        let righti = self.csums.partition_point(|&c| c <= pctile);
        if righti == 0 {
            return 0.0;
        }
        let lefti = righti - 1;
        let left = self.edges[lefti];

        if pctile < self.csums[lefti] + left.dirac {
            // pctile falls in the CDF discontinuity at this edge.
            return left.x;
        }
        (pctile - self.csums[lefti] - left.dirac) / left.y + left.x
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{Phase, PhaseKind};

    //           ━━━━━━━━━━━━━━━━━━━━           1
    //           ▏                  ▕           0.75
    //           ▏                  ▕           0.5   util
    //           ▏                  ▕           0.25
    // ━━━━━━━━━━--------------------━━━━━━━━━━ 0
    // 0        25        50        75       100 time
    fn quarters() -> GcStats {
        let phase = |begin: i64, duration: i64, gc_procs: f64| Phase {
            begin,
            duration,
            kind: PhaseKind::SweepTerm,
            n: 1,
            gomaxprocs: 4,
            gc_procs,
            stw: false,
        };
        GcStats::from_phases(
            vec![phase(0, 25, 4.0), phase(25, 50, 0.0), phase(75, 25, 4.0)],
            1,
            true,
        )
    }

    fn check_cdf(mud: &Mud, x: f64, cdf: f64) {
        assert_eq!(mud.cdf(x), cdf, "wrong CDF({x})");
    }

    fn check_inv_cdf(mud: &Mud, cdf: f64, x: f64) {
        assert_eq!(mud.inv_cdf(cdf), x, "wrong InvCDF({cdf})");
    }

    fn check_both(mud: &Mud, x: f64, cdf: f64) {
        check_cdf(mud, x, cdf);
        check_inv_cdf(mud, cdf, x);
    }

    #[test]
    fn test_quarters_mud_0() {
        // ↑∫=0.5             ↑∫=0.5
        // │                  │      PDF
        // ╵------------------╵ 0.0
        // 0       util       1
        let mud = quarters().mutator_utilization_distribution(0);
        check_cdf(&mud, 0.0, 0.5);
        check_inv_cdf(&mud, 0.0, 0.0);
        check_inv_cdf(&mud, 0.25, 0.0);
        check_inv_cdf(&mud, 0.5, 1.0);
        check_inv_cdf(&mud, 0.75, 1.0);
        check_inv_cdf(&mud, 1.0, 1.0);
        check_cdf(&mud, 0.5, 0.5);
        check_both(&mud, 1.0, 1.0);
    }

    #[test]
    fn test_quarters_mud_25() {
        //                    ↑∫=1/3
        //                    │
        // ┍━━━━━━━━━━━━━━━━━━┥ 2/3  PDF
        // │                  │ 1/3
        // ╵------------------╵ 0/3
        // 0       util       1
        let mud = quarters().mutator_utilization_distribution(25);
        check_both(&mud, 0.0, 0.0);
        check_both(&mud, 0.25, 1.0 / 6.0);
        check_both(&mud, 0.5, 1.0 / 3.0);
        check_both(&mud, 0.75, 3.0 / 6.0);
        check_both(&mud, 1.0, 1.0);
    }

    #[test]
    fn test_quarters_mud_50() {
        //           ┍━━━━━━━━┑ 2.0
        //           │        │ 1.5
        //           │        │ 1.0  PDF
        //           │        │ 0.5
        // ━━━━━━━━━━┙--------╵ 0.0
        // 0       util       1
        let mud = quarters().mutator_utilization_distribution(50);
        check_both(&mud, 0.5, 0.0);
        check_both(&mud, 0.75, 0.5);
        check_both(&mud, 1.0, 1.0);
    }

    #[test]
    fn test_quarters_mud_100() {
        //           ↑∫=1
        //           │               PDF
        // ----------╵--------- 0.0
        // 0       util       1
        let mud = quarters().mutator_utilization_distribution(100);
        check_cdf(&mud, 0.499, 0.0);
        check_both(&mud, 0.5, 1.0);
        check_cdf(&mud, 0.501, 1.0);
        for p in [0.0, 0.25, 0.5, 0.75, 1.0] {
            assert_eq!(mud.inv_cdf(p), 0.5, "wrong InvCDF({p})");
        }
    }

    #[test]
    fn test_window_capped_at_log_span() {
        let mud = quarters().mutator_utilization_distribution(1_000_000);
        assert_eq!(mud.window_ns(), 100);
        check_both(&mud, 0.5, 1.0);
    }

    #[test]
    fn test_mmu_is_zeroth_percentile() {
        let stats = quarters();
        for w in [1, 10, 25, 40, 50, 75, 100] {
            let mud = stats.mutator_utilization_distribution(w);
            assert_eq!(stats.mmu(w), mud.inv_cdf(0.0), "window {w}");
        }
    }

    #[test]
    fn test_total_mass_is_one() {
        let stats = quarters();
        for w in [0, 10, 25, 50, 99, 100] {
            let mud = stats.mutator_utilization_distribution(w);
            let total = mud.cdf(1.0);
            assert!((total - 1.0).abs() < 1e-12, "window {w}: mass {total}");
        }
    }

    #[test]
    fn test_empty_log_is_a_point_mass() {
        let stats = GcStats::from_phases(Vec::new(), 0, true);
        let mud = stats.mutator_utilization_distribution(1000);
        assert_eq!(mud.cdf(0.0), 1.0);
        assert_eq!(mud.inv_cdf(0.5), 0.0);
    }

    #[test]
    #[should_panic(expected = "program execution times")]
    fn test_mud_requires_prog_times() {
        let stats = GcStats::from_phases(Vec::new(), 0, false);
        stats.mutator_utilization_distribution(1000);
    }
}
