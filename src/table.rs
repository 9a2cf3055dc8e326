//! Table-of-columns output for external plot drivers.
//!
//! Every curve analysis emits a tab-separated table: one header row of
//! labels, then one row per sample point. A separate plot driver (not
//! part of this crate) consumes these tables; nothing here renders.

use std::io::{self, Write};

use crate::mud::Mud;

/// A table of aligned columns: the x axis plus any number of series.
#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    pub fn new(xlabel: &str, xs: Vec<f64>) -> Self {
        Self {
            headers: vec![xlabel.to_string()],
            columns: vec![xs],
        }
    }

    pub fn xs(&self) -> &[f64] {
        &self.columns[0]
    }

    /// Add a series by evaluating `f` at every x.
    pub fn add_series(&mut self, label: &str, f: impl FnMut(f64) -> f64) {
        let ys = self.columns[0].iter().copied().map(f).collect();
        self.add_series_values(label, ys);
    }

    /// Add a precomputed series. Panics if the length does not match the
    /// x axis.
    pub fn add_series_values(&mut self, label: &str, ys: Vec<f64>) {
        assert_eq!(ys.len(), self.columns[0].len(), "series length mismatch");
        self.headers.push(label.to_string());
        self.columns.push(ys);
    }

    pub fn series(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.headers
            .iter()
            .zip(&self.columns)
            .skip(1)
            .map(|(label, ys)| (label.as_str(), ys.as_slice()))
    }

    /// Write the tab-separated table.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        writeln!(w, "{}", self.headers.join("\t"))?;
        for row in 0..self.columns[0].len() {
            for (i, col) in self.columns.iter().enumerate() {
                if i != 0 {
                    write!(w, "\t")?;
                }
                write!(w, "{}", col[row])?;
            }
            writeln!(w)?;
        }
        Ok(())
    }
}

/// Write a MUD heat map in gnuplot "nonuniform matrix" format: window
/// sizes across, utilization down, CDF values in the cells.
pub fn write_mud_map<W: Write>(
    w: &mut W,
    windows_ns: &[i64],
    muds: &[Mud],
    utils: &[f64],
) -> io::Result<()> {
    assert_eq!(windows_ns.len(), muds.len());

    write!(w, "{} ", windows_ns.len() + 1)?;
    for window_ns in windows_ns {
        write!(w, "{window_ns} ")?;
    }
    writeln!(w)?;

    for &util in utils {
        write!(w, "{util} ")?;
        for mud in muds {
            write!(w, "{} ", mud.cdf(util))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => (0..n)
            .map(|i| lo + (hi - lo) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

/// `n` logarithmically spaced values from `base^lo` to `base^hi`
/// inclusive.
pub fn logspace(lo: f64, hi: f64, n: usize, base: f64) -> Vec<f64> {
    linspace(lo, hi, n).into_iter().map(|x| base.powf(x)).collect()
}
