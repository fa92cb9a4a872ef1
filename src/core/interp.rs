//! Linear interpolation on regular or irregular ascending grids.

use chrono::{DateTime, Utc};
use ndarray::ArrayView2;

/// Seconds from `origin` to `time`, at nanosecond resolution
pub fn seconds_since(time: &DateTime<Utc>, origin: &DateTime<Utc>) -> f64 {
    let delta = *time - *origin;
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1e3,
    }
}

/// Times as seconds since `origin`, ready for use as an interpolation axis
pub fn time_axis(times: &[DateTime<Utc>], origin: &DateTime<Utc>) -> Vec<f64> {
    times.iter().map(|t| seconds_since(t, origin)).collect()
}

/// Lower bracketing index and fractional weight of `x` within ascending `xs`.
///
/// Outside the grid the end interval is reused, so the weight falls below 0
/// or above 1 and callers get linear extrapolation for free.
pub fn bracket(xs: &[f64], x: f64) -> Option<(usize, f64)> {
    match xs.len() {
        0 => None,
        1 => Some((0, 0.0)),
        n => {
            // index of the first grid value strictly greater than x
            let upper = xs.partition_point(|&v| v <= x).clamp(1, n - 1);
            let lower = upper - 1;
            let span = xs[upper] - xs[lower];
            let weight = if span == 0.0 { 0.0 } else { (x - xs[lower]) / span };
            Some((lower, weight))
        }
    }
}

fn in_range(xs: &[f64], x: f64) -> bool {
    match (xs.first(), xs.last()) {
        (Some(&lo), Some(&hi)) => x >= lo && x <= hi,
        _ => false,
    }
}

/// Interpolate `ys` sampled at `xs` at position `x`.
///
/// Returns NaN outside the grid unless `extrapolate` is set.
pub fn interp1d(xs: &[f64], ys: &[f64], x: f64, extrapolate: bool) -> f64 {
    if xs.len() != ys.len() || (!extrapolate && !in_range(xs, x)) {
        return f64::NAN;
    }
    match bracket(xs, x) {
        Some((i, _)) if xs.len() == 1 => ys[i],
        Some((i, w)) => ys[i] * (1.0 - w) + ys[i + 1] * w,
        None => f64::NAN,
    }
}

/// Bilinear interpolation of `grid[[row, col]]` with rows at `rows` and
/// columns at `cols`.
pub fn interp2d(rows: &[f64], cols: &[f64], grid: ArrayView2<f64>, row: f64, col: f64, extrapolate: bool) -> f64 {
    if grid.dim() != (rows.len(), cols.len()) {
        return f64::NAN;
    }
    if !extrapolate && (!in_range(rows, row) || !in_range(cols, col)) {
        return f64::NAN;
    }
    let (r, wr) = match bracket(rows, row) {
        Some(b) => b,
        None => return f64::NAN,
    };
    let (c, wc) = match bracket(cols, col) {
        Some(b) => b,
        None => return f64::NAN,
    };
    let r1 = (r + 1).min(rows.len() - 1);
    let c1 = (c + 1).min(cols.len() - 1);

    let top = grid[[r, c]] * (1.0 - wc) + grid[[r, c1]] * wc;
    let bottom = grid[[r1, c]] * (1.0 - wc) + grid[[r1, c1]] * wc;
    top * (1.0 - wr) + bottom * wr
}
