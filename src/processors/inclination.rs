//! Sliding-window inclination angles of the absorption curve.
//!
//! For each center index `i` with a full window on both sides, two
//! least-squares lines are fitted to the normalized curve: one over the
//! `nmin + 1` points ending at `i` (the cluster side) and one over the
//! `nmin + 1` points starting at `i` (the field side). Their slopes are
//! reported as angles in degrees.

use rayon::prelude::*;

use crate::core::transforms::NormalizedSeries;

/// Cluster-side and field-side angles per valid center index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleSeries {
    /// Center indices into the absorption trace
    pub indices: Vec<usize>,
    /// Trailing-window angle (deg)
    pub cluster_deg: Vec<f64>,
    /// Leading-window angle (deg)
    pub field_deg: Vec<f64>,
}

impl AngleSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Ordinary least-squares slope of `y` on `x`.
///
/// Returns 0 when `x` has no spread.
pub fn ols_slope(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len() as f64;
    if x.len() < 2 {
        return 0.0;
    }

    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        sxy += dx * (yi - mean_y);
        sxx += dx * dx;
    }

    if sxx > 0.0 {
        sxy / sxx
    } else {
        0.0
    }
}

/// Slope expressed as an inclination angle in degrees.
#[inline]
pub fn slope_angle_deg(slope: f64) -> f64 {
    slope.atan().to_degrees()
}

/// Compute cluster and field angles with window half-width `nmin`.
///
/// Valid centers are `nmin..n - nmin`. When `2 * nmin >= n`, or `nmin == 0`
/// (a single-point window has no slope), the result is empty.
pub fn inclination_angles(series: &NormalizedSeries, nmin: usize) -> AngleSeries {
    let n = series.len();
    if nmin == 0 || 2 * nmin >= n {
        log::debug!(
            "window half-width {} does not fit {} points, no angles",
            nmin,
            n
        );
        return AngleSeries::default();
    }

    let (x, y) = (&series.x, &series.y);

    let angles: Vec<(usize, f64, f64)> = (nmin..n - nmin)
        .into_par_iter()
        .map(|i| {
            let trailing = ols_slope(&x[i - nmin..=i], &y[i - nmin..=i]);
            let leading = ols_slope(&x[i..=i + nmin], &y[i..=i + nmin]);
            (i, slope_angle_deg(trailing), slope_angle_deg(leading))
        })
        .collect();

    let mut result = AngleSeries {
        indices: Vec::with_capacity(angles.len()),
        cluster_deg: Vec::with_capacity(angles.len()),
        field_deg: Vec::with_capacity(angles.len()),
    };
    for (i, cluster, field) in angles {
        result.indices.push(i);
        result.cluster_deg.push(cluster);
        result.field_deg.push(field);
    }
    result
}
