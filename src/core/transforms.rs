//! Series normalization and point-set operations.
//!
//! Helpers shared by the MST pipeline and the radius sweep: normalizing the
//! absorption curve, picking a seed near the proper-motion mean, and measuring
//! sky distances from a sweep center.

use rayon::prelude::*;

use super::loaders::{Point, PointSet};

/// Absorption curve scaled onto the unit square.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    /// `i / (n - 1)` for each absorption step
    pub x: Vec<f64>,
    /// Cumulative average edge length divided by its maximum
    pub y: Vec<f64>,
}

impl NormalizedSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Normalize a sequence of cumulative average lengths.
///
/// A single-element series maps to `x = [0]`, and an all-zero series keeps
/// `y` at zero instead of dividing by zero.
pub fn normalize_series(averages: &[f64]) -> NormalizedSeries {
    let n = averages.len();
    if n == 0 {
        return NormalizedSeries::default();
    }

    let last = (n - 1) as f64;
    let x = (0..n)
        .map(|i| if n > 1 { i as f64 / last } else { 0.0 })
        .collect();

    let max_len = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let y = if max_len > 0.0 {
        averages.iter().map(|&v| v / max_len).collect()
    } else {
        vec![0.0; n]
    };

    NormalizedSeries { x, y }
}

/// Mean proper motion `[pmra, pmdec]` of the set.
pub fn mean_proper_motion(points: &PointSet) -> Option<[f64; 2]> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_ra, sum_dec) = points
        .iter()
        .fold((0.0, 0.0), |(a, b), p| (a + p.pmra, b + p.pmdec));
    Some([sum_ra / n, sum_dec / n])
}

/// Row index of the point nearest the mean proper motion.
///
/// Ties go to the lowest row index so repeated runs pick the same seed.
pub fn nearest_to_mean(points: &PointSet) -> Option<usize> {
    let [mx, my] = mean_proper_motion(points)?;

    let mut best_idx = 0usize;
    let mut best_dist = f64::INFINITY;
    for (i, p) in points.iter().enumerate() {
        let dx = p.pmra - mx;
        let dy = p.pmdec - my;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq < best_dist {
            best_dist = dist_sq;
            best_idx = i;
        }
    }
    Some(best_idx)
}

/// Mean sky position `[ra, dec]` over points that have one.
pub fn mean_sky_position(points: &PointSet) -> Option<[f64; 2]> {
    let (count, sum_ra, sum_dec) = points
        .iter()
        .filter_map(Point::sky)
        .fold((0usize, 0.0, 0.0), |(c, a, b), [ra, dec]| (c + 1, a + ra, b + dec));
    if count == 0 {
        return None;
    }
    Some([sum_ra / count as f64, sum_dec / count as f64])
}

/// Planar distance of each point from `center` in (ra, dec), times `scale`.
///
/// Points without a sky position get `f64::INFINITY` so they never fall
/// inside a finite radius.
pub fn sky_distances(points: &PointSet, center: [f64; 2], scale: f64) -> Vec<f64> {
    points
        .points
        .par_iter()
        .map(|p| match p.sky() {
            Some([ra, dec]) => {
                let dx = ra - center[0];
                let dy = dec - center[1];
                (dx * dx + dy * dy).sqrt() * scale
            }
            None => f64::INFINITY,
        })
        .collect()
}

/// Row indices whose distance is strictly below `radius`, in row order.
pub fn indices_within(distances: &[f64], radius: f64) -> Vec<usize> {
    distances
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d < radius)
        .map(|(i, _)| i)
        .collect()
}

/// Population mean and standard deviation.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
