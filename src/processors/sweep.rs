//! Covering-radius sweep.
//!
//! For each candidate radius around a sky center, the points inside the
//! radius are run through the full MST pipeline and the peak transition value
//! is recorded. The covering radius is the smallest radius reaching the
//! global peak.
//!
//! Samples are independent: each owns its graph and trace, so radii are
//! evaluated in parallel and gathered back in sweep order.

use rayon::prelude::*;

use crate::config::{InclinationConfig, SweepConfig, TransitionConfig};
use crate::core::loaders::PointSet;
use crate::core::transforms::{indices_within, mean_and_std, sky_distances};

use super::analysis::analyze;

/// Peak transition value for one radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSample {
    pub radius: f64,
    /// Points strictly inside `radius`
    pub sample_size: usize,
    /// Peak transition value, 0 when the sample is empty or too small
    pub eta_max: f64,
}

/// Aggregated sweep outcome.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub samples: Vec<SweepSample>,
    pub mean: f64,
    /// Population standard deviation of the per-radius peaks
    pub std_dev: f64,
    /// Largest per-radius peak
    pub eta_max: f64,
    /// `eta_max - sigma_threshold * std_dev`
    pub threshold: f64,
    /// Smallest radius whose peak equals `eta_max`; `None` if no sample peaked above 0
    pub covering_radius: Option<f64>,
    /// Whether the peak sits more than `sigma_threshold` deviations above the mean
    pub significant: bool,
}

/// Peak transition value of a single sample.
///
/// Pure function of its inputs: an empty sample, or one too small for the
/// regression window, scores 0.
pub fn sample_eta_max(
    points: &PointSet,
    preferred_seed: Option<u64>,
    inclination: &InclinationConfig,
    transition: &TransitionConfig,
) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    analyze(points, preferred_seed, inclination, transition)
        .map(|a| a.peak.value)
        .unwrap_or(0.0)
}

/// Filter `points` to `distances < radius` and score the resulting sample.
pub fn evaluate_radius(
    points: &PointSet,
    distances: &[f64],
    radius: f64,
    preferred_seed: Option<u64>,
    inclination: &InclinationConfig,
    transition: &TransitionConfig,
) -> SweepSample {
    let sample = points.subset(&indices_within(distances, radius));
    let eta_max = sample_eta_max(&sample, preferred_seed, inclination, transition);
    log::debug!("radius {:.3}: {} points, eta_max {:.6}", radius, sample.len(), eta_max);
    SweepSample {
        radius,
        sample_size: sample.len(),
        eta_max,
    }
}

/// Sweep candidate radii around `center` and select the covering radius.
///
/// Distances are planar (ra, dec) offsets scaled by `config.distance_scale`;
/// points without a sky position never enter a sample.
pub fn radius_sweep(
    points: &PointSet,
    center: [f64; 2],
    preferred_seed: Option<u64>,
    config: &SweepConfig,
    inclination: &InclinationConfig,
    transition: &TransitionConfig,
) -> SweepResult {
    let distances = sky_distances(points, center, config.distance_scale);
    let radii = config.radii();

    let samples: Vec<SweepSample> = radii
        .par_iter()
        .map(|&radius| {
            evaluate_radius(points, &distances, radius, preferred_seed, inclination, transition)
        })
        .collect();

    let result = summarize(samples, config.sigma_threshold);

    log::info!(
        "sweep: {} radii, eta_max {:.6}, mean {:.6}, std {:.6}, covering radius {:?}",
        result.samples.len(),
        result.eta_max,
        result.mean,
        result.std_dev,
        result.covering_radius
    );

    result
}

/// Aggregate per-radius peaks into a [`SweepResult`].
pub fn summarize(samples: Vec<SweepSample>, sigma_threshold: f64) -> SweepResult {
    if samples.is_empty() {
        return SweepResult::default();
    }

    let values: Vec<f64> = samples.iter().map(|s| s.eta_max).collect();
    let (mean, std_dev) = mean_and_std(&values);
    let eta_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let threshold = eta_max - sigma_threshold * std_dev;

    let covering_radius = if eta_max > 0.0 {
        samples
            .iter()
            .find(|s| s.eta_max == eta_max)
            .map(|s| s.radius)
    } else {
        None
    };

    let significant = covering_radius.is_some() && eta_max - mean > sigma_threshold * std_dev;

    SweepResult {
        samples,
        mean,
        std_dev,
        eta_max,
        threshold,
        covering_radius,
        significant,
    }
}
