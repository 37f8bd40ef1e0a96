//! One full MST pipeline run over a point set.
//!
//! graph -> Prim growth -> normalized curve -> inclination angles ->
//! transition series -> peak. Every intermediate is returned so callers can
//! export it; nothing is cached between runs.

use crate::config::{InclinationConfig, TransitionConfig};
use crate::core::loaders::PointSet;
use crate::core::transforms::{nearest_to_mean, normalize_series, NormalizedSeries};

use super::graph::build_pm_graph;
use super::inclination::{inclination_angles, AngleSeries};
use super::mst::{grow_mst, MstError, MstGrowth};
use super::transition::{detect_transition, transition_series, Transition, TransitionSeries};

/// Outputs of a single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct MstAnalysis {
    /// Seed the tree was grown from
    pub seed: u64,
    pub growth: MstGrowth,
    pub normalized: NormalizedSeries,
    /// Window half-width used for the regressions
    pub window_half_width: usize,
    pub angles: AngleSeries,
    pub transitions: TransitionSeries,
    pub peak: Transition,
}

impl MstAnalysis {
    /// Number of leading absorbed vertices up to and including the peak.
    pub fn member_count(&self) -> Option<usize> {
        self.peak.index.map(|i| i + 1)
    }
}

/// Resolve the seed for a sample.
///
/// A preferred id is used when it is part of `points`; otherwise the point
/// nearest the mean proper motion. Returns `None` only for an empty set.
pub fn choose_seed(points: &PointSet, preferred: Option<u64>) -> Option<u64> {
    if let Some(id) = preferred {
        if points.position_of(id).is_some() {
            return Some(id);
        }
        log::debug!("seed {} not in sample, falling back to mean proper motion", id);
    }
    nearest_to_mean(points).map(|i| points.points[i].id)
}

/// Run the full pipeline from `seed`.
///
/// # Errors
///
/// Returns [`MstError::UnknownSeed`] if `seed` is not in `points`.
pub fn analyze_from_seed(
    points: &PointSet,
    seed: u64,
    inclination: &InclinationConfig,
    transition: &TransitionConfig,
) -> Result<MstAnalysis, MstError> {
    let graph = build_pm_graph(points);
    let growth = grow_mst(&graph, seed, None)?;
    drop(graph);

    let normalized = normalize_series(&growth.averages());
    let nmin = inclination.half_width(normalized.len());
    let angles = inclination_angles(&normalized, nmin);
    let transitions = transition_series(&angles, transition);
    let peak = detect_transition(&transitions);

    log::debug!(
        "analysis: {} points, seed {}, nmin {}, {} windows, peak {:?}",
        points.len(),
        seed,
        nmin,
        angles.len(),
        peak
    );

    Ok(MstAnalysis {
        seed,
        growth,
        normalized,
        window_half_width: nmin,
        angles,
        transitions,
        peak,
    })
}

/// Run the full pipeline with an automatically chosen seed.
///
/// Returns `None` for an empty point set.
pub fn analyze(
    points: &PointSet,
    preferred_seed: Option<u64>,
    inclination: &InclinationConfig,
    transition: &TransitionConfig,
) -> Option<MstAnalysis> {
    let seed = choose_seed(points, preferred_seed)?;
    // The seed was taken from `points`, so growth cannot fail
    analyze_from_seed(points, seed, inclination, transition).ok()
}
