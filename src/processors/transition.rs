//! Dimensionless transition parameter.
//!
//! Contrasts the field-side and cluster-side inclination at every valid index:
//!
//! ```text
//! eta_i = (field_i - cluster_i) / max(cluster_i, DELTA) * (DELTA / ALPHA_MAX)
//! ```
//!
//! The maximum of `eta` marks where the absorption curve switches from the
//! densely packed cluster regime to sparse field edges.

use crate::config::TransitionConfig;

use super::inclination::AngleSeries;

/// Transition parameter per valid index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionSeries {
    /// Center indices into the absorption trace
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl TransitionSeries {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Location and height of the transition peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Absorption-trace index of the peak, `None` if there was nothing to scan
    pub index: Option<usize>,
    pub value: f64,
}

impl Transition {
    /// Sentinel for an empty series.
    pub const NONE: Transition = Transition {
        index: None,
        value: 0.0,
    };

    #[inline]
    pub fn is_found(&self) -> bool {
        self.index.is_some()
    }
}

impl Default for Transition {
    fn default() -> Self {
        Self::NONE
    }
}

/// Transition value for one pair of angles.
#[inline]
pub fn transition_value(cluster_deg: f64, field_deg: f64, config: &TransitionConfig) -> f64 {
    let delta = config.delta();
    ((field_deg - cluster_deg) / cluster_deg.max(delta)) * (delta / config.alpha_max_deg)
}

/// Transition series for a full set of angles.
pub fn transition_series(angles: &AngleSeries, config: &TransitionConfig) -> TransitionSeries {
    debug_assert_eq!(angles.cluster_deg.len(), angles.field_deg.len());

    let values = angles
        .cluster_deg
        .iter()
        .zip(&angles.field_deg)
        .map(|(&c, &f)| transition_value(c, f, config))
        .collect();

    TransitionSeries {
        indices: angles.indices.clone(),
        values,
    }
}

/// First index attaining the maximum transition value.
///
/// An empty series yields [`Transition::NONE`] rather than an error so that
/// a radius sweep can treat every sample the same way.
pub fn detect_transition(series: &TransitionSeries) -> Transition {
    let mut best: Option<(usize, f64)> = None;
    for (&i, &v) in series.indices.iter().zip(&series.values) {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }

    match best {
        Some((index, value)) => Transition {
            index: Some(index),
            value,
        },
        None => Transition::NONE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angles(cluster: Vec<f64>, field: Vec<f64>) -> AngleSeries {
        AngleSeries {
            indices: (0..cluster.len()).map(|i| i + 3).collect(),
            cluster_deg: cluster,
            field_deg: field,
        }
    }

    #[test]
    fn test_transition_value() {
        let config = TransitionConfig::default();
        // Flat cluster side, vertical field side: (90 - 0) / 0.9 * 0.01 = 1
        assert!((transition_value(0.0, 90.0, &config) - 1.0).abs() < 1e-12);
        // Equal angles give zero
        assert_eq!(transition_value(30.0, 30.0, &config), 0.0);
        // Cluster angle above the floor divides by itself
        let v = transition_value(10.0, 40.0, &config);
        assert!((v - 3.0 * 0.01).abs() < 1e-12);
        // Negative cluster angles hit the floor
        let v = transition_value(-5.0, 4.0, &config);
        assert!((v - 10.0 * 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_transition_custom_constants() {
        let config = TransitionConfig {
            alpha_max_deg: 45.0,
            delta_fraction: 0.1,
        };
        // delta = 4.5; (9 - 0) / 4.5 * 0.1 = 0.2
        assert!((transition_value(0.0, 9.0, &config) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_detect_transition_first_max() {
        let config = TransitionConfig::default();
        let series = transition_series(
            &angles(vec![10.0, 0.0, 5.0, 0.0], vec![10.0, 45.0, 5.0, 45.0]),
            &config,
        );
        assert_eq!(series.indices, vec![3, 4, 5, 6]);

        let peak = detect_transition(&series);
        assert_eq!(peak.index, Some(4));
        assert!((peak.value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_detect_transition_empty() {
        let series = transition_series(&AngleSeries::default(), &TransitionConfig::default());
        assert!(series.is_empty());
        let peak = detect_transition(&series);
        assert_eq!(peak, Transition::NONE);
        assert!(!peak.is_found());
        assert_eq!(peak.value, 0.0);
    }

    #[test]
    fn test_detect_transition_all_negative() {
        let series = TransitionSeries {
            indices: vec![1, 2],
            values: vec![-0.5, -0.2],
        };
        let peak = detect_transition(&series);
        assert_eq!(peak.index, Some(2));
        assert_eq!(peak.value, -0.2);
    }
}
