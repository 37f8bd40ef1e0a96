//! Configuration types for the membership pipeline.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Column names used when reading an astrometric catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Unique source identifier column (falls back to `id` if absent)
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Proper motion in right ascension (mas/yr)
    #[serde(default = "default_pmra_column")]
    pub pmra_column: String,

    /// Proper motion in declination (mas/yr)
    #[serde(default = "default_pmdec_column")]
    pub pmdec_column: String,

    /// Right ascension (deg)
    #[serde(default = "default_ra_column")]
    pub ra_column: String,

    /// Declination (deg)
    #[serde(default = "default_dec_column")]
    pub dec_column: String,

    /// BP - RP color (mag)
    #[serde(default = "default_color_column")]
    pub color_column: String,

    /// G band mean magnitude
    #[serde(default = "default_magnitude_column")]
    pub magnitude_column: String,
}

fn default_id_column() -> String {
    "source_id".to_string()
}

fn default_pmra_column() -> String {
    "pmra".to_string()
}

fn default_pmdec_column() -> String {
    "pmdec".to_string()
}

fn default_ra_column() -> String {
    "ra".to_string()
}

fn default_dec_column() -> String {
    "dec".to_string()
}

fn default_color_column() -> String {
    "bp_rp".to_string()
}

fn default_magnitude_column() -> String {
    "phot_g_mean_mag".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            id_column: default_id_column(),
            pmra_column: default_pmra_column(),
            pmdec_column: default_pmdec_column(),
            ra_column: default_ra_column(),
            dec_column: default_dec_column(),
            color_column: default_color_column(),
            magnitude_column: default_magnitude_column(),
        }
    }
}

/// Configuration for MST growth and membership extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipConfig {
    /// Source id to grow the tree from. When unset (or absent from the
    /// sample) the point nearest the mean proper motion is used.
    #[serde(default)]
    pub seed_id: Option<u64>,
}

/// Sliding-window regression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InclinationConfig {
    /// Multiplier in the `round(factor * sqrt(n))` half-width heuristic
    #[serde(default = "default_window_factor")]
    pub window_factor: f64,

    /// Fixed half-width, overriding the heuristic when set
    #[serde(default)]
    pub window_half_width: Option<usize>,
}

fn default_window_factor() -> f64 {
    3.0
}

impl InclinationConfig {
    /// Window half-width (`nmin`) for a series of `n` points.
    ///
    /// Larger windows smooth out noise in the edge-length curve at the cost of
    /// boundary resolution.
    pub fn half_width(&self, n: usize) -> usize {
        match self.window_half_width {
            Some(fixed) => fixed,
            None => (self.window_factor * (n as f64).sqrt()).round() as usize,
        }
    }
}

impl Default for InclinationConfig {
    fn default() -> Self {
        Self {
            window_factor: default_window_factor(),
            window_half_width: None,
        }
    }
}

/// Constants of the dimensionless transition parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Theoretical maximum inclination in degrees
    #[serde(default = "default_alpha_max")]
    pub alpha_max_deg: f64,

    /// Floor for the cluster angle, as a fraction of `alpha_max_deg`
    #[serde(default = "default_delta_fraction")]
    pub delta_fraction: f64,
}

fn default_alpha_max() -> f64 {
    90.0
}

fn default_delta_fraction() -> f64 {
    0.01
}

impl TransitionConfig {
    /// Absolute floor `DELTA` in degrees.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.delta_fraction * self.alpha_max_deg
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            alpha_max_deg: default_alpha_max(),
            delta_fraction: default_delta_fraction(),
        }
    }
}

/// Configuration for the covering-radius sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Largest candidate radius (in scaled units, arcmin by default)
    #[serde(default = "default_max_radius")]
    pub max_radius: f64,

    /// Radius increment between samples
    #[serde(default = "default_step")]
    pub step: f64,

    /// Factor applied to (ra, dec) degree distances; 60 gives arcminutes
    #[serde(default = "default_distance_scale")]
    pub distance_scale: f64,

    /// Number of standard deviations a peak must clear to count as significant
    #[serde(default = "default_sigma_threshold")]
    pub sigma_threshold: f64,

    /// Explicit sweep center as [ra, dec] in degrees
    #[serde(default)]
    pub center: Option<[f64; 2]>,

    /// Source id whose sky position is used as the center
    #[serde(default)]
    pub center_id: Option<u64>,
}

fn default_max_radius() -> f64 {
    40.0
}

fn default_step() -> f64 {
    0.2
}

fn default_distance_scale() -> f64 {
    60.0
}

fn default_sigma_threshold() -> f64 {
    3.0
}

/// Upper bound on the number of radius steps in one sweep.
pub const MAX_SWEEP_STEPS: usize = 10_000;

impl SweepConfig {
    /// Candidate radii `0, step, 2*step, ...` up to and including `max_radius`.
    ///
    /// A step so small that the sweep would exceed [`MAX_SWEEP_STEPS`] is
    /// widened to `max_radius / MAX_SWEEP_STEPS`.
    pub fn radii(&self) -> Vec<f64> {
        let valid_step = self.step.is_finite() && self.step > 0.0;
        let valid_radius = self.max_radius.is_finite() && self.max_radius >= 0.0;
        if !valid_step || !valid_radius {
            return vec![0.0];
        }
        // Small tolerance so that e.g. 40.0 / 0.2 still lands on 40.0
        let count = (self.max_radius / self.step + 1e-9).floor();
        if count > MAX_SWEEP_STEPS as f64 {
            let step = self.max_radius / MAX_SWEEP_STEPS as f64;
            log::warn!(
                "sweep step {} gives {:.0} radii, widening to {} ({} steps)",
                self.step,
                count,
                step,
                MAX_SWEEP_STEPS
            );
            return (0..=MAX_SWEEP_STEPS).map(|i| i as f64 * step).collect();
        }
        (0..=count as usize).map(|i| i as f64 * self.step).collect()
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_radius: default_max_radius(),
            step: default_step(),
            distance_scale: default_distance_scale(),
            sigma_threshold: default_sigma_threshold(),
            center: None,
            center_id: None,
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub membership: MembershipConfig,

    #[serde(default)]
    pub inclination: InclinationConfig,

    #[serde(default)]
    pub transition: TransitionConfig,

    #[serde(default)]
    pub sweep: SweepConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("serializing config")?;
        std::fs::write(path, content)
            .with_context(|| format!("writing config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pipeline_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.catalog.id_column, "source_id");
        assert_eq!(config.transition.alpha_max_deg, 90.0);
        assert!((config.transition.delta() - 0.9).abs() < 1e-12);
        assert_eq!(config.sweep.distance_scale, 60.0);
        assert!(config.membership.seed_id.is_none());
    }

    #[test]
    fn test_half_width_heuristic() {
        let config = InclinationConfig::default();
        // round(3 * sqrt(100)) = 30
        assert_eq!(config.half_width(100), 30);
        // round(3 * sqrt(4)) = 6
        assert_eq!(config.half_width(4), 6);

        let fixed = InclinationConfig {
            window_half_width: Some(2),
            ..Default::default()
        };
        assert_eq!(fixed.half_width(100), 2);
    }

    #[test]
    fn test_sweep_radii() {
        let config = SweepConfig::default();
        let radii = config.radii();
        assert_eq!(radii.len(), 201);
        assert_eq!(radii[0], 0.0);
        assert!((radii[200] - 40.0).abs() < 1e-9);

        let coarse = SweepConfig {
            max_radius: 2.0,
            step: 0.5,
            ..Default::default()
        };
        assert_eq!(coarse.radii(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
    }

    #[test]
    fn test_sweep_radii_tiny_step_is_capped() {
        let config = SweepConfig {
            max_radius: 40.0,
            step: 1e-12,
            ..Default::default()
        };
        let radii = config.radii();
        assert_eq!(radii.len(), MAX_SWEEP_STEPS + 1);
        assert_eq!(radii[0], 0.0);
        assert!((radii[MAX_SWEEP_STEPS] - 40.0).abs() < 1e-9);
        assert!(radii.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_sweep_radii_invalid_inputs() {
        for (max_radius, step) in [
            (40.0, 0.0),
            (40.0, -1.0),
            (40.0, f64::NAN),
            (f64::INFINITY, 0.2),
            (-1.0, 0.2),
        ] {
            let config = SweepConfig {
                max_radius,
                step,
                ..Default::default()
            };
            assert_eq!(config.radii(), vec![0.0], "max {} step {}", max_radius, step);
        }
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "sweep:\n  max_radius: 12.0\ninclination:\n  window_half_width: 4\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sweep.max_radius, 12.0);
        assert_eq!(config.sweep.step, 0.2);
        assert_eq!(config.inclination.window_half_width, Some(4));
        assert_eq!(config.catalog.pmra_column, "pmra");
    }

    #[test]
    fn test_yaml_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = PipelineConfig::default();
        config.membership.seed_id = Some(42);
        config.to_yaml(&path).unwrap();

        let loaded = PipelineConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.membership.seed_id, Some(42));
    }
}
