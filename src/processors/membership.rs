//! Membership extraction and catalog processing entry points.
//!
//! Two results come out of a catalog:
//! - members: the stars absorbed up to the transition peak of one MST run
//! - covering radius: the sky radius whose sample shows the strongest
//!   transition, plus the stars inside it

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{PipelineConfig, SweepConfig};
use crate::core::loaders::{load_catalog_csv, LoaderError, Point, PointSet};
use crate::core::transforms::{mean_sky_position, sky_distances};
use crate::core::writers::{
    write_covering_csv, write_members_csv, write_sweep_csv, write_trace_csv,
    write_transition_csv, WriteError,
};

use super::analysis::{analyze_from_seed, choose_seed, MstAnalysis};
use super::mst::MstError;
use super::sweep::{radius_sweep, SweepResult};

/// Errors that can occur while extracting members or a covering radius.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("need at least 2 sources, found {found}")]
    TooFewPoints { found: usize },

    #[error("no sky position for {}", .0.map_or("any source".to_string(), |id| format!("source {}", id)))]
    MissingSkyPosition(Option<u64>),

    #[error("reference source {0} is not in the catalog")]
    UnknownReference(u64),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Mst(#[from] MstError),
}

/// Result type for membership operations.
pub type Result<T> = std::result::Result<T, MembershipError>;

/// Members found by a single MST run.
#[derive(Debug, Clone)]
pub struct MembershipResult {
    pub analysis: MstAnalysis,
    /// First `peak + 1` absorbed ids; empty when no transition was found
    pub members: Vec<u64>,
}

/// Covering radius found by a sweep.
#[derive(Debug, Clone)]
pub struct RadiusResult {
    /// Sweep center `[ra, dec]` (deg)
    pub center: [f64; 2],
    pub sweep: SweepResult,
    /// Row indices inside the covering radius with their scaled distance
    pub covering: Vec<(usize, f64)>,
}

fn ensure_enough(points: &PointSet) -> Result<()> {
    if points.len() < 2 {
        return Err(MembershipError::TooFewPoints {
            found: points.len(),
        });
    }
    Ok(())
}

/// Grow the tree and split off the members before the transition peak.
///
/// # Errors
///
/// Returns [`MembershipError::TooFewPoints`] for fewer than two sources, or
/// [`MembershipError::Mst`] if the tree cannot be grown from the chosen seed.
pub fn find_members(points: &PointSet, config: &PipelineConfig) -> Result<MembershipResult> {
    ensure_enough(points)?;

    let seed = choose_seed(points, config.membership.seed_id).ok_or(
        MembershipError::TooFewPoints {
            found: points.len(),
        },
    )?;
    let mut analysis = analyze_from_seed(points, seed, &config.inclination, &config.transition)?;

    let members = match analysis.member_count() {
        Some(k) => analysis.growth.apply_cutoff(k).to_vec(),
        None => {
            log::warn!(
                "no transition found for {} sources (window half-width {})",
                points.len(),
                analysis.window_half_width
            );
            Vec::new()
        }
    };

    log::info!(
        "seed {}: {} of {} sources are members (eta {:.6})",
        analysis.seed,
        members.len(),
        points.len(),
        analysis.peak.value
    );

    Ok(MembershipResult { analysis, members })
}

/// Resolve the sweep center.
///
/// Explicit coordinates win, then the position of `center_id`, then the mean
/// sky position of the catalog.
pub fn resolve_center(points: &PointSet, config: &SweepConfig) -> Result<[f64; 2]> {
    if let Some(center) = config.center {
        return Ok(center);
    }
    if let Some(id) = config.center_id {
        let point = points.get(id).ok_or(MembershipError::UnknownReference(id))?;
        return point.sky().ok_or(MembershipError::MissingSkyPosition(Some(id)));
    }
    mean_sky_position(points).ok_or(MembershipError::MissingSkyPosition(None))
}

/// Rows strictly inside `radius`, with their distance.
pub fn covering_members(distances: &[f64], radius: f64) -> Vec<(usize, f64)> {
    distances
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, d)| d < radius)
        .collect()
}

/// Sweep radii around the resolved center and collect the covering members.
///
/// # Errors
///
/// Returns an error for fewer than two sources or an unresolvable center.
pub fn find_covering_radius(points: &PointSet, config: &PipelineConfig) -> Result<RadiusResult> {
    ensure_enough(points)?;
    let center = resolve_center(points, &config.sweep)?;
    log::info!("sweep center ra={:.6} dec={:.6}", center[0], center[1]);

    let sweep = radius_sweep(
        points,
        center,
        config.membership.seed_id,
        &config.sweep,
        &config.inclination,
        &config.transition,
    );

    let covering = match sweep.covering_radius {
        Some(radius) => {
            let distances = sky_distances(points, center, config.sweep.distance_scale);
            covering_members(&distances, radius)
        }
        None => {
            log::warn!("no sample showed a transition, covering radius undefined");
            Vec::new()
        }
    };

    if sweep.covering_radius.is_some() && !sweep.significant {
        log::warn!(
            "peak {:.6} is within {} sigma of the sweep mean",
            sweep.eta_max,
            config.sweep.sigma_threshold
        );
    }

    Ok(RadiusResult {
        center,
        sweep,
        covering,
    })
}

/// Paths written by [`process_catalog_members`].
#[derive(Debug, Clone)]
pub struct MembersOutput {
    pub members_csv: PathBuf,
    pub trace_csv: PathBuf,
    pub transition_csv: PathBuf,
}

/// Paths written by [`process_catalog_radius`].
#[derive(Debug, Clone)]
pub struct RadiusOutput {
    pub sweep_csv: PathBuf,
    pub covering_csv: PathBuf,
}

fn output_location(catalog: &Path, output_dir: Option<&Path>) -> (PathBuf, String) {
    let out_dir = output_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| catalog.parent().unwrap_or(Path::new(".")).to_path_buf());
    let stem = catalog
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("catalog")
        .to_string();
    (out_dir, stem)
}

fn load(catalog: &Path, config: &PipelineConfig) -> Result<PointSet> {
    let points = load_catalog_csv(catalog, &config.catalog)?;
    let file_name = catalog
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    log::info!("{}: loaded {} sources", file_name, points.len());
    Ok(points)
}

/// Load a catalog, extract members and write members, trace and transition CSVs.
///
/// Outputs go to `output_dir`, or next to the catalog when `None`.
pub fn process_catalog_members(
    catalog: &Path,
    output_dir: Option<&Path>,
    config: &PipelineConfig,
) -> Result<(MembersOutput, MembershipResult)> {
    let points = load(catalog, config)?;
    let result = find_members(&points, config)?;
    let (out_dir, stem) = output_location(catalog, output_dir);

    let output = MembersOutput {
        members_csv: out_dir.join(format!("{}_members.csv", stem)),
        trace_csv: out_dir.join(format!("{}_trace.csv", stem)),
        transition_csv: out_dir.join(format!("{}_transition.csv", stem)),
    };

    let members: Vec<&Point> = result
        .members
        .iter()
        .filter_map(|&id| points.get(id))
        .collect();
    write_members_csv(&output.members_csv, &points.columns, &members)?;
    log::info!("Members CSV -> {}", output.members_csv.display());

    let analysis = &result.analysis;
    write_trace_csv(&output.trace_csv, &analysis.growth.trace, &analysis.normalized)?;
    log::info!("Trace CSV -> {}", output.trace_csv.display());

    write_transition_csv(&output.transition_csv, &analysis.angles, &analysis.transitions)?;
    log::info!("Transition CSV -> {}", output.transition_csv.display());

    Ok((output, result))
}

/// Load a catalog, run the radius sweep and write sweep and covering CSVs.
///
/// Outputs go to `output_dir`, or next to the catalog when `None`.
pub fn process_catalog_radius(
    catalog: &Path,
    output_dir: Option<&Path>,
    config: &PipelineConfig,
) -> Result<(RadiusOutput, RadiusResult)> {
    let points = load(catalog, config)?;
    let result = find_covering_radius(&points, config)?;
    let (out_dir, stem) = output_location(catalog, output_dir);

    let output = RadiusOutput {
        sweep_csv: out_dir.join(format!("{}_sweep.csv", stem)),
        covering_csv: out_dir.join(format!("{}_covering.csv", stem)),
    };

    write_sweep_csv(&output.sweep_csv, &result.sweep)?;
    log::info!("Sweep CSV -> {}", output.sweep_csv.display());

    let covering: Vec<(&Point, f64)> = result
        .covering
        .iter()
        .map(|&(i, d)| (&points.points[i], d))
        .collect();
    write_covering_csv(&output.covering_csv, &points.columns, &covering)?;
    log::info!("Covering CSV -> {}", output.covering_csv.display());

    Ok((output, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn scenario_a() -> PointSet {
        PointSet::from_points(vec![
            Point::new(1, 0.0, 0.0).with_position(10.0, 20.0),
            Point::new(2, 0.1, 0.1).with_position(10.1, 20.0),
            Point::new(3, 0.2, 0.2).with_position(10.0, 20.1),
            Point::new(4, 10.0, 10.0).with_position(12.0, 22.0),
        ])
    }

    fn narrow_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.inclination.window_half_width = Some(1);
        config.membership.seed_id = Some(1);
        config
    }

    #[test]
    fn test_find_members_scenario_a() {
        let result = find_members(&scenario_a(), &narrow_config()).unwrap();
        assert_eq!(result.members, vec![1, 2, 3]);
        assert_eq!(result.analysis.seed, 1);
        // The cutoff is recorded on the growth itself
        assert_eq!(result.analysis.growth.members, Some(result.members.clone()));
    }

    #[test]
    fn test_mst_error_is_reported() {
        let err = MembershipError::from(MstError::UnknownSeed(42));
        assert!(matches!(err, MembershipError::Mst(MstError::UnknownSeed(42))));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_find_members_no_transition() {
        // Default window does not fit four points
        let result = find_members(&scenario_a(), &PipelineConfig::default()).unwrap();
        assert!(result.members.is_empty());
        assert!(!result.analysis.peak.is_found());
    }

    #[test]
    fn test_find_members_too_few() {
        let single = PointSet::from_points(vec![Point::new(1, 0.0, 0.0)]);
        let err = find_members(&single, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, MembershipError::TooFewPoints { found: 1 }));
    }

    #[test]
    fn test_find_members_no_transition_leaves_cutoff_unset() {
        let result = find_members(&scenario_a(), &PipelineConfig::default()).unwrap();
        assert_eq!(result.analysis.growth.members, None);
    }

    #[test]
    fn test_resolve_center() {
        let points = scenario_a();
        let mut config = SweepConfig::default();

        let mean = resolve_center(&points, &config).unwrap();
        assert!((mean[0] - 10.525).abs() < 1e-9);
        assert!((mean[1] - 20.525).abs() < 1e-9);

        config.center_id = Some(2);
        assert_eq!(resolve_center(&points, &config).unwrap(), [10.1, 20.0]);

        config.center = Some([1.0, 2.0]);
        assert_eq!(resolve_center(&points, &config).unwrap(), [1.0, 2.0]);

        config.center = None;
        config.center_id = Some(99);
        assert!(matches!(
            resolve_center(&points, &config),
            Err(MembershipError::UnknownReference(99))
        ));
    }

    #[test]
    fn test_resolve_center_without_positions() {
        let points = PointSet::from_points(vec![Point::new(1, 0.0, 0.0), Point::new(2, 1.0, 1.0)]);
        let mut config = SweepConfig::default();
        assert!(matches!(
            resolve_center(&points, &config),
            Err(MembershipError::MissingSkyPosition(None))
        ));

        config.center_id = Some(2);
        assert!(matches!(
            resolve_center(&points, &config),
            Err(MembershipError::MissingSkyPosition(Some(2)))
        ));
    }

    #[test]
    fn test_covering_members_strict() {
        let distances = [0.5, 1.0, 0.99, f64::INFINITY, 2.0];
        let inside = covering_members(&distances, 1.0);
        assert_eq!(inside, vec![(0, 0.5), (2, 0.99)]);
    }

    #[test]
    fn test_find_covering_radius_without_boundary() {
        // Four sources never fit the default window: every sample scores 0
        let result = find_covering_radius(&scenario_a(), &PipelineConfig::default()).unwrap();
        assert_eq!(result.sweep.covering_radius, None);
        assert!(result.covering.is_empty());
        assert!(result.sweep.samples.iter().all(|s| s.eta_max == 0.0));
    }

    #[test]
    fn test_process_catalog_members_writes_outputs() {
        let dir = tempdir().unwrap();
        let catalog = dir.path().join("field.csv");
        fs::write(
            &catalog,
            "source_id,pmra,pmdec,ra,dec,bp_rp,phot_g_mean_mag\n\
             1,0.0,0.0,10.0,20.0,0.9,14.0\n\
             2,0.1,0.1,10.1,20.0,,15.5\n\
             3,0.2,0.2,10.0,20.1,1.1,\n\
             4,10.0,10.0,12.0,22.0,0.4,17.0\n",
        )
        .unwrap();
        let out_dir = dir.path().join("out");

        let (output, result) =
            process_catalog_members(&catalog, Some(&out_dir), &narrow_config()).unwrap();
        assert_eq!(result.members, vec![1, 2, 3]);
        assert_eq!(output.members_csv, out_dir.join("field_members.csv"));

        let members = fs::read_to_string(&output.members_csv).unwrap();
        let lines: Vec<&str> = members.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            "source_id,pmra,pmdec,ra,dec,bp_rp,phot_g_mean_mag,absorption_order"
        );
        assert_eq!(lines[1], "1,0.0,0.0,10.0,20.0,0.9,14.0,0");
        assert_eq!(lines[2], "2,0.1,0.1,10.1,20.0,,15.5,1");
        assert_eq!(lines[3], "3,0.2,0.2,10.0,20.1,1.1,,2");

        let trace = fs::read_to_string(&output.trace_csv).unwrap();
        assert!(trace.lines().nth(2).unwrap().starts_with("1,2,1,"));

        let trace = fs::read_to_string(&output.trace_csv).unwrap();
        assert_eq!(trace.lines().count(), 5);
        let transition = fs::read_to_string(&output.transition_csv).unwrap();
        assert_eq!(transition.lines().count(), 3);
    }

    #[test]
    fn test_process_catalog_radius_writes_outputs() {
        let dir = tempdir().unwrap();
        let catalog = dir.path().join("field.csv");
        fs::write(
            &catalog,
            "source_id,pmra,pmdec,ra,dec\n\
             1,0.0,0.0,10.0,20.0\n\
             2,0.1,0.1,10.1,20.0\n",
        )
        .unwrap();

        let mut config = PipelineConfig::default();
        config.sweep.max_radius = 1.0;
        let (output, result) = process_catalog_radius(&catalog, None, &config).unwrap();

        assert_eq!(output.sweep_csv, dir.path().join("field_sweep.csv"));
        assert_eq!(result.sweep.samples.len(), 6);
        let sweep = fs::read_to_string(&output.sweep_csv).unwrap();
        assert_eq!(sweep.lines().count(), 7);
        let covering = fs::read_to_string(&output.covering_csv).unwrap();
        assert_eq!(covering.lines().count(), 1);
    }

    #[test]
    fn test_process_catalog_missing_file() {
        let dir = tempdir().unwrap();
        let err = process_catalog_members(
            &dir.path().join("missing.csv"),
            None,
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MembershipError::Loader(_)));
    }
}
