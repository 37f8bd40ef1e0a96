//! CSV writers for membership results.
//!
//! This module writes every artifact of a pipeline run:
//! - member lists (absorbed stars with their original catalog rows)
//! - the absorption trace with its normalized curve
//! - inclination angles and the transition series
//! - per-radius sweep peaks and the covering-radius members

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use thiserror::Error;

use super::loaders::Point;
use super::transforms::NormalizedSeries;
use crate::processors::inclination::AngleSeries;
use crate::processors::mst::AbsorptionStep;
use crate::processors::sweep::SweepResult;
use crate::processors::transition::TransitionSeries;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },

    /// Mismatched series lengths.
    #[error("series length mismatch: {left_len} vs {right_len} entries")]
    LengthMismatch { left_len: usize, right_len: usize },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

type CsvWriter = csv::Writer<BufWriter<File>>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Opens a buffered CSV writer and writes the header row.
fn create_csv_writer<I, T>(path: &Path, header: I) -> Result<CsvWriter>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    ensure_parent_dirs(path)?;

    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    write_row(&mut writer, path, header)?;
    Ok(writer)
}

fn write_row<I, T>(writer: &mut CsvWriter, path: &Path, record: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    writer
        .write_record(record)
        .map_err(|e| WriteError::CsvError {
            path: path.display().to_string(),
            source: e,
        })
}

fn finish(mut writer: CsvWriter, path: &Path) -> Result<()> {
    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

const POINT_HEADER: [&str; 7] = [
    "id",
    "pmra",
    "pmdec",
    "ra",
    "dec",
    "bp_rp",
    "phot_g_mean_mag",
];

/// Catalog header when the points came from a file, typed fields otherwise.
fn point_header(columns: &[String], extra: &str) -> Vec<String> {
    let mut header: Vec<String> = if columns.is_empty() {
        POINT_HEADER.iter().map(|c| c.to_string()).collect()
    } else {
        columns.to_vec()
    };
    header.push(extra.to_string());
    header
}

/// Original field strings when available, so values pass through unchanged.
fn point_row(columns: &[String], point: &Point) -> Vec<String> {
    if !columns.is_empty() {
        return (0..columns.len())
            .map(|i| point.fields.get(i).cloned().unwrap_or_default())
            .collect();
    }
    vec![
        point.id.to_string(),
        point.pmra.to_string(),
        point.pmdec.to_string(),
        fmt_opt(point.ra),
        fmt_opt(point.dec),
        fmt_opt(point.bp_rp),
        fmt_opt(point.phot_g_mean_mag),
    ]
}

/// Write cluster members in absorption order.
///
/// Rows are the members' catalog rows under the catalog's own `columns`,
/// followed by `absorption_order`. With no `columns` (points built in code)
/// the typed fields `id,pmra,pmdec,ra,dec,bp_rp,phot_g_mean_mag` are written
/// instead, missing values as empty fields.
///
/// # Errors
///
/// Returns an error if the file or its parent directories cannot be created
/// or written.
pub fn write_members_csv(path: &Path, columns: &[String], members: &[&Point]) -> Result<()> {
    let mut writer = create_csv_writer(path, &point_header(columns, "absorption_order"))?;

    for (order, point) in members.iter().enumerate() {
        let mut row = point_row(columns, point);
        row.push(order.to_string());
        write_row(&mut writer, path, &row)?;
    }

    finish(writer, path)
}

/// Write the absorption trace alongside its normalized curve.
///
/// Columns: `order,id,parent,edge_cost,average_cost,norm_index,norm_length`.
/// The seed has an empty `parent`.
///
/// # Errors
///
/// Returns [`WriteError::LengthMismatch`] if `trace` and `normalized` differ
/// in length, or an I/O error.
pub fn write_trace_csv(
    path: &Path,
    trace: &[AbsorptionStep],
    normalized: &NormalizedSeries,
) -> Result<()> {
    if trace.len() != normalized.len() {
        return Err(WriteError::LengthMismatch {
            left_len: trace.len(),
            right_len: normalized.len(),
        });
    }

    let mut writer = create_csv_writer(
        path,
        &[
            "order",
            "id",
            "parent",
            "edge_cost",
            "average_cost",
            "norm_index",
            "norm_length",
        ],
    )?;

    for (i, step) in trace.iter().enumerate() {
        write_row(
            &mut writer,
            path,
            [
                i.to_string(),
                step.vertex.to_string(),
                step.parent.map(|p| p.to_string()).unwrap_or_default(),
                format!("{:.6}", step.edge_cost),
                format!("{:.6}", step.average_cost),
                format!("{:.6}", normalized.x[i]),
                format!("{:.6}", normalized.y[i]),
            ],
        )?;
    }

    finish(writer, path)
}

/// Write inclination angles and transition values per center index.
///
/// Columns: `index,cluster_angle,field_angle,transition`.
///
/// # Errors
///
/// Returns [`WriteError::LengthMismatch`] if the two series differ in
/// length, or an I/O error.
pub fn write_transition_csv(
    path: &Path,
    angles: &AngleSeries,
    transitions: &TransitionSeries,
) -> Result<()> {
    if angles.len() != transitions.len() {
        return Err(WriteError::LengthMismatch {
            left_len: angles.len(),
            right_len: transitions.len(),
        });
    }

    let mut writer = create_csv_writer(
        path,
        &["index", "cluster_angle", "field_angle", "transition"],
    )?;

    for (k, &index) in angles.indices.iter().enumerate() {
        write_row(
            &mut writer,
            path,
            [
                index.to_string(),
                format!("{:.6}", angles.cluster_deg[k]),
                format!("{:.6}", angles.field_deg[k]),
                format!("{:.6}", transitions.values[k]),
            ],
        )?;
    }

    finish(writer, path)
}

/// Write one row per swept radius.
///
/// Columns: `radius,sample_size,eta_max`.
pub fn write_sweep_csv(path: &Path, result: &SweepResult) -> Result<()> {
    let mut writer = create_csv_writer(path, &["radius", "sample_size", "eta_max"])?;

    for sample in &result.samples {
        write_row(
            &mut writer,
            path,
            [
                format!("{:.4}", sample.radius),
                sample.sample_size.to_string(),
                format!("{:.6}", sample.eta_max),
            ],
        )?;
    }

    finish(writer, path)
}

/// Write the points inside the covering radius with their center distance.
///
/// Same row layout as [`write_members_csv`], with a trailing `distance` column.
pub fn write_covering_csv(
    path: &Path,
    columns: &[String],
    members: &[(&Point, f64)],
) -> Result<()> {
    let mut writer = create_csv_writer(path, &point_header(columns, "distance"))?;

    for (point, distance) in members {
        let mut row = point_row(columns, point);
        row.push(distance.to_string());
        write_row(&mut writer, path, &row)?;
    }

    finish(writer, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::sweep::SweepSample;
    use std::fs;
    use tempfile::tempdir;

    fn sample_points() -> Vec<Point> {
        let mut bright = Point::new(11, 1.5, -2.25).with_position(10.0, 20.0);
        bright.bp_rp = Some(0.8);
        bright.phot_g_mean_mag = Some(12.5);
        vec![bright, Point::new(12, 1.0, -2.0)]
    }

    #[test]
    fn test_write_members_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("members.csv");
        let points = sample_points();
        let members: Vec<&Point> = points.iter().collect();

        write_members_csv(&path, &[], &members).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "id,pmra,pmdec,ra,dec,bp_rp,phot_g_mean_mag,absorption_order"
        );
        assert_eq!(lines[1], "11,1.5,-2.25,10,20,0.8,12.5,0");
        // Missing optional values stay empty
        assert_eq!(lines[2], "12,1,-2,,,,,1");
    }

    #[test]
    fn test_write_members_csv_keeps_catalog_rows() {
        use crate::config::CatalogConfig;
        use crate::core::loaders::load_catalog_csv;

        let dir = tempdir().unwrap();
        let catalog = dir.path().join("catalog.csv");
        fs::write(
            &catalog,
            "source_id,ra,dec,pmra,pmdec,parallax\n\
             1,120.123456789012,-10.5,-2.123456789,3.0,1.5\n\
             2,120.2,-10.6,-2.2,3.1,0.75\n",
        )
        .unwrap();
        let set = load_catalog_csv(&catalog, &CatalogConfig::default()).unwrap();

        let path = dir.path().join("members.csv");
        let members = vec![&set.points[1], &set.points[0]];
        write_members_csv(&path, &set.columns, &members).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "source_id,ra,dec,pmra,pmdec,parallax,absorption_order");
        assert_eq!(lines[1], "2,120.2,-10.6,-2.2,3.1,0.75,0");
        assert_eq!(lines[2], "1,120.123456789012,-10.5,-2.123456789,3.0,1.5,1");

        // Output loads back to the same values
        let reloaded = load_catalog_csv(&path, &CatalogConfig::default()).unwrap();
        assert_eq!(reloaded.points[1].ra, set.points[0].ra);
        assert_eq!(reloaded.points[1].pmra, set.points[0].pmra);
    }

    #[test]
    fn test_write_trace_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let trace = vec![
            AbsorptionStep {
                vertex: 5,
                parent: None,
                edge_cost: 0.0,
                average_cost: 0.0,
            },
            AbsorptionStep {
                vertex: 9,
                parent: Some(5),
                edge_cost: 2.0,
                average_cost: 2.0,
            },
        ];
        let normalized = NormalizedSeries {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
        };

        write_trace_csv(&path, &trace, &normalized).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "order,id,parent,edge_cost,average_cost,norm_index,norm_length"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,5,,0.000000"));
        assert!(lines[2].starts_with("1,9,5,2.000000"));
    }

    #[test]
    fn test_write_trace_csv_length_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trace.csv");
        let trace = vec![AbsorptionStep {
            vertex: 1,
            parent: None,
            edge_cost: 0.0,
            average_cost: 0.0,
        }];

        let result = write_trace_csv(&path, &trace, &NormalizedSeries::default());
        match result.unwrap_err() {
            WriteError::LengthMismatch {
                left_len,
                right_len,
            } => {
                assert_eq!(left_len, 1);
                assert_eq!(right_len, 0);
            }
            _ => panic!("Expected LengthMismatch error"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_write_transition_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("transition.csv");
        let angles = AngleSeries {
            indices: vec![2, 3],
            cluster_deg: vec![1.0, 2.0],
            field_deg: vec![30.0, 5.0],
        };
        let transitions = TransitionSeries {
            indices: vec![2, 3],
            values: vec![0.32, 0.015],
        };

        write_transition_csv(&path, &angles, &transitions).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "index,cluster_angle,field_angle,transition");
        assert_eq!(lines[1], "2,1.000000,30.000000,0.320000");
    }

    #[test]
    fn test_write_sweep_and_covering_create_parent_dirs() {
        let dir = tempdir().unwrap();
        let sweep_path = dir.path().join("out").join("nested").join("sweep.csv");
        let result = SweepResult {
            samples: vec![
                SweepSample {
                    radius: 0.0,
                    sample_size: 0,
                    eta_max: 0.0,
                },
                SweepSample {
                    radius: 0.2,
                    sample_size: 4,
                    eta_max: 0.5,
                },
            ],
            ..Default::default()
        };

        write_sweep_csv(&sweep_path, &result).unwrap();
        let content = fs::read_to_string(&sweep_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec!["radius,sample_size,eta_max", "0.0000,0,0.000000", "0.2000,4,0.500000"]);

        let covering_path = dir.path().join("out").join("covering.csv");
        let points = sample_points();
        write_covering_csv(&covering_path, &[], &[(&points[0], 1.25)]).unwrap();
        let content = fs::read_to_string(&covering_path).unwrap();
        assert!(content.lines().next().unwrap().ends_with(",distance"));
        assert!(content.lines().nth(1).unwrap().ends_with(",1.25"));
    }
}
