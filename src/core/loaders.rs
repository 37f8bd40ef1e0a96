//! Catalog loading.
//!
//! Reads astrometric catalog CSV files (e.g. Gaia archive exports) into a
//! [`PointSet`]. Only the id and the two proper-motion columns are required;
//! sky position and photometry are carried through when present.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use thiserror::Error;

use crate::config::CatalogConfig;

/// Errors that can occur during catalog loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("row {line}: duplicate id {id}")]
    DuplicateId { id: u64, line: usize },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// A single catalog source.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: u64,
    /// Proper motion in RA (mas/yr)
    pub pmra: f64,
    /// Proper motion in Dec (mas/yr)
    pub pmdec: f64,
    /// Right ascension (deg)
    pub ra: Option<f64>,
    /// Declination (deg)
    pub dec: Option<f64>,
    /// BP - RP color (mag)
    pub bp_rp: Option<f64>,
    /// G band mean magnitude
    pub phot_g_mean_mag: Option<f64>,
    /// Original field strings of the catalog row, empty for points built in code
    pub fields: Vec<String>,
}

impl Point {
    /// Creates a point with proper motion only.
    pub fn new(id: u64, pmra: f64, pmdec: f64) -> Self {
        Self {
            id,
            pmra,
            pmdec,
            ra: None,
            dec: None,
            bp_rp: None,
            phot_g_mean_mag: None,
            fields: Vec::new(),
        }
    }

    /// Attaches a sky position.
    pub fn with_position(mut self, ra: f64, dec: f64) -> Self {
        self.ra = Some(ra);
        self.dec = Some(dec);
        self
    }

    /// Proper-motion coordinates as `[pmra, pmdec]`.
    #[inline]
    pub fn pm(&self) -> [f64; 2] {
        [self.pmra, self.pmdec]
    }

    /// Sky position as `[ra, dec]`, if both are known.
    #[inline]
    pub fn sky(&self) -> Option<[f64; 2]> {
        Some([self.ra?, self.dec?])
    }
}

/// Ordered collection of catalog sources.
///
/// Row order is preserved by every operation that derives a new set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    pub points: Vec<Point>,
    /// Header of the source catalog, matching each point's `fields`
    pub columns: Vec<String>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            columns: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_points(Vec::with_capacity(capacity))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    /// Source ids in row order.
    pub fn ids(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.id).collect()
    }

    /// Proper-motion coordinates in row order.
    pub fn pm_coords(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(Point::pm).collect()
    }

    /// Row index of the point with the given id.
    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }

    /// Point with the given id.
    pub fn get(&self, id: u64) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    /// New set containing the rows at `indices`, in the order given.
    pub fn subset(&self, indices: &[usize]) -> PointSet {
        PointSet {
            points: indices.iter().map(|&i| self.points[i].clone()).collect(),
            columns: self.columns.clone(),
        }
    }
}

impl FromIterator<Point> for PointSet {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self::from_points(iter.into_iter().collect())
    }
}

fn parse_optional(record: &csv::StringRecord, idx: Option<usize>) -> Option<f64> {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_required<T: std::str::FromStr>(
    record: &csv::StringRecord,
    idx: usize,
    column: &str,
    row: usize,
) -> Result<T> {
    let raw = record.get(idx).map(str::trim).unwrap_or("");
    raw.parse().map_err(|_| {
        LoaderError::ParseError(format!("row {}: invalid {} value '{}'", row, column, raw))
    })
}

fn parse_finite(record: &csv::StringRecord, idx: usize, column: &str, row: usize) -> Result<f64> {
    let value: f64 = parse_required(record, idx, column, row)?;
    if !value.is_finite() {
        return Err(LoaderError::ParseError(format!(
            "row {}: non-finite {} value {}",
            row, column, value
        )));
    }
    Ok(value)
}

/// Load a catalog CSV into a [`PointSet`].
///
/// Column names are matched case-insensitively against `config`. The id
/// column falls back to `id` when the configured name is missing.
///
/// # Errors
///
/// Returns an error if the file cannot be read, lacks the id or proper-motion
/// columns, contains an unparsable or non-finite required value, repeats an
/// id, or has no data rows.
pub fn load_catalog_csv<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<PointSet> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let col_map: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim().to_lowercase(), i))
        .collect();
    let column = |name: &str| col_map.get(&name.to_lowercase()).copied();

    let id_idx = column(&config.id_column)
        .or_else(|| column("id"))
        .ok_or_else(|| LoaderError::MissingColumns(config.id_column.clone()))?;

    let mut missing = Vec::new();
    let pmra_idx = column(&config.pmra_column);
    let pmdec_idx = column(&config.pmdec_column);
    if pmra_idx.is_none() {
        missing.push(config.pmra_column.as_str());
    }
    if pmdec_idx.is_none() {
        missing.push(config.pmdec_column.as_str());
    }
    let (Some(pmra_idx), Some(pmdec_idx)) = (pmra_idx, pmdec_idx) else {
        return Err(LoaderError::MissingColumns(missing.join(", ")));
    };

    let ra_idx = column(&config.ra_column);
    let dec_idx = column(&config.dec_column);
    let color_idx = column(&config.color_column);
    let mag_idx = column(&config.magnitude_column);

    let mut points = PointSet::with_capacity(4096);
    points.columns = headers.iter().map(|h| h.to_string()).collect();
    let mut seen = HashSet::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let id: u64 = parse_required(&record, id_idx, &config.id_column, line)?;
        if !seen.insert(id) {
            return Err(LoaderError::DuplicateId { id, line });
        }
        let pmra = parse_finite(&record, pmra_idx, &config.pmra_column, line)?;
        let pmdec = parse_finite(&record, pmdec_idx, &config.pmdec_column, line)?;

        points.push(Point {
            id,
            pmra,
            pmdec,
            ra: parse_optional(&record, ra_idx),
            dec: parse_optional(&record, dec_idx),
            bp_rp: parse_optional(&record, color_idx),
            phot_g_mean_mag: parse_optional(&record, mag_idx),
            fields: record.iter().map(|f| f.to_string()).collect(),
        });
    }

    if points.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    log::debug!("{}: loaded {} sources", path.display(), points.len());

    Ok(points)
}
