//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod writers;

pub use loaders::{load_catalog_csv, LoaderError, Point, PointSet};
pub use transforms::{normalize_series, NormalizedSeries};
pub use writers::{
    write_covering_csv, write_members_csv, write_sweep_csv, write_trace_csv,
    write_transition_csv, WriteError,
};
