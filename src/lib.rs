//! Open-cluster membership and covering radius from proper motions.
//!
//! This crate provides tools for:
//! - Loading astrometric catalogs (Gaia-style CSV) into point sets
//! - Growing a minimum spanning tree over the proper-motion plane
//! - Locating the cluster/field transition on the average edge-length curve
//! - Sweeping sky radii to find the cluster's covering radius
//!
//! # Example
//!
//! ```no_run
//! use cluster_mst::{core::loaders::load_catalog_csv, processors::find_members, PipelineConfig};
//!
//! let config = PipelineConfig::default();
//! let points = load_catalog_csv("catalog.csv", &config.catalog).unwrap();
//! let result = find_members(&points, &config).unwrap();
//! println!("{} members", result.members.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;

pub use config::{
    CatalogConfig, InclinationConfig, MembershipConfig, PipelineConfig, SweepConfig,
    TransitionConfig,
};
pub use core::loaders::{Point, PointSet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
