//! Data processing modules.

pub mod analysis;
pub mod graph;
pub mod inclination;
pub mod membership;
pub mod mst;
pub mod sweep;
pub mod transition;

// Re-export key types for convenience
pub use analysis::{analyze, analyze_from_seed, choose_seed, MstAnalysis};
pub use graph::{build_pm_graph, WeightedGraph};
pub use inclination::{inclination_angles, AngleSeries};
pub use membership::{
    find_covering_radius, find_members, process_catalog_members, process_catalog_radius,
    MembershipError, MembershipResult, RadiusResult,
};
pub use mst::{grow_mst, AbsorptionStep, MstError, MstGrowth};
pub use sweep::{radius_sweep, SweepResult, SweepSample};
pub use transition::{detect_transition, transition_series, Transition, TransitionSeries};
