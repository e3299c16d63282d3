//! Customer segmentation core: a CSV-backed dataset of customer records plus
//! one newly entered record, partitioned into a fixed number of groups with
//! seeded k-means over (age, annual income, spending score).
//!
//! Rendering and form input live outside this crate; callers hand the
//! returned [`Segmentation`] (merged feature matrix + cluster assignment) to
//! their display collaborator.

pub mod dataset;
pub mod engine;
pub mod record;

pub use dataset::{Dataset, LoadError};
pub use engine::{
    ClusterAssignment, Clusterer, DEFAULT_K, DEFAULT_SEED, KMeansClusterer, Segmentation,
    SegmentationEngine,
};
pub use record::{CustomerRecord, Gender, ValidationError};

// Re-export the numeric scaffolding shared across the workspace.
pub use segmenta_helpers::{Distance, Float, L1Dist, L2Dist};
