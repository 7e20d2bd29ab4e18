//! Core library: project discovery, duplicate grouping, health scoring and reporting.

pub mod config;
pub mod error;
pub mod grouper;
pub mod identifier;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod reporter;
pub mod scorer;
pub mod walker;

pub use error::ScanError;
pub use models::{
    DuplicateGroup, MarkerFlags, Project, ProjectCandidate, ProjectKind, ScanReport, ScanWarning,
    SimilarityBasis,
};
pub use pipeline::{
    default_exclusions, scan, scan_with, ScanOptions, DEFAULT_EXCLUSIONS,
    DEFAULT_UNDOCUMENTED_THRESHOLD,
};
