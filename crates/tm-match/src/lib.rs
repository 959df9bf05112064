//! Tempo fusion and pairwise tempo matching.
//!
//! The pipeline, leaves first:
//! - [`ensemble`]: one BPM estimate per strategy from a [`FeatureProvider`]
//! - [`builder`]: fuse the estimates and beat times into a [`TrackProfile`]
//! - [`matcher`]: conjunctive three-criterion comparison of two profiles
//! - [`scanner`]: profile a corpus, then compare every unordered pair
//!
//! [`FeatureProvider`]: tm_core::traits::FeatureProvider
//! [`TrackProfile`]: tm_core::profile::TrackProfile

pub mod builder;
pub mod ensemble;
pub mod matcher;
pub mod scanner;
pub mod stats;

pub use builder::build_profile;
pub use ensemble::{Strategy, TempoEnsemble};
pub use matcher::{Comparison, compare};
pub use scanner::{CorpusScanner, ProfileSet, ScanOptions, ScanReport};
