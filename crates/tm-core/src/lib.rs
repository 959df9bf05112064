//! Shared types, traits, and configuration for tempomatch.
//!
//! This crate holds everything the analysis, matching and app crates agree
//! on: the decoded `Signal`, the `TrackProfile` / `MatchResult` data model,
//! the `FeatureProvider` seam and the TOML-backed `ScanConfig`.

pub mod config;
pub mod error;
pub mod profile;
pub mod signal;
pub mod traits;

pub use config::ScanConfig;
pub use error::CoreError;
pub use profile::{MatchDetails, MatchResult, TrackProfile, Verdict};
pub use signal::Signal;
pub use traits::FeatureProvider;
