//! Feature drift detection: PSI, two-sample KS and the per-feature detector

pub mod detector;
pub mod ks;
pub mod psi;
pub mod stats;

pub use detector::{compute_drift, DriftDetector, DriftReport};
pub use ks::{two_sample_ks, KsTest};
pub use psi::population_stability_index;
