//! VFS Core - Backend logic for the stereo video frame stitcher.
//!
//! Synchronizes two camera streams delivered as ordered video segment files:
//! frames are sampled at a fixed global cadence, extracted in parallel,
//! paired by global frame number across cameras and stitched vertically.
//! A timestamp analyzer assesses whether frame-number pairing is trustworthy
//! given the cameras' independent clocks.
//!
//! This crate contains all business logic with zero UI dependencies.

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod extraction;
pub mod logging;
pub mod media;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod sampling;
pub mod stitching;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
