//! Utility functions and helpers

pub mod metrics;
pub mod normalize;
pub mod video;
