//! Core data models.

mod paper;

pub use paper::Paper;
