//! Render pipelines.
//!
//! - `basic` draws the textured model into an eye target
//! - `present` composites both eye targets into the window

pub mod basic;
pub mod present;
