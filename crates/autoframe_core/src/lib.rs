//! AutoFrame Core - batch reframing of videos into social aspect ratios
//!
//! This crate holds the whole batch pipeline with no UI dependencies:
//! selection limits, output naming, progress, the local ffmpeg engine,
//! the render service client and the orchestrator tying them together.
//! A host (the `autoframe` CLI, or a GUI) supplies files and options and
//! reads back a [`models::BatchResult`].

pub mod config;
pub mod engine;
pub mod logging;
pub mod models;
pub mod naming;
pub mod orchestrator;
pub mod progress;
pub mod remote;
pub mod selection;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
