//! Output module for reporting on the link database
//!
//! This module handles:
//! - Loading counts and recent finds from the frontier store
//! - Rendering them for the `--stats` command

pub mod stats;

pub use stats::{load_statistics, print_statistics, render_statistics, TrawlStatistics};
