pub mod cli;
pub mod commands;
pub mod config;
pub mod dark_regions;
pub mod error;
pub mod sources;
pub mod utils;

// Re-export main API
pub use dark_regions::{
    run, scan_with, DarkRegionOptions, OutputPaths, RegionCategory, ScanRequest, ScanSummary,
    ValidationStringency,
};
pub use error::{DarkRegionError, Result};
