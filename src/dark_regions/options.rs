use crate::error::{DarkRegionError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How pileup errors from the alignment file are handled.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStringency {
    /// Abort the scan on the first error.
    #[default]
    #[value(name = "strict")]
    Strict,
    /// Warn and treat the column as uncovered.
    #[value(name = "lenient")]
    Lenient,
    /// Treat the column as uncovered without a warning.
    #[value(name = "silent")]
    Silent,
}

#[derive(Clone, Debug)]
pub struct DarkRegionOptions {
    pub mapq_threshold: u8,
    pub min_mapq_mass: u8,
    pub min_depth: u32,
    pub min_region_size: u64,
    pub exclusive_regions: bool,
    pub max_buffered_loci: usize,
    pub threads: usize,
    pub max_pileup_depth: u32,
    pub validation_stringency: ValidationStringency,
    pub tmp_dir: PathBuf,
    pub write_header: bool,
    pub show_progress: bool,
    pub intervals: Option<Vec<String>>,
}

impl Default for DarkRegionOptions {
    fn default() -> Self {
        Self {
            mapq_threshold: 9,
            min_mapq_mass: 90,
            min_depth: 5,
            min_region_size: 1,
            exclusive_regions: false,
            max_buffered_loci: 10_000,
            threads: 1,
            max_pileup_depth: 1_000_000,
            validation_stringency: ValidationStringency::Strict,
            tmp_dir: PathBuf::from("./"),
            write_header: false,
            show_progress: true,
            intervals: None,
        }
    }
}

impl DarkRegionOptions {
    pub fn new(mapq_threshold: u8, min_mapq_mass: u8, min_depth: u32, min_region_size: u64) -> Self {
        Self {
            mapq_threshold,
            min_mapq_mass,
            min_depth,
            min_region_size,
            ..Self::default()
        }
    }

    pub fn with_exclusive_regions(mut self, exclusive: bool) -> Self {
        self.exclusive_regions = exclusive;
        self
    }

    pub fn with_max_buffered_loci(mut self, max_buffered_loci: usize) -> Self {
        self.max_buffered_loci = max_buffered_loci;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_max_pileup_depth(mut self, depth: u32) -> Self {
        self.max_pileup_depth = depth;
        self
    }

    pub fn with_validation_stringency(mut self, stringency: ValidationStringency) -> Self {
        self.validation_stringency = stringency;
        self
    }

    pub fn with_tmp_dir(mut self, tmp_dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir.into();
        self
    }

    pub fn with_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_intervals(mut self, intervals: Option<Vec<String>>) -> Self {
        self.intervals = intervals.filter(|list| !list.is_empty());
        self
    }

    /// Rejects option combinations the scan cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.min_region_size < 1 {
            return Err(DarkRegionError::invalid_config(
                "--min-region-size must be at least 1",
            ));
        }
        if self.threads < 1 {
            return Err(DarkRegionError::invalid_config("--threads must be at least 1"));
        }
        if self.min_mapq_mass > 100 {
            return Err(DarkRegionError::invalid_config(format!(
                "--min-mapq-mass is a percentage (0-100), got {}",
                self.min_mapq_mass
            )));
        }
        if self.max_buffered_loci < 1 {
            return Err(DarkRegionError::invalid_config(
                "--max-buffered-loci must be at least 1",
            ));
        }
        if self.max_pileup_depth < 1 {
            return Err(DarkRegionError::invalid_config(
                "--max-pileup-depth must be at least 1",
            ));
        }
        Ok(())
    }
}
