use crate::dark_regions::{DarkRegionOptions, ValidationStringency};
use crate::error::{DarkRegionError, Result};
use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Threshold defaults read from `config.toml`; command-line flags take precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_mapq_threshold")]
    pub mapq_threshold: u8,
    #[serde(default = "default_min_mapq_mass")]
    pub min_mapq_mass: u8,
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,
    #[serde(default = "default_min_region_size")]
    pub min_region_size: u64,
    #[serde(default)]
    pub exclusive_regions: bool,
    #[serde(default = "default_max_buffered_loci")]
    pub max_buffered_loci: usize,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_max_pileup_depth")]
    pub max_pileup_depth: u32,
    #[serde(default)]
    pub validation_stringency: ValidationStringency,
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
    #[serde(default)]
    pub write_header: bool,
}

fn default_mapq_threshold() -> u8 {
    9
}

fn default_min_mapq_mass() -> u8 {
    90
}

fn default_min_depth() -> u32 {
    5
}

fn default_min_region_size() -> u64 {
    1
}

fn default_max_buffered_loci() -> usize {
    10_000
}

fn default_threads() -> usize {
    1
}

fn default_max_pileup_depth() -> u32 {
    1_000_000
}

fn default_tmp_dir() -> PathBuf {
    PathBuf::from("./")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mapq_threshold: default_mapq_threshold(),
            min_mapq_mass: default_min_mapq_mass(),
            min_depth: default_min_depth(),
            min_region_size: default_min_region_size(),
            exclusive_regions: false,
            max_buffered_loci: default_max_buffered_loci(),
            threads: default_threads(),
            max_pileup_depth: default_max_pileup_depth(),
            validation_stringency: ValidationStringency::default(),
            tmp_dir: default_tmp_dir(),
            write_header: false,
        }
    }
}

impl Config {
    /// `config.toml` in the platform config directory, if there is one.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "darkregions", "dark-region-finder")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the user config, falling back to built-in defaults when it is missing or unreadable.
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                match Self::load_from(&config_path) {
                    Ok(config) => {
                        debug!("Loaded defaults from {}", config_path.display());
                        return config;
                    }
                    Err(e) => warn!("Ignoring {}: {}", config_path.display(), e),
                }
            }
        }
        Config::default()
    }

    /// Loads an explicitly requested config file; any problem with it is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            DarkRegionError::invalid_config(format!("{}: {}", path.display(), e))
        })
    }

    pub fn to_options(&self) -> DarkRegionOptions {
        DarkRegionOptions::new(
            self.mapq_threshold,
            self.min_mapq_mass,
            self.min_depth,
            self.min_region_size,
        )
        .with_exclusive_regions(self.exclusive_regions)
        .with_max_buffered_loci(self.max_buffered_loci)
        .with_threads(self.threads)
        .with_max_pileup_depth(self.max_pileup_depth)
        .with_validation_stringency(self.validation_stringency)
        .with_tmp_dir(self.tmp_dir.clone())
        .with_header(self.write_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_keys_take_defaults() {
        let config: Config = toml::from_str("min_depth = 8\nvalidation_stringency = \"lenient\"\n").unwrap();
        assert_eq!(config.min_depth, 8);
        assert_eq!(config.validation_stringency, ValidationStringency::Lenient);
        assert_eq!(config.mapq_threshold, 9);
        assert_eq!(config.max_buffered_loci, 10_000);
    }

    #[test]
    fn defaults_match_the_options() {
        let options = Config::default().to_options();
        let defaults = DarkRegionOptions::default();
        assert_eq!(options.mapq_threshold, defaults.mapq_threshold);
        assert_eq!(options.min_mapq_mass, defaults.min_mapq_mass);
        assert_eq!(options.min_depth, defaults.min_depth);
        assert_eq!(options.min_region_size, defaults.min_region_size);
        assert_eq!(options.max_pileup_depth, defaults.max_pileup_depth);
        assert_eq!(options.tmp_dir, defaults.tmp_dir);
    }

    #[test]
    fn bad_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min_depth = \"many\"\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(DarkRegionError::InvalidConfig(_))
        ));
        assert!(Config::load_from(&dir.path().join("absent.toml")).is_err());
    }
}
