use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while planning or running a dark-region scan.
#[derive(Debug, Error)]
pub enum DarkRegionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("BAM/CRAM error: {0}")]
    Alignment(#[from] rust_htslib::errors::Error),

    #[error("Reference genome error: {0}")]
    Reference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid interval '{interval}': {reason}")]
    InvalidInterval { interval: String, reason: String },

    #[error("Could not write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Shard {shard} failed: {source}")]
    ShardFailed {
        shard: usize,
        #[source]
        source: Box<DarkRegionError>,
    },

    #[error("Scan aborted because another shard failed")]
    Aborted,

    #[error("Locus {contig}:{position} arrived after the walker was closed")]
    WalkerClosed { contig: String, position: u64 },
}

pub type Result<T> = std::result::Result<T, DarkRegionError>;

impl DarkRegionError {
    pub fn reference(message: impl Into<String>) -> Self {
        Self::Reference(message.into())
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    pub fn invalid_interval(interval: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            interval: interval.into(),
            reason: reason.into(),
        }
    }
}
