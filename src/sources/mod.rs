//! Collaborators the walker reads from: a pileup source and a reference source.
//!
//! Each worker opens its own instances through a [`SourceFactory`]; handles are never
//! shared between threads.

pub mod memory;
pub mod pileup;
pub mod reference;

use crate::dark_regions::options::{DarkRegionOptions, ValidationStringency};
use crate::dark_regions::types::{IntervalChunk, PileupStats};
use crate::error::Result;
use crate::utils::bam_reader::{sequence_dictionary, BamReaderFactory};
use rust_htslib::bam::Read;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

pub use pileup::HtsPileupSource;
pub use reference::FastaReference;

/// Per-locus pileup statistics over a range of the alignment file.
pub trait PileupSource {
    /// Calls `visit` for every position of `chunk` in ascending order, uncovered
    /// positions included, until the range is exhausted or `visit` breaks.
    fn scan<F>(&mut self, chunk: &IntervalChunk, visit: F) -> Result<()>
    where
        F: FnMut(&str, u64, &PileupStats) -> Result<ControlFlow<()>>;
}

/// Random access to reference bases.
pub trait ReferenceSource {
    fn has_sequence(&self, contig: &str) -> bool;

    /// Base at a 1-based position.
    fn base_at(&mut self, contig: &str, position: u64) -> Result<u8>;
}

/// Opens independent source handles, one set per worker.
pub trait SourceFactory: Sync {
    type Pileup: PileupSource;
    type Reference: ReferenceSource;

    fn open_pileup(&self) -> Result<Self::Pileup>;
    fn open_reference(&self) -> Result<Self::Reference>;

    /// Contigs of the alignment file in header order, with their lengths.
    fn dictionary(&self) -> &[(String, u64)];
}

/// Opens htslib pileups and indexed FASTA references for every worker.
pub struct HtsSourceFactory {
    alignments: PathBuf,
    reference: PathBuf,
    max_depth: u32,
    stringency: ValidationStringency,
    dictionary: Vec<(String, u64)>,
}

impl HtsSourceFactory {
    /// Opens both inputs once so that missing files or indexes fail before any scanning.
    pub fn new(alignments: &Path, reference: &Path, options: &DarkRegionOptions) -> Result<Self> {
        let reader = BamReaderFactory::open_indexed(alignments, Some(reference))?;
        let dictionary = sequence_dictionary(reader.header());
        FastaReference::open(reference)?;

        Ok(Self {
            alignments: alignments.to_path_buf(),
            reference: reference.to_path_buf(),
            max_depth: options.max_pileup_depth,
            stringency: options.validation_stringency,
            dictionary,
        })
    }
}

impl SourceFactory for HtsSourceFactory {
    type Pileup = HtsPileupSource;
    type Reference = FastaReference;

    fn open_pileup(&self) -> Result<HtsPileupSource> {
        HtsPileupSource::open(
            &self.alignments,
            Some(&self.reference),
            self.max_depth,
            self.stringency,
        )
    }

    fn open_reference(&self) -> Result<FastaReference> {
        FastaReference::open(&self.reference)
    }

    fn dictionary(&self) -> &[(String, u64)] {
        &self.dictionary
    }
}
