//! Dark and incomplete region detection.
//!
//! A scan walks every locus of the territory (the whole alignment header or an interval
//! list) in genomic order, classifies it against the reference base and the pileup, and
//! writes maximal runs of qualifying loci to three BED-like files. Large territories are
//! split into shards scanned in parallel; the merged output is identical to a
//! single-threaded scan.

pub mod accumulator;
pub mod classifier;
pub mod coordinator;
pub mod format;
pub mod options;
pub mod output;
pub mod partition;
pub mod report;
pub mod types;
pub mod walker;

pub use coordinator::ShardCoordinator;
pub use options::{DarkRegionOptions, ValidationStringency};
pub use output::OutputPaths;
pub use partition::{GenomePartitioner, Shard};
pub use report::ScanSummary;
pub use types::{IntervalChunk, RegionCategory};

use crate::error::Result;
use crate::sources::{HtsSourceFactory, SourceFactory};
use log::info;
use output::RegionOutputs;
use std::path::{Path, PathBuf};

/// Everything one run of the finder needs.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub alignments: PathBuf,
    pub reference: PathBuf,
    pub outputs: OutputPaths,
    pub summary: Option<PathBuf>,
    pub options: DarkRegionOptions,
}

/// Scans an indexed BAM/CRAM against an indexed FASTA.
pub fn run(request: &ScanRequest) -> Result<ScanSummary> {
    request.options.validate()?;
    let factory = HtsSourceFactory::new(&request.alignments, &request.reference, &request.options)?;
    scan_with(
        &factory,
        &request.outputs,
        request.summary.as_deref(),
        &request.options,
    )
}

/// Scans with any source factory. Outputs appear only if every shard succeeds.
pub fn scan_with<F: SourceFactory>(
    factory: &F,
    outputs: &OutputPaths,
    summary_path: Option<&Path>,
    options: &DarkRegionOptions,
) -> Result<ScanSummary> {
    options.validate()?;
    let territory = territory(factory.dictionary(), options)?;
    let shards = GenomePartitioner::new(options.threads).plan(&territory);
    info!(
        "Scanning {} bases in {} interval(s) as {} shard(s)",
        territory.iter().map(IntervalChunk::len).sum::<u64>(),
        territory.len(),
        shards.len()
    );

    let mut files = RegionOutputs::create(outputs, options.write_header)?;
    let summary = ShardCoordinator::new(factory, options).run(&shards, files.sinks_mut())?;
    files.commit()?;

    report::log_summary(&summary);
    if let Some(path) = summary_path {
        report::write_json(path, &summary)?;
    }
    Ok(summary)
}

/// The intervals a run covers: the requested ones, or every contig of the header.
pub fn territory(
    dictionary: &[(String, u64)],
    options: &DarkRegionOptions,
) -> Result<Vec<IntervalChunk>> {
    match &options.intervals {
        Some(intervals) => partition::resolve_intervals(intervals, dictionary),
        None => Ok(partition::whole_genome(dictionary)),
    }
}
