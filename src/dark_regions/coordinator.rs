use crate::dark_regions::options::DarkRegionOptions;
use crate::dark_regions::partition::Shard;
use crate::dark_regions::report::ScanSummary;
use crate::dark_regions::types::RegionCategory;
use crate::dark_regions::walker::GenomeWalker;
use crate::error::{DarkRegionError, Result};
use crate::sources::{PileupSource, SourceFactory};
use crate::utils::progress_bar_builder::{ProgressBarBuilder, SHARD_TEMPLATE};
use crossbeam_channel::unbounded;
use indicatif::{MultiProgress, ProgressBar};
use log::{debug, info};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tempfile::NamedTempFile;

/// Loci between progress bar updates.
const PROGRESS_STEP: u64 = 10_000;

/// Runs one walker per shard and stitches the shard outputs together in shard order.
///
/// A single shard is scanned on the calling thread straight into the final outputs.
/// Otherwise each shard writes to its own temporary files in `tmp_dir`, and the first
/// failing shard stops the others.
pub struct ShardCoordinator<'a, F: SourceFactory> {
    factory: &'a F,
    options: &'a DarkRegionOptions,
}

impl<'a, F: SourceFactory> ShardCoordinator<'a, F> {
    pub fn new(factory: &'a F, options: &'a DarkRegionOptions) -> Self {
        Self { factory, options }
    }

    pub fn run<W: Write>(&self, shards: &[Shard], outputs: &mut [W; 3]) -> Result<ScanSummary> {
        let progress = MultiProgress::new();
        match shards {
            [] => Ok(ScanSummary::default()),
            [shard] => {
                let bar = progress.add(self.progress_bar(shard));
                let abort = AtomicBool::new(false);
                let (_, summary) = self.scan_shard(shard, outputs.each_mut(), &bar, &abort)?;
                bar.finish();
                Ok(summary)
            }
            _ => self.run_parallel(shards, outputs, &progress),
        }
    }

    fn run_parallel<W: Write>(
        &self,
        shards: &[Shard],
        outputs: &mut [W; 3],
        progress: &MultiProgress,
    ) -> Result<ScanSummary> {
        let tmp_dir = &self.options.tmp_dir;
        fs::create_dir_all(tmp_dir).map_err(|source| DarkRegionError::Output {
            path: tmp_dir.clone(),
            source,
        })?;
        let temps = shards
            .iter()
            .map(|shard| shard_temps(shard, tmp_dir))
            .collect::<Result<Vec<_>>>()?;
        let writers = temps
            .iter()
            .map(shard_writers)
            .collect::<Result<Vec<_>>>()?;

        info!("Scanning {} shards in parallel", shards.len());

        let abort = AtomicBool::new(false);
        let (tx, rx) = unbounded::<(usize, Result<ScanSummary>)>();
        let mut results: Vec<Option<ScanSummary>> = vec![None; shards.len()];
        let mut failure: Option<(usize, DarkRegionError)> = None;

        thread::scope(|scope| {
            for (slot, (shard, sinks)) in shards.iter().zip(writers).enumerate() {
                let bar = progress.add(self.progress_bar(shard));
                let tx = tx.clone();
                let abort = &abort;
                scope.spawn(move || {
                    let result = self
                        .scan_shard(shard, sinks, &bar, abort)
                        .map(|(_, summary)| summary);
                    bar.finish();
                    // The receiver outlives every worker.
                    let _ = tx.send((slot, result));
                });
            }
            drop(tx);

            for (slot, result) in rx.iter() {
                match result {
                    Ok(summary) => results[slot] = Some(summary),
                    Err(error) => {
                        abort.store(true, Ordering::Relaxed);
                        let replace = match &failure {
                            None => true,
                            Some((_, DarkRegionError::Aborted)) => {
                                !matches!(error, DarkRegionError::Aborted)
                            }
                            Some(_) => false,
                        };
                        if replace {
                            failure = Some((slot, error));
                        }
                    }
                }
            }
        });

        if let Some((slot, error)) = failure {
            return Err(DarkRegionError::ShardFailed {
                shard: shards[slot].index,
                source: Box::new(error),
            });
        }

        let mut summary = ScanSummary::default();
        for shard_summary in results.iter().flatten() {
            summary.merge(shard_summary);
        }

        for category in RegionCategory::ALL {
            let output = &mut outputs[category.index()];
            for files in &temps {
                let temp = &files[category.index()];
                let copy_error = |source: io::Error| DarkRegionError::Output {
                    path: temp.path().to_path_buf(),
                    source,
                };
                let mut shard_file = temp.reopen().map_err(copy_error)?;
                io::copy(&mut shard_file, output).map_err(copy_error)?;
            }
        }
        debug!("Merged output of {} shards", temps.len());
        Ok(summary)
    }

    /// Walks one shard: primes on the lead-in locus, visits every chunk, then follows the
    /// overrun for as long as a run that started in this shard is still open.
    fn scan_shard<W: Write>(
        &self,
        shard: &Shard,
        sinks: [W; 3],
        bar: &ProgressBar,
        abort: &AtomicBool,
    ) -> Result<([W; 3], ScanSummary)> {
        debug!(
            "Shard {}: {} chunk(s), {} bases, starting at {}",
            shard.index,
            shard.chunks.len(),
            shard.bases(),
            shard.chunks.first().map(ToString::to_string).unwrap_or_default()
        );
        let mut pileup = self.factory.open_pileup()?;
        let reference = self.factory.open_reference()?;
        let mut walker = GenomeWalker::new(self.options, reference, sinks);

        if let Some(lead_in) = &shard.lead_in {
            pileup.scan(lead_in, |contig, position, stats| {
                walker.prime(contig, position, stats)?;
                Ok(ControlFlow::Continue(()))
            })?;
        }

        let mut pending = 0;
        for chunk in &shard.chunks {
            pileup.scan(chunk, |contig, position, stats| {
                if abort.load(Ordering::Relaxed) {
                    return Err(DarkRegionError::Aborted);
                }
                pending += 1;
                if pending == PROGRESS_STEP {
                    bar.inc(pending);
                    pending = 0;
                }
                walker.visit(contig, position, stats)
            })?;
        }
        bar.inc(pending);

        if let Some(overrun) = &shard.overrun {
            if walker.begin_overrun() {
                pileup.scan(overrun, |contig, position, stats| {
                    walker.visit(contig, position, stats)
                })?;
            }
        }

        let (mut sinks, summary) = walker.into_parts()?;
        for sink in sinks.iter_mut() {
            sink.flush()?;
        }
        Ok((sinks, summary))
    }

    fn progress_bar(&self, shard: &Shard) -> ProgressBar {
        ProgressBarBuilder::new(format!("shard {}", shard.index))
            .with_template(SHARD_TEMPLATE)
            .with_length(shard.bases())
            .hidden(!self.options.show_progress)
            .build()
    }
}

fn shard_temps(shard: &Shard, tmp_dir: &Path) -> Result<[NamedTempFile; 3]> {
    let temp = |category: RegionCategory| {
        tempfile::Builder::new()
            .prefix(&format!("drf.shard{:03}.{}.", shard.index, category.slug()))
            .suffix(".bed")
            .tempfile_in(tmp_dir)
            .map_err(|source| DarkRegionError::Output {
                path: tmp_dir.to_path_buf(),
                source,
            })
    };
    Ok([
        temp(RegionCategory::Incomplete)?,
        temp(RegionCategory::LowDepthDark)?,
        temp(RegionCategory::LowMapqDark)?,
    ])
}

fn shard_writers(files: &[NamedTempFile; 3]) -> Result<[BufWriter<File>; 3]> {
    let writer = |temp: &NamedTempFile| -> Result<BufWriter<File>> {
        let file = temp
            .as_file()
            .try_clone()
            .map_err(|source| DarkRegionError::Output {
                path: temp.path().to_path_buf(),
                source,
            })?;
        Ok(BufWriter::new(file))
    };
    Ok([writer(&files[0])?, writer(&files[1])?, writer(&files[2])?])
}
